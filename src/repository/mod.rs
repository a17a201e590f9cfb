//! Neighbor repositories: where the search engine gets adjacency and degrees.
//!
//! Every backend answers the same two questions. Decorators such as
//! [`SimilarityRankedRepository`] wrap another repository by value, so a stack
//! of repositories is a concrete type with no dynamic dispatch.

mod degree;
mod memory;
mod remote;
mod similarity;

pub use degree::DegreeRepository;
pub use memory::InMemoryRepository;
pub use remote::RemoteGraphRepository;
pub use similarity::SimilarityRankedRepository;

use std::future::Future;

use crate::error::Result;
use crate::graph::Node;

pub trait NeighborRepository: Send + Sync {
    /// Up to `limit` neighbors of `node`, best candidates first.
    ///
    /// An unknown node has no neighbors: `Ok(vec![])`, never an error.
    /// `Err` is reserved for backend failures (I/O, transport, bad payloads).
    fn get_neighbors(&self, node: &Node, limit: usize)
        -> impl Future<Output = Result<Vec<Node>>> + Send;

    /// Edge count of `id`; `Ok(None)` when the backend does not know the node.
    fn get_node_degree(&self, id: &str) -> impl Future<Output = Result<Option<u64>>> + Send;
}
