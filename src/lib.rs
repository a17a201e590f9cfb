pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod graph;
pub mod repository;
pub mod search;
pub mod similarity;

pub use config::Config;
pub use error::{PathfinderError, Result};
pub use graph::{Node, Path, PathContainer};
pub use repository::NeighborRepository;
pub use search::PathFinder;
