//! Knowledge graph value types: nodes, simple paths and per-frontier path sets.

mod container;
mod node;
mod path;

pub use container::PathContainer;
pub use node::{is_valid_curie, Node};
pub use path::Path;
