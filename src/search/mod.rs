//! Path search: single-direction BFS, the worker pool it dispatches to, and
//! the bidirectional finder that joins two searches.

pub mod bfs;
pub mod bidirectional;
pub mod pool;

pub use bfs::{BreadthFirstSearch, SearchOutcome, SearchState, SearchStats};
pub use bidirectional::{join_paths, rank_paths, split_hop_budget, PathFinder};
pub use pool::WorkerPool;

use serde::Deserialize;
use std::time::Duration;

use crate::config::SearchConfig;

/// Final ordering of found paths by `total_weight`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankOrder {
    /// Heaviest first; paths with an unscored link (+inf) lead.
    #[default]
    Descending,
    /// Lowest total NGD first, which matches the order neighbors are expanded
    /// in; unscored paths trail.
    Ascending,
}

/// Knobs shared by both directions of a search.
#[derive(Debug, Clone)]
pub struct SearchSettings {
    pub hub_threshold: u64,
    pub fanout_limit: usize,
    pub batch_factor: usize,
    pub deadline: Option<Duration>,
    pub rank_order: RankOrder,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self::from(&SearchConfig::default())
    }
}

impl From<&SearchConfig> for SearchSettings {
    fn from(config: &SearchConfig) -> Self {
        Self {
            hub_threshold: config.hub_threshold,
            fanout_limit: config.fanout_limit,
            batch_factor: config.batch_factor.max(1),
            deadline: config.deadline_ms.map(Duration::from_millis),
            rank_order: config.rank_order,
        }
    }
}
