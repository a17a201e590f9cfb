//! Bidirectional path finding: two half-budget searches joined at common nodes.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use super::{BreadthFirstSearch, RankOrder, SearchSettings, WorkerPool};
use crate::config::SearchConfig;
use crate::error::{PathfinderError, Result};
use crate::graph::{is_valid_curie, Node, Path, PathContainer};
use crate::repository::NeighborRepository;

/// Hop budgets for the source and target sides. The source side takes the
/// extra hop when `hop_budget` is odd.
pub fn split_hop_budget(hop_budget: u32) -> (u32, u32) {
    (hop_budget / 2 + 1, hop_budget / 2)
}

/// Join source-side and target-side paths that end at the same node.
///
/// Candidates that revisit a node or exceed `hop_budget` hops are dropped,
/// and each node sequence is kept once. Output order is deterministic for a
/// given pair of containers.
pub fn join_paths(source: &PathContainer, target: &PathContainer, hop_budget: u32) -> Vec<Path> {
    let mut meeting: Vec<&str> = source.frontier_ids().filter(|id| target.contains(id)).collect();
    meeting.sort_unstable();

    let mut seen: HashSet<Vec<String>> = HashSet::new();
    let mut joined = Vec::new();
    for id in meeting {
        for forward in source.get(id) {
            for backward in target.get(id) {
                let candidate = Path::join(forward, backward, hop_budget);
                if candidate.hops() > hop_budget as usize || !candidate.has_unique_nodes() {
                    continue;
                }
                if seen.insert(candidate.node_ids()) {
                    joined.push(candidate);
                }
            }
        }
    }
    joined
}

/// Sort by `total_weight` in `order`; ties break on the node-id sequence.
pub fn rank_paths(paths: &mut [Path], order: RankOrder) {
    paths.sort_by(|a, b| {
        let by_weight = match order {
            RankOrder::Descending => b.total_weight().total_cmp(&a.total_weight()),
            RankOrder::Ascending => a.total_weight().total_cmp(&b.total_weight()),
        };
        by_weight.then_with(|| cmp_ids(a, b))
    });
}

fn cmp_ids(a: &Path, b: &Path) -> Ordering {
    a.links
        .iter()
        .map(|n| n.id.as_str())
        .cmp(b.links.iter().map(|n| n.id.as_str()))
}

/// Finds all simple paths of bounded length between two entities.
///
/// # Example
///
/// ```no_run
/// use kgpath::repository::{DegreeRepository, SimilarityRankedRepository};
/// use kgpath::search::{PathFinder, SearchSettings, WorkerPool};
/// use kgpath::similarity::SqliteSetStore;
/// use kgpath::db::Db;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let index = DegreeRepository::open("kg.db");
/// let store = SqliteSetStore::new(Db::new("kg.db"));
/// let repository = SimilarityRankedRepository::new(index, store, 4.4e8);
///
/// let finder = PathFinder::new(repository, WorkerPool::with_available_parallelism(), SearchSettings::default());
/// for path in finder.find_all_paths("CHEBI:6801", "MONDO:0005148", 3).await? {
///     println!("{:?} ({})", path.node_ids(), path.total_weight());
/// }
/// # Ok(())
/// # }
/// ```
///
/// Each direction runs on its own pool of `pool.size()` workers, so up to
/// twice that many lookups are in flight during a search.
pub struct PathFinder<R> {
    repository: Arc<R>,
    source_pool: WorkerPool,
    target_pool: WorkerPool,
    settings: SearchSettings,
}

impl<R> PathFinder<R>
where
    R: NeighborRepository + 'static,
{
    pub fn new(repository: R, pool: WorkerPool, settings: SearchSettings) -> Self {
        Self::from_shared(Arc::new(repository), pool, settings)
    }

    /// Share one repository between several finders.
    pub fn from_shared(repository: Arc<R>, pool: WorkerPool, settings: SearchSettings) -> Self {
        Self {
            repository,
            target_pool: pool.independent(),
            source_pool: pool,
            settings,
        }
    }

    /// Pool and settings from the `[search]` section.
    pub fn with_config(repository: R, config: &SearchConfig) -> Self {
        Self::new(repository, WorkerPool::from_workers(config.workers), SearchSettings::from(config))
    }

    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    fn search(&self, pool: &WorkerPool, goal: &str) -> BreadthFirstSearch<R> {
        BreadthFirstSearch::new(self.repository.clone(), pool.clone(), self.settings.clone())
            .with_goal(goal)
    }

    /// All simple paths from `source_id` to `target_id` with at most
    /// `hop_budget` hops, ordered by the configured [`RankOrder`].
    ///
    /// A zero budget or identical endpoints yield no paths for any input;
    /// otherwise malformed CURIEs are rejected.
    pub async fn find_all_paths(
        &self,
        source_id: &str,
        target_id: &str,
        hop_budget: u32,
    ) -> Result<Vec<Path>> {
        if hop_budget == 0 || source_id == target_id {
            return Ok(Vec::new());
        }
        for id in [source_id, target_id] {
            if !is_valid_curie(id) {
                return Err(PathfinderError::InvalidInput(format!("not a CURIE: {:?}", id)));
            }
        }

        let start = Instant::now();
        let (source_hops, target_hops) = split_hop_budget(hop_budget);

        let forward = tokio::spawn(self.search(&self.source_pool, target_id).run(Node::new(source_id), source_hops));
        let backward = tokio::spawn(self.search(&self.target_pool, source_id).run(Node::new(target_id), target_hops));
        let (forward, backward) = tokio::join!(forward, backward);
        let forward = forward.map_err(|e| PathfinderError::Search(format!("source-side search failed: {}", e)))?;
        let backward = backward.map_err(|e| PathfinderError::Search(format!("target-side search failed: {}", e)))?;

        let mut paths = join_paths(&forward.container, &backward.container, hop_budget);
        rank_paths(&mut paths, self.settings.rank_order);

        log::info!(
            "Found {} paths between {} and {} within {} hops in {:?} ({} + {} paths searched)",
            paths.len(),
            source_id,
            target_id,
            hop_budget,
            start.elapsed(),
            forward.container.path_count(),
            backward.container.path_count()
        );
        if forward.stats.deadline_hit || backward.stats.deadline_hit {
            log::warn!("Path search {} -> {} hit its deadline; results are partial", source_id, target_id);
        }

        Ok(paths)
    }
}
