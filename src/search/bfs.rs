//! Single-direction, degree-pruned breadth-first path expansion.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::{SearchSettings, WorkerPool};
use crate::graph::{Node, Path, PathContainer};
use crate::repository::NeighborRepository;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchState {
    Seeded,
    Expanding,
    Drained,
}

/// Counters for one search direction.
#[derive(Debug, Clone, Default)]
pub struct SearchStats {
    /// Frontiers whose neighbors were fetched.
    pub expanded: usize,
    /// Frontiers and candidate neighbors rejected for exceeding the hub threshold.
    pub pruned_hubs: usize,
    /// Branches dropped because a repository call failed.
    pub failed_lookups: usize,
    pub paths_produced: usize,
    pub deadline_hit: bool,
    pub elapsed: Duration,
}

/// What a drained search hands to the join step.
#[derive(Debug)]
pub struct SearchOutcome {
    pub container: PathContainer,
    pub stats: SearchStats,
}

/// Result of expanding one path on a worker.
#[derive(Debug)]
enum Expansion {
    /// Out of hops, or the frontier is the goal.
    Terminal,
    PrunedHub,
    Failed,
    Extended { paths: Vec<Path>, pruned_hubs: usize },
}

/// Expands partial paths from one seed until every branch is out of hops or
/// pruned.
///
/// Only this struct touches its queue and container; workers receive owned
/// paths and return new ones.
pub struct BreadthFirstSearch<R> {
    repository: Arc<R>,
    pool: WorkerPool,
    settings: SearchSettings,
    goal: Option<String>,
    state: SearchState,
    queue: VecDeque<Path>,
    container: PathContainer,
    stats: SearchStats,
    started: Option<Instant>,
}

impl<R> BreadthFirstSearch<R>
where
    R: NeighborRepository + 'static,
{
    pub fn new(repository: Arc<R>, pool: WorkerPool, settings: SearchSettings) -> Self {
        Self {
            repository,
            pool,
            settings,
            goal: None,
            state: SearchState::Drained,
            queue: VecDeque::new(),
            container: PathContainer::new(),
            stats: SearchStats::default(),
            started: None,
        }
    }

    /// The opposite endpoint. Paths reaching it are complete: they are not
    /// expanded further, and the goal is exempt from hub pruning as a neighbor.
    pub fn with_goal(mut self, goal: impl Into<String>) -> Self {
        self.goal = Some(goal.into());
        self
    }

    pub fn state(&self) -> SearchState {
        self.state
    }

    pub fn container(&self) -> &PathContainer {
        &self.container
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Reset to a single path holding `start`.
    pub fn seed(&mut self, start: Node, hop_budget: u32) {
        let path = Path::seed(start, hop_budget);
        self.container = PathContainer::new();
        self.queue.clear();
        self.stats = SearchStats::default();
        self.container.add(path.clone());
        self.queue.push_back(path);
        self.started = Some(Instant::now());
        self.state = SearchState::Seeded;
    }

    fn deadline_passed(&self) -> bool {
        match (self.settings.deadline, self.started) {
            (Some(limit), Some(started)) => started.elapsed() >= limit,
            _ => false,
        }
    }

    /// Expand one batch. Returns false once the search has drained.
    pub async fn step(&mut self) -> bool {
        if self.state == SearchState::Drained {
            return false;
        }
        if self.deadline_passed() {
            log::warn!(
                "Search deadline of {:?} reached with {} paths still queued",
                self.settings.deadline.unwrap_or_default(),
                self.queue.len()
            );
            self.stats.deadline_hit = true;
            self.queue.clear();
        }
        if self.queue.is_empty() {
            self.finish();
            return false;
        }
        self.state = SearchState::Expanding;

        let batch_size = (self.settings.batch_factor * self.pool.size()).max(1);
        let take = batch_size.min(self.queue.len());
        let batch: Vec<Path> = self.queue.drain(..take).collect();

        let batch_start = Instant::now();
        let jobs: Vec<_> = batch
            .into_iter()
            .map(|path| {
                let repository = self.repository.clone();
                let settings = self.settings.clone();
                let goal = self.goal.clone();
                async move { expand(repository.as_ref(), path, &settings, goal.as_deref()).await }
            })
            .collect();
        let expansions = self.pool.run(jobs).await;
        log::debug!(
            "Expanded batch of {} paths in {:?}",
            expansions.len(),
            batch_start.elapsed()
        );

        for expansion in expansions {
            match expansion {
                Expansion::Terminal => {}
                Expansion::PrunedHub => self.stats.pruned_hubs += 1,
                Expansion::Failed => self.stats.failed_lookups += 1,
                Expansion::Extended { paths, pruned_hubs } => {
                    self.stats.expanded += 1;
                    self.stats.pruned_hubs += pruned_hubs;
                    for path in paths {
                        self.stats.paths_produced += 1;
                        if path.hop_budget > 0 {
                            self.queue.push_back(path.clone());
                        }
                        self.container.add(path);
                    }
                }
            }
        }

        if self.queue.is_empty() {
            self.finish();
            return false;
        }
        true
    }

    fn finish(&mut self) {
        self.state = SearchState::Drained;
        if let Some(started) = self.started {
            self.stats.elapsed = started.elapsed();
        }
    }

    /// Seed, expand to completion and hand back the collected paths.
    pub async fn run(mut self, start: Node, hop_budget: u32) -> SearchOutcome {
        let start_id = start.id.clone();
        self.seed(start, hop_budget);
        while self.step().await {}

        log::debug!(
            "Search from {} drained: {} frontier nodes, {} paths, {} expanded, {} hubs pruned, {} failed lookups in {:?}",
            start_id,
            self.container.len(),
            self.container.path_count(),
            self.stats.expanded,
            self.stats.pruned_hubs,
            self.stats.failed_lookups,
            self.stats.elapsed
        );
        self.into_outcome()
    }

    pub fn into_outcome(self) -> SearchOutcome {
        SearchOutcome {
            container: self.container,
            stats: self.stats,
        }
    }
}

fn is_hub(degree: Option<u64>, threshold: u64) -> bool {
    degree.is_some_and(|d| d > threshold)
}

/// Expand one path by one hop.
async fn expand<R: NeighborRepository>(
    repository: &R,
    path: Path,
    settings: &SearchSettings,
    goal: Option<&str>,
) -> Expansion {
    if path.hop_budget == 0 {
        return Expansion::Terminal;
    }
    let frontier = path.last();
    if goal == Some(frontier.id.as_str()) {
        return Expansion::Terminal;
    }

    // Endpoints are expanded whatever their degree; only intermediates are pruned.
    if path.len() > 1 {
        match repository.get_node_degree(&frontier.id).await {
            Ok(degree) if is_hub(degree, settings.hub_threshold) => {
                log::debug!("Not expanding hub {} (degree {:?})", frontier.id, degree);
                return Expansion::PrunedHub;
            }
            Ok(_) => {}
            Err(e) => {
                log::warn!("Degree lookup for {} failed, pruning branch: {}", frontier.id, e);
                return Expansion::Failed;
            }
        }
    }

    let neighbors = match repository.get_neighbors(frontier, settings.fanout_limit).await {
        Ok(neighbors) => neighbors,
        Err(e) => {
            log::warn!("Neighbor lookup for {} failed, pruning branch: {}", frontier.id, e);
            return Expansion::Failed;
        }
    };

    let mut paths = Vec::with_capacity(neighbors.len());
    let mut pruned_hubs = 0;
    for neighbor in neighbors {
        if path.contains(&neighbor.id) {
            continue;
        }
        if goal != Some(neighbor.id.as_str()) {
            let degree = match neighbor.degree {
                Some(d) => Some(d),
                None => match repository.get_node_degree(&neighbor.id).await {
                    Ok(d) => d,
                    Err(e) => {
                        log::warn!("Degree lookup for {} failed, skipping: {}", neighbor.id, e);
                        continue;
                    }
                },
            };
            if is_hub(degree, settings.hub_threshold) {
                pruned_hubs += 1;
                continue;
            }
        }
        if let Ok(next) = path.extend(neighbor) {
            paths.push(next);
        }
    }

    Expansion::Extended { paths, pruned_hubs }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{PathfinderError, Result};
    use crate::repository::InMemoryRepository;

    fn settings() -> SearchSettings {
        SearchSettings {
            hub_threshold: 100,
            fanout_limit: 10,
            batch_factor: 2,
            deadline: None,
            rank_order: Default::default(),
        }
    }

    fn search(repo: InMemoryRepository, workers: usize) -> BreadthFirstSearch<InMemoryRepository> {
        BreadthFirstSearch::new(Arc::new(repo), WorkerPool::new(workers), settings())
    }

    fn chain() -> InMemoryRepository {
        InMemoryRepository::from_edges([("A:1", "B:1"), ("B:1", "C:1"), ("C:1", "D:1")])
    }

    fn sorted_ids(paths: &[Path]) -> Vec<Vec<String>> {
        let mut ids: Vec<_> = paths.iter().map(|p| p.node_ids()).collect();
        ids.sort();
        ids
    }

    #[tokio::test]
    async fn test_chain_respects_hop_budget() {
        let outcome = search(chain(), 1).run(Node::new("A:1"), 2).await;
        let container = &outcome.container;

        assert!(container.contains("A:1"));
        assert!(container.contains("B:1"));
        assert!(container.contains("C:1"));
        assert!(!container.contains("D:1"));
        assert_eq!(container.get("C:1")[0].node_ids(), vec!["A:1", "B:1", "C:1"]);
        assert_eq!(container.get("C:1")[0].hop_budget, 0);
        assert_eq!(outcome.stats.paths_produced, 2);
    }

    #[tokio::test]
    async fn test_zero_budget_only_seed() {
        let outcome = search(chain(), 1).run(Node::new("A:1"), 0).await;
        assert_eq!(outcome.container.len(), 1);
        assert_eq!(outcome.container.path_count(), 1);
        assert_eq!(outcome.stats.expanded, 0);
    }

    #[tokio::test]
    async fn test_paths_stay_simple_in_cycles() {
        let repo = InMemoryRepository::from_edges([("A:1", "B:1"), ("B:1", "C:1"), ("C:1", "A:1")]);
        let outcome = search(repo, 2).run(Node::new("A:1"), 5).await;

        let c = &outcome.container;
        assert!(c.get("A:1").iter().all(|p| p.len() == 1));
        for id in ["B:1", "C:1"] {
            for path in c.get(id) {
                assert!(path.has_unique_nodes());
            }
        }
        assert_eq!(
            sorted_ids(c.get("C:1")),
            vec![vec!["A:1", "B:1", "C:1"], vec!["A:1", "C:1"]]
        );
    }

    #[tokio::test]
    async fn test_hub_neighbor_not_entered() {
        let mut repo = InMemoryRepository::from_edges([("A:1", "HUB:1"), ("HUB:1", "D:1"), ("A:1", "B:1")]);
        repo.set_degree("HUB:1", 10_000);
        let outcome = search(repo, 1).run(Node::new("A:1"), 3).await;

        assert!(!outcome.container.contains("HUB:1"));
        assert!(!outcome.container.contains("D:1"));
        assert!(outcome.container.contains("B:1"));
        assert_eq!(outcome.stats.pruned_hubs, 1);
    }

    #[tokio::test]
    async fn test_hub_seed_still_expanded() {
        let mut repo = chain();
        repo.set_degree("A:1", 10_000);
        let outcome = search(repo, 1).run(Node::new("A:1"), 3).await;
        assert_eq!(outcome.container.len(), 4);
        assert!(outcome.container.contains("D:1"));
        assert_eq!(outcome.stats.pruned_hubs, 0);
    }

    #[tokio::test]
    async fn test_goal_hub_reachable_but_not_expanded() {
        let mut repo = InMemoryRepository::from_edges([("A:1", "T:1"), ("T:1", "Z:1")]);
        repo.set_degree("T:1", 10_000);
        let outcome = search(repo, 1).with_goal("T:1").run(Node::new("A:1"), 3).await;

        assert_eq!(outcome.container.get("T:1")[0].node_ids(), vec!["A:1", "T:1"]);
        assert!(!outcome.container.contains("Z:1"));
    }

    #[tokio::test]
    async fn test_fanout_limit() {
        let repo = InMemoryRepository::from_edges([
            ("A:1", "B:1"),
            ("A:1", "C:1"),
            ("A:1", "D:1"),
            ("A:1", "E:1"),
        ]);
        let mut bfs = search(repo, 1);
        bfs.settings.fanout_limit = 2;
        let outcome = bfs.run(Node::new("A:1"), 1).await;
        assert_eq!(outcome.container.len(), 3);
        assert!(outcome.container.contains("B:1"));
        assert!(outcome.container.contains("C:1"));
    }

    #[tokio::test]
    async fn test_state_transitions() {
        let mut bfs = search(chain(), 1);
        assert_eq!(bfs.state(), SearchState::Drained);

        bfs.seed(Node::new("A:1"), 3);
        assert_eq!(bfs.state(), SearchState::Seeded);
        assert_eq!(bfs.pending(), 1);

        assert!(bfs.step().await);
        assert_eq!(bfs.state(), SearchState::Expanding);

        while bfs.step().await {}
        assert_eq!(bfs.state(), SearchState::Drained);
        assert_eq!(bfs.pending(), 0);
        assert!(!bfs.step().await);
        assert!(bfs.container().contains("D:1"));
    }

    #[tokio::test]
    async fn test_single_and_multi_worker_agree() {
        let repo = InMemoryRepository::from_edges([
            ("A:1", "B:1"),
            ("A:1", "C:1"),
            ("B:1", "D:1"),
            ("C:1", "D:1"),
            ("D:1", "E:1"),
            ("B:1", "C:1"),
        ]);
        let one = search(repo.clone(), 1).run(Node::new("A:1"), 3).await;
        let many = search(repo, 8).run(Node::new("A:1"), 3).await;

        for id in ["A:1", "B:1", "C:1", "D:1", "E:1"] {
            assert_eq!(
                one.container.get(id).iter().map(|p| p.node_ids()).collect::<Vec<_>>(),
                many.container.get(id).iter().map(|p| p.node_ids()).collect::<Vec<_>>(),
                "containers differ at {}",
                id
            );
        }
    }

    #[tokio::test]
    async fn test_expired_deadline_stops_expansion() {
        let mut bfs = search(chain(), 1);
        bfs.settings.deadline = Some(Duration::ZERO);
        let outcome = bfs.run(Node::new("A:1"), 3).await;
        assert!(outcome.stats.deadline_hit);
        assert_eq!(outcome.container.len(), 1);
    }

    /// Chain repository whose lookups fail for one node.
    struct FlakyRepository {
        inner: InMemoryRepository,
        broken: &'static str,
    }

    impl NeighborRepository for FlakyRepository {
        async fn get_neighbors(&self, node: &Node, limit: usize) -> Result<Vec<Node>> {
            if node.id == self.broken {
                return Err(PathfinderError::Remote("connection reset".to_string()));
            }
            self.inner.get_neighbors(node, limit).await
        }

        async fn get_node_degree(&self, id: &str) -> Result<Option<u64>> {
            self.inner.get_node_degree(id).await
        }
    }

    #[tokio::test]
    async fn test_failed_branch_pruned_others_continue() {
        let _ = env_logger::builder().is_test(true).try_init();
        let repo = FlakyRepository {
            inner: InMemoryRepository::from_edges([
                ("A:1", "B:1"),
                ("A:1", "C:1"),
                ("B:1", "X:1"),
                ("C:1", "Y:1"),
            ]),
            broken: "B:1",
        };
        let bfs = BreadthFirstSearch::new(Arc::new(repo), WorkerPool::new(2), settings());
        let outcome = bfs.run(Node::new("A:1"), 2).await;

        assert!(outcome.container.contains("B:1"));
        assert!(!outcome.container.contains("X:1"));
        assert!(outcome.container.contains("Y:1"));
        assert_eq!(outcome.stats.failed_lookups, 1);
    }
}
