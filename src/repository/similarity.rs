//! NGD-ranked neighbor expansion.

use std::cmp::Ordering;
use std::sync::Arc;

use super::NeighborRepository;
use crate::cache::SetSizeCache;
use crate::config::SimilarityConfig;
use crate::error::Result;
use crate::graph::Node;
use crate::similarity::{calculate_ngd, LiteratureSetStore};

/// Wraps a repository and reorders its neighbors by literature similarity.
///
/// For every expansion the base repository supplies a candidate pool; each
/// candidate's NGD to the expanded node becomes its link `weight`, the pool is
/// sorted ascending (unscored candidates last, original order otherwise kept)
/// and then cut to the requested limit.
pub struct SimilarityRankedRepository<R, S> {
    base: R,
    store: S,
    log_normalizer: f64,
    candidate_pool: Option<usize>,
    cache: Option<Arc<SetSizeCache>>,
}

impl<R, S> SimilarityRankedRepository<R, S>
where
    R: NeighborRepository,
    S: LiteratureSetStore,
{
    /// `ngd_normalizer` is the corpus size N (not its log).
    pub fn new(base: R, store: S, ngd_normalizer: f64) -> Self {
        Self {
            base,
            store,
            log_normalizer: ngd_normalizer.ln(),
            candidate_pool: None,
            cache: None,
        }
    }

    /// Build from `[similarity]` settings; a zero cache capacity disables the cache.
    pub fn from_config(base: R, store: S, config: &SimilarityConfig) -> Self {
        let repository =
            Self::new(base, store, config.ngd_normalizer).with_candidate_pool(config.candidate_pool);
        if config.cache_capacity > 0 {
            repository.with_cache(Arc::new(SetSizeCache::new(config.cache_capacity)))
        } else {
            repository
        }
    }

    /// Ask the base repository for at most `pool` raw neighbors (never fewer
    /// than the requested limit). Unbounded by default.
    pub fn with_candidate_pool(mut self, pool: Option<usize>) -> Self {
        self.candidate_pool = pool;
        self
    }

    pub fn with_cache(mut self, cache: Arc<SetSizeCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn base(&self) -> &R {
        &self.base
    }

    /// Set sizes for `ids`, served from the cache where possible.
    async fn set_sizes(&self, ids: &[String]) -> Result<Vec<u64>> {
        let Some(cache) = &self.cache else {
            return self.store.set_sizes(ids).await;
        };

        let mut sizes: Vec<Option<u64>> = ids.iter().map(|id| cache.get(id)).collect();
        let missing: Vec<String> = ids
            .iter()
            .zip(&sizes)
            .filter(|(_, size)| size.is_none())
            .map(|(id, _)| id.clone())
            .collect();

        if !missing.is_empty() {
            let fetched = self.store.set_sizes(&missing).await?;
            let mut fetched = missing.into_iter().zip(fetched);
            for size in sizes.iter_mut().filter(|s| s.is_none()) {
                if let Some((id, value)) = fetched.next() {
                    cache.put(id, value);
                    *size = Some(value);
                }
            }
        }

        Ok(sizes.into_iter().map(|s| s.unwrap_or(0)).collect())
    }

    /// Write each neighbor's NGD to `node` into its weight.
    async fn score(&self, node: &Node, neighbors: &mut [Node]) -> Result<()> {
        let neighbor_ids: Vec<String> = neighbors.iter().map(|n| n.id.clone()).collect();

        let mut ids = Vec::with_capacity(neighbor_ids.len() + 1);
        ids.push(node.id.clone());
        ids.extend(neighbor_ids.iter().cloned());

        let sizes = self.set_sizes(&ids).await?;
        let intersections = self
            .store
            .set_intersection_sizes(&node.id, &neighbor_ids)
            .await?;

        let len_a = sizes.first().copied().unwrap_or(0);
        let log_len_a = if len_a > 0 { (len_a as f64).ln() } else { 0.0 };

        let neighbor_sizes = sizes.get(1..).unwrap_or(&[]);
        for ((neighbor, len_b), len_i) in neighbors.iter_mut().zip(neighbor_sizes).zip(&intersections) {
            neighbor.weight = calculate_ngd(log_len_a, *len_b, *len_i, self.log_normalizer);
        }
        Ok(())
    }
}

/// Ascending by weight, unscored last. Stable.
pub(crate) fn sort_by_ngd(neighbors: &mut [Node]) {
    neighbors.sort_by(|a, b| match (a.weight, b.weight) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

impl<R, S> NeighborRepository for SimilarityRankedRepository<R, S>
where
    R: NeighborRepository,
    S: LiteratureSetStore,
{
    async fn get_neighbors(&self, node: &Node, limit: usize) -> Result<Vec<Node>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let pool = self.candidate_pool.unwrap_or(usize::MAX).max(limit);
        let mut neighbors = self.base.get_neighbors(node, pool).await?;
        if neighbors.is_empty() {
            return Ok(neighbors);
        }

        match self.score(node, &mut neighbors).await {
            Ok(()) => sort_by_ngd(&mut neighbors),
            Err(e) => {
                log::warn!("NGD scoring failed for {}, keeping base order: {}", node.id, e);
                for neighbor in neighbors.iter_mut() {
                    neighbor.weight = None;
                }
            }
        }

        neighbors.truncate(limit);
        Ok(neighbors)
    }

    async fn get_node_degree(&self, id: &str) -> Result<Option<u64>> {
        self.base.get_node_degree(id).await
    }
}
