use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Thread-safe LRU cache of literature set sizes
///
/// Hub-adjacent entities show up in almost every fanout, so their
/// cardinality is looked up far more often than it changes. The cache is
/// shared by every worker of a search.
pub struct SetSizeCache {
    cache: Mutex<LruCache<String, u64>>,
}

impl SetSizeCache {
    /// Create a new set-size cache with the specified capacity
    ///
    /// A capacity of 0 is raised to 1.
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);

        Self {
            cache: Mutex::new(LruCache::new(cap)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<String, u64>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cached size for `id`, refreshing its recency
    pub fn get(&self, id: &str) -> Option<u64> {
        self.lock().get(id).copied()
    }

    pub fn put(&self, id: String, size: u64) {
        self.lock().put(id, size);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}
