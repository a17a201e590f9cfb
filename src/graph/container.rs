//! Paths grouped by the node they currently end at.

use std::collections::HashMap;

use super::Path;

/// Frontier id -> every path currently ending there.
///
/// Written only by the orchestrating task of one search; read-only once
/// that search has drained.
#[derive(Debug, Default, Clone)]
pub struct PathContainer {
    paths: HashMap<String, Vec<Path>>,
}

impl PathContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `path` under its last node. No deduplication here; duplicates
    /// are removed when the two sides are joined.
    pub fn add(&mut self, path: Path) {
        self.paths
            .entry(path.last().id.clone())
            .or_default()
            .push(path);
    }

    pub fn get(&self, id: &str) -> &[Path] {
        self.paths.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.paths.contains_key(id)
    }

    pub fn frontier_ids(&self) -> impl Iterator<Item = &str> {
        self.paths.keys().map(String::as_str)
    }

    /// Number of distinct frontier nodes.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn path_count(&self) -> usize {
        self.paths.values().map(Vec::len).sum()
    }
}
