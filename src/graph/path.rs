//! Simple paths with a remaining hop budget.

use serde::{Deserialize, Serialize};

use super::Node;
use crate::error::{PathfinderError, Result};

/// An ordered simple path from a search seed to its current frontier.
///
/// Paths are never mutated once built; `extend` copies and appends, so a
/// `Path` can be handed to a worker task without locking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Path {
    /// Remaining hops this path may still take.
    pub hop_budget: u32,
    pub links: Vec<Node>,
}

impl Path {
    /// One-link path holding only the search seed. The seed has no
    /// predecessor, so its link weight is zero.
    pub fn seed(start: Node, hop_budget: u32) -> Self {
        Self {
            hop_budget,
            links: vec![start.with_weight(Some(0.0))],
        }
    }

    /// Copy this path and append `next`, spending one hop.
    pub fn extend(&self, next: Node) -> Result<Path> {
        if self.hop_budget == 0 {
            return Err(PathfinderError::InvalidInput(format!(
                "cannot extend path ending at {} with no hops left",
                self.last().id
            )));
        }
        if self.contains(&next.id) {
            return Err(PathfinderError::CycleRejected(next.id));
        }
        let mut links = Vec::with_capacity(self.links.len() + 1);
        links.extend_from_slice(&self.links);
        links.push(next);
        Ok(Path {
            hop_budget: self.hop_budget - 1,
            links,
        })
    }

    /// Join a source-side half with a target-side half that ends at the same
    /// meeting node.
    ///
    /// The target half is read backwards. Its link weights describe the edge
    /// from the previous node in target order, so each reversed link takes the
    /// weight of the link that followed it in the target half.
    pub fn join(source_half: &Path, target_half: &Path, hop_budget: u32) -> Path {
        let back = &target_half.links;
        let mut links = Vec::with_capacity(source_half.links.len() + back.len().saturating_sub(1));
        links.extend_from_slice(&source_half.links);
        for i in (0..back.len().saturating_sub(1)).rev() {
            let mut node = back[i].clone();
            node.weight = back[i + 1].weight;
            links.push(node);
        }
        let hops = links.len().saturating_sub(1) as u32;
        Path {
            hop_budget: hop_budget.saturating_sub(hops),
            links,
        }
    }

    /// Frontier node. Paths always hold at least their seed.
    pub fn last(&self) -> &Node {
        &self.links[self.links.len() - 1]
    }

    pub fn first(&self) -> &Node {
        &self.links[0]
    }

    pub fn contains(&self, id: &str) -> bool {
        self.links.iter().any(|n| n.id == id)
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Number of edges walked.
    pub fn hops(&self) -> usize {
        self.links.len().saturating_sub(1)
    }

    pub fn node_ids(&self) -> Vec<String> {
        self.links.iter().map(|n| n.id.clone()).collect()
    }

    /// Sum of link weights; +inf as soon as one link is unscored.
    pub fn total_weight(&self) -> f64 {
        self.links
            .iter()
            .try_fold(0.0, |acc, n| n.weight.map(|w| acc + w))
            .unwrap_or(f64::INFINITY)
    }

    /// True when no node id repeats.
    pub fn has_unique_nodes(&self) -> bool {
        let mut seen = std::collections::HashSet::with_capacity(self.links.len());
        self.links.iter().all(|n| seen.insert(n.id.as_str()))
    }
}
