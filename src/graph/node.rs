//! Graph entity value type.

use std::hash::{Hash, Hasher};
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// A knowledge-graph entity as seen by the path finder.
///
/// Equality and hashing use `id` only: two nodes with the same CURIE are
/// interchangeable regardless of weight or metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// CURIE, e.g. `DOID:9352`.
    pub id: String,
    /// Cost of reaching this node from its predecessor on a path.
    /// `None` means unscored and counts as +inf in path totals.
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub name: Option<String>,
    /// Total edge count, when the source knows it.
    #[serde(default)]
    pub degree: Option<u64>,
    #[serde(default)]
    pub category: Option<String>,
}

impl Node {
    /// Create an unscored node with no metadata.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            weight: None,
            name: None,
            degree: None,
            category: None,
        }
    }

    pub fn with_weight(mut self, weight: Option<f64>) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_degree(mut self, degree: u64) -> Self {
        self.degree = Some(degree);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn is_scored(&self) -> bool {
        self.weight.is_some()
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Node {}

impl Hash for Node {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

fn curie_regex() -> &'static Regex {
    static CURIE: OnceLock<Regex> = OnceLock::new();
    CURIE.get_or_init(|| {
        Regex::new(r"^[A-Za-z][A-Za-z0-9_.\-]*:\S+$").expect("Invalid regex pattern")
    })
}

/// Check that `id` looks like `PREFIX:local_id`.
pub fn is_valid_curie(id: &str) -> bool {
    curie_regex().is_match(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_equality_ignores_weight_and_metadata() {
        let a = Node::new("DOID:9352").with_weight(Some(0.4)).with_name("type 2 diabetes");
        let b = Node::new("DOID:9352").with_degree(12);
        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(!set.insert(b));
    }

    #[test]
    fn test_new_node_is_unscored() {
        let node = Node::new("CHEBI:6801");
        assert!(!node.is_scored());
        assert!(node.degree.is_none());
    }

    #[test]
    fn test_curie_validation() {
        assert!(is_valid_curie("DOID:9352"));
        assert!(is_valid_curie("CHEBI:6801"));
        assert!(is_valid_curie("NCBIGene:1017"));
        assert!(is_valid_curie("UMLS:C0011860"));
        assert!(!is_valid_curie(""));
        assert!(!is_valid_curie("DOID"));
        assert!(!is_valid_curie(":9352"));
        assert!(!is_valid_curie("DOID: 9352"));
    }

    #[test]
    fn test_deserialize_with_missing_fields() {
        let node: Node = serde_json::from_str(r#"{"id": "MONDO:0005148"}"#).unwrap();
        assert_eq!(node.id, "MONDO:0005148");
        assert!(node.weight.is_none());
        assert!(node.category.is_none());
    }
}
