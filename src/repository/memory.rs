use std::collections::HashMap;

use super::NeighborRepository;
use crate::error::Result;
use crate::graph::Node;

/// Undirected adjacency held in memory.
///
/// Neighbors come back in insertion order. Degrees default to the adjacency
/// size and can be overridden to model nodes whose full neighborhood is not
/// loaded (hubs in particular).
#[derive(Debug, Default, Clone)]
pub struct InMemoryRepository {
    adjacency: HashMap<String, Vec<String>>,
    nodes: HashMap<String, Node>,
    degrees: HashMap<String, u64>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(a, b)` pairs.
    pub fn from_edges<'a, I>(edges: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut repo = Self::new();
        for (a, b) in edges {
            repo.add_edge(a, b);
        }
        repo
    }

    /// Register name/category metadata for a node.
    pub fn add_node(&mut self, node: Node) {
        self.adjacency.entry(node.id.clone()).or_default();
        self.nodes.insert(node.id.clone(), node);
    }

    pub fn add_edge(&mut self, a: &str, b: &str) {
        if a == b {
            return;
        }
        let forward = self.adjacency.entry(a.to_string()).or_default();
        if !forward.iter().any(|n| n == b) {
            forward.push(b.to_string());
        }
        let backward = self.adjacency.entry(b.to_string()).or_default();
        if !backward.iter().any(|n| n == a) {
            backward.push(a.to_string());
        }
    }

    pub fn set_degree(&mut self, id: &str, degree: u64) {
        self.degrees.insert(id.to_string(), degree);
    }

    fn degree_of(&self, id: &str) -> Option<u64> {
        self.degrees
            .get(id)
            .copied()
            .or_else(|| self.adjacency.get(id).map(|n| n.len() as u64))
    }

    fn describe(&self, id: &str) -> Node {
        let mut node = self
            .nodes
            .get(id)
            .cloned()
            .unwrap_or_else(|| Node::new(id));
        node.weight = None;
        node.degree = self.degree_of(id);
        node
    }
}

impl NeighborRepository for InMemoryRepository {
    async fn get_neighbors(&self, node: &Node, limit: usize) -> Result<Vec<Node>> {
        let Some(ids) = self.adjacency.get(&node.id) else {
            return Ok(Vec::new());
        };
        Ok(ids.iter().take(limit).map(|id| self.describe(id)).collect())
    }

    async fn get_node_degree(&self, id: &str) -> Result<Option<u64>> {
        Ok(self.degree_of(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_neighbors_are_undirected_and_limited() {
        let repo = InMemoryRepository::from_edges([("A:1", "B:1"), ("A:1", "C:1"), ("D:1", "A:1")]);

        let all = repo.get_neighbors(&Node::new("A:1"), 10).await.unwrap();
        let ids: Vec<_> = all.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["B:1", "C:1", "D:1"]);

        let limited = repo.get_neighbors(&Node::new("A:1"), 2).await.unwrap();
        assert_eq!(limited.len(), 2);

        let back = repo.get_neighbors(&Node::new("D:1"), 10).await.unwrap();
        assert_eq!(back[0].id, "A:1");
    }

    #[tokio::test]
    async fn test_unknown_node() {
        let repo = InMemoryRepository::from_edges([("A:1", "B:1")]);
        assert!(repo.get_neighbors(&Node::new("Z:1"), 5).await.unwrap().is_empty());
        assert_eq!(repo.get_node_degree("Z:1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_degree_override_and_metadata() {
        let mut repo = InMemoryRepository::from_edges([("A:1", "HUB:1")]);
        repo.set_degree("HUB:1", 50_000);
        repo.add_node(Node::new("HUB:1").with_name("protein").with_category("biolink:Protein"));

        assert_eq!(repo.get_node_degree("HUB:1").await.unwrap(), Some(50_000));
        assert_eq!(repo.get_node_degree("A:1").await.unwrap(), Some(1));

        let neighbors = repo.get_neighbors(&Node::new("A:1"), 5).await.unwrap();
        assert_eq!(neighbors[0].degree, Some(50_000));
        assert_eq!(neighbors[0].name.as_deref(), Some("protein"));
    }

    #[tokio::test]
    async fn test_self_loops_ignored() {
        let mut repo = InMemoryRepository::new();
        repo.add_edge("A:1", "A:1");
        repo.add_edge("A:1", "B:1");
        repo.add_edge("A:1", "B:1");
        assert_eq!(repo.get_node_degree("A:1").await.unwrap(), Some(1));
    }
}
