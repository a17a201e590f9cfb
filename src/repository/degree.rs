//! Precomputed SQLite degree index.

use rusqlite::{params, OptionalExtension};
use std::path::Path;

use super::NeighborRepository;
use crate::db::{migrate, Db};
use crate::error::Result;
use crate::graph::Node;

/// Category key of the overall degree row in `node_degree`.
const ALL_CATEGORIES: &str = "*";

/// Read-only degree lookups over a snapshot of the graph.
///
/// The index holds node metadata, the overall degree of each node plus an
/// optional per-category breakdown, and the adjacency the degrees were
/// computed from. The loader methods exist to build such a snapshot.
#[derive(Debug, Clone)]
pub struct DegreeRepository {
    db: Db,
}

impl DegreeRepository {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        Self::new(Db::new(path))
    }

    /// Create the index tables if they are missing.
    pub async fn create_schema(&self) -> Result<()> {
        self.db.with_connection(|conn| migrate::run_migrations(conn)).await
    }

    pub async fn insert_node(&self, node: &Node) -> Result<()> {
        let node = node.clone();
        self.db
            .with_connection(move |conn| {
                conn.execute(
                    "INSERT OR REPLACE INTO node (id, name, category) VALUES (?1, ?2, ?3)",
                    params![node.id, node.name, node.category],
                )?;
                Ok(())
            })
            .await
    }

    /// Insert an undirected edge.
    pub async fn insert_edge(&self, subject: &str, object: &str) -> Result<()> {
        let subject = subject.to_string();
        let object = object.to_string();
        self.db
            .with_connection(move |conn| {
                conn.execute(
                    "INSERT OR IGNORE INTO edge (subject, object) VALUES (?1, ?2)",
                    params![subject, object],
                )?;
                Ok(())
            })
            .await
    }

    /// Store a degree; `category: None` sets the overall degree.
    pub async fn insert_degree(&self, id: &str, category: Option<&str>, degree: u64) -> Result<()> {
        let id = id.to_string();
        let category = category.unwrap_or(ALL_CATEGORIES).to_string();
        self.db
            .with_connection(move |conn| {
                conn.execute(
                    "INSERT OR REPLACE INTO node_degree (id, category, degree) VALUES (?1, ?2, ?3)",
                    params![id, category, degree as i64],
                )?;
                Ok(())
            })
            .await
    }

    /// Overall degree of `id`, `None` when the index has no row for it.
    pub async fn degree(&self, id: &str) -> Result<Option<u64>> {
        self.degree_by_category(id, ALL_CATEGORIES).await
    }

    /// Number of `id`'s neighbors in `category` (e.g. `biolink:Protein`).
    pub async fn degree_by_category(&self, id: &str, category: &str) -> Result<Option<u64>> {
        let id = id.to_string();
        let category = category.to_string();
        self.db
            .with_connection(move |conn| {
                let degree: Option<i64> = conn
                    .query_row(
                        "SELECT degree FROM node_degree WHERE id = ?1 AND category = ?2",
                        params![id, category],
                        |row| row.get(0),
                    )
                    .optional()?;
                Ok(degree.map(|d| d.max(0) as u64))
            })
            .await
    }
}

impl NeighborRepository for DegreeRepository {
    async fn get_neighbors(&self, node: &Node, limit: usize) -> Result<Vec<Node>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let id = node.id.clone();
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.db
            .with_connection(move |conn| {
                let mut stmt = conn.prepare_cached(
                    "SELECT nb.id, node.name, node.category, d.degree \
                     FROM (SELECT object AS id FROM edge WHERE subject = ?1 \
                           UNION \
                           SELECT subject AS id FROM edge WHERE object = ?1) nb \
                     LEFT JOIN node ON node.id = nb.id \
                     LEFT JOIN node_degree d ON d.id = nb.id AND d.category = '*' \
                     WHERE nb.id <> ?1 \
                     ORDER BY nb.id \
                     LIMIT ?2",
                )?;
                let rows = stmt.query_map(params![id, limit], |row| {
                    let degree: Option<i64> = row.get(3)?;
                    Ok(Node {
                        id: row.get(0)?,
                        weight: None,
                        name: row.get(1)?,
                        degree: degree.map(|d| d.max(0) as u64),
                        category: row.get(2)?,
                    })
                })?;
                let mut out = Vec::new();
                for row in rows {
                    out.push(row?);
                }
                Ok(out)
            })
            .await
    }

    async fn get_node_degree(&self, id: &str) -> Result<Option<u64>> {
        self.degree(id).await
    }
}
