//! Literature association sets: for each entity, the publications it occurs in.

use std::collections::{HashMap, HashSet};
use std::future::Future;

use rusqlite::params;

use crate::db::{migrate, Db};
use crate::error::Result;

/// Cardinality and intersection queries over per-entity publication sets.
///
/// Unknown ids have an empty set. The batched calls exist so remote or
/// on-disk stores can answer a whole fanout in one round trip.
pub trait LiteratureSetStore: Send + Sync {
    fn set_size(&self, id: &str) -> impl Future<Output = Result<u64>> + Send;

    fn set_intersection_size(&self, a: &str, b: &str) -> impl Future<Output = Result<u64>> + Send;

    fn set_sizes(&self, ids: &[String]) -> impl Future<Output = Result<Vec<u64>>> + Send {
        async move {
            let mut sizes = Vec::with_capacity(ids.len());
            for id in ids {
                sizes.push(self.set_size(id).await?);
            }
            Ok(sizes)
        }
    }

    fn set_intersection_sizes(
        &self,
        id: &str,
        others: &[String],
    ) -> impl Future<Output = Result<Vec<u64>>> + Send {
        async move {
            let mut sizes = Vec::with_capacity(others.len());
            for other in others {
                sizes.push(self.set_intersection_size(id, other).await?);
            }
            Ok(sizes)
        }
    }
}

/// Publication sets held in memory.
#[derive(Debug, Default, Clone)]
pub struct MemorySetStore {
    sets: HashMap<String, HashSet<u64>>,
}

impl MemorySetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<I>(&mut self, id: &str, pmids: I)
    where
        I: IntoIterator<Item = u64>,
    {
        self.sets.entry(id.to_string()).or_default().extend(pmids);
    }

    fn size(&self, id: &str) -> u64 {
        self.sets.get(id).map(|s| s.len() as u64).unwrap_or(0)
    }

    fn intersection(&self, a: &str, b: &str) -> u64 {
        match (self.sets.get(a), self.sets.get(b)) {
            (Some(sa), Some(sb)) => sa.intersection(sb).count() as u64,
            _ => 0,
        }
    }
}

impl LiteratureSetStore for MemorySetStore {
    async fn set_size(&self, id: &str) -> Result<u64> {
        Ok(self.size(id))
    }

    async fn set_intersection_size(&self, a: &str, b: &str) -> Result<u64> {
        Ok(self.intersection(a, b))
    }
}

/// Publication sets in the `literature_link(id, pmid)` SQLite table.
#[derive(Debug, Clone)]
pub struct SqliteSetStore {
    db: Db,
}

impl SqliteSetStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Create the lookup-store tables if they are missing.
    pub async fn create_schema(&self) -> Result<()> {
        self.db.with_connection(|conn| migrate::run_migrations(conn)).await
    }

    /// Record that `id` occurs in each of `pmids`.
    pub async fn insert_links(&self, id: &str, pmids: &[u64]) -> Result<()> {
        let id = id.to_string();
        let pmids = pmids.to_vec();
        self.db
            .with_connection(move |conn| {
                let tx = conn.transaction()?;
                {
                    let mut stmt = tx.prepare(
                        "INSERT OR IGNORE INTO literature_link (id, pmid) VALUES (?1, ?2)",
                    )?;
                    for pmid in &pmids {
                        stmt.execute(params![id, *pmid as i64])?;
                    }
                }
                tx.commit()?;
                Ok(())
            })
            .await
    }
}

const SIZE_SQL: &str = "SELECT COUNT(*) FROM literature_link WHERE id = ?1";
const INTERSECTION_SQL: &str = "SELECT COUNT(*) FROM literature_link a \
     JOIN literature_link b ON a.pmid = b.pmid \
     WHERE a.id = ?1 AND b.id = ?2";

impl LiteratureSetStore for SqliteSetStore {
    async fn set_size(&self, id: &str) -> Result<u64> {
        let mut sizes = self.set_sizes(&[id.to_string()]).await?;
        Ok(sizes.pop().unwrap_or(0))
    }

    async fn set_intersection_size(&self, a: &str, b: &str) -> Result<u64> {
        let mut sizes = self.set_intersection_sizes(a, &[b.to_string()]).await?;
        Ok(sizes.pop().unwrap_or(0))
    }

    async fn set_sizes(&self, ids: &[String]) -> Result<Vec<u64>> {
        let ids = ids.to_vec();
        self.db
            .with_connection(move |conn| {
                let mut stmt = conn.prepare_cached(SIZE_SQL)?;
                let mut sizes = Vec::with_capacity(ids.len());
                for id in &ids {
                    let count: i64 = stmt.query_row([id], |row| row.get(0))?;
                    sizes.push(count.max(0) as u64);
                }
                Ok(sizes)
            })
            .await
    }

    async fn set_intersection_sizes(&self, id: &str, others: &[String]) -> Result<Vec<u64>> {
        let id = id.to_string();
        let others = others.to_vec();
        self.db
            .with_connection(move |conn| {
                let mut stmt = conn.prepare_cached(INTERSECTION_SQL)?;
                let mut sizes = Vec::with_capacity(others.len());
                for other in &others {
                    let count: i64 = stmt.query_row(params![id, other], |row| row.get(0))?;
                    sizes.push(count.max(0) as u64);
                }
                Ok(sizes)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_memory_store_counts() {
        let mut store = MemorySetStore::new();
        store.insert("CHEBI:6801", [1, 2, 3, 4]);
        store.insert("DOID:9352", [3, 4, 5]);

        assert_eq!(store.set_size("CHEBI:6801").await.unwrap(), 4);
        assert_eq!(store.set_size("UNKNOWN:1").await.unwrap(), 0);
        assert_eq!(store.set_intersection_size("CHEBI:6801", "DOID:9352").await.unwrap(), 2);
        assert_eq!(store.set_intersection_size("CHEBI:6801", "UNKNOWN:1").await.unwrap(), 0);

        let sizes = store.set_sizes(&ids(&["DOID:9352", "UNKNOWN:1"])).await.unwrap();
        assert_eq!(sizes, vec![3, 0]);
    }

    #[tokio::test]
    async fn test_sqlite_store_counts() {
        let temp_dir = TempDir::new().unwrap();
        let store = SqliteSetStore::new(Db::new(temp_dir.path().join("lit.db")));
        store.create_schema().await.unwrap();
        store.insert_links("CHEBI:6801", &[1, 2, 3, 4]).await.unwrap();
        store.insert_links("DOID:9352", &[3, 4, 5]).await.unwrap();
        store.insert_links("NCBIGene:1017", &[5]).await.unwrap();
        // duplicates are ignored
        store.insert_links("NCBIGene:1017", &[5]).await.unwrap();

        assert_eq!(store.set_size("NCBIGene:1017").await.unwrap(), 1);
        assert_eq!(store.set_size("UNKNOWN:1").await.unwrap(), 0);
        assert_eq!(store.set_intersection_size("CHEBI:6801", "DOID:9352").await.unwrap(), 2);

        let batch = store
            .set_intersection_sizes("DOID:9352", &ids(&["CHEBI:6801", "NCBIGene:1017", "UNKNOWN:1"]))
            .await
            .unwrap();
        assert_eq!(batch, vec![2, 1, 0]);
    }

    #[tokio::test]
    async fn test_sqlite_store_without_schema_errors() {
        let temp_dir = TempDir::new().unwrap();
        let store = SqliteSetStore::new(Db::new(temp_dir.path().join("empty.db")));
        assert!(store.set_size("CHEBI:6801").await.is_err());
    }
}
