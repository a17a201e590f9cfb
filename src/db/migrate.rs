use rusqlite::{params, Connection};

use crate::error::Result;

/// Embedded schema step for the lookup stores.
struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

/// Lookup-store schema, applied in version order.
const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "001_degree_index",
        sql: "CREATE TABLE IF NOT EXISTS node (
                  id TEXT PRIMARY KEY,
                  name TEXT,
                  category TEXT
              );
              CREATE TABLE IF NOT EXISTS node_degree (
                  id TEXT NOT NULL,
                  category TEXT NOT NULL DEFAULT '*',
                  degree INTEGER NOT NULL,
                  PRIMARY KEY (id, category)
              );
              CREATE TABLE IF NOT EXISTS edge (
                  subject TEXT NOT NULL,
                  object TEXT NOT NULL,
                  PRIMARY KEY (subject, object)
              );
              CREATE INDEX IF NOT EXISTS idx_edge_object ON edge(object);",
    },
    Migration {
        version: 2,
        name: "002_literature_links",
        sql: "CREATE TABLE IF NOT EXISTS literature_link (
                  id TEXT NOT NULL,
                  pmid INTEGER NOT NULL,
                  PRIMARY KEY (id, pmid)
              );
              CREATE INDEX IF NOT EXISTS idx_literature_pmid ON literature_link(pmid);",
    },
];

/// Create schema_migrations table if it doesn't exist
fn ensure_migrations_table(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;
    Ok(())
}

/// Get list of applied migrations
pub fn get_applied_migrations(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name FROM schema_migrations ORDER BY version")?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;
    Ok(names)
}

/// Run all pending migrations
pub fn run_migrations(conn: &mut Connection) -> Result<()> {
    ensure_migrations_table(conn)?;

    let applied = get_applied_migrations(conn)?;

    for migration in MIGRATIONS {
        if applied.iter().any(|name| name == migration.name) {
            log::debug!("Migration {} already applied, skipping", migration.name);
            continue;
        }

        log::info!("Applying migration: {} (version {})", migration.name, migration.version);

        let tx = conn.transaction()?;
        tx.execute_batch(migration.sql)?;
        tx.execute(
            "INSERT INTO schema_migrations (version, name) VALUES (?1, ?2)",
            params![migration.version, migration.name],
        )?;
        tx.commit()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn table_names(conn: &Connection) -> Vec<String> {
        conn.prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get::<_, String>(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()
            .unwrap()
    }

    #[test]
    fn test_full_migration_schema() {
        let temp_dir = TempDir::new().unwrap();
        let mut conn = Connection::open(temp_dir.path().join("test.db")).unwrap();
        run_migrations(&mut conn).unwrap();

        let tables = table_names(&conn);
        for expected in ["edge", "literature_link", "node", "node_degree", "schema_migrations"] {
            assert!(tables.contains(&expected.to_string()), "missing table {}", expected);
        }
    }

    #[test]
    fn test_migrations_are_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let mut conn = Connection::open(temp_dir.path().join("test.db")).unwrap();
        run_migrations(&mut conn).unwrap();
        run_migrations(&mut conn).unwrap();

        let applied = get_applied_migrations(&conn).unwrap();
        assert_eq!(applied, vec!["001_degree_index", "002_literature_links"]);
    }
}
