use std::collections::HashSet;

use anyhow::{Context, Result};
use rusqlite::Connection;

/// One schema step, applied at most once per database.
struct Migration {
    version: &'static str,
    name: &'static str,
    sql: &'static str,
}

/// Ordered by version. Never edit an entry once released; append a new one.
const MIGRATIONS: &[Migration] = &[Migration {
    version: "001",
    name: "cards",
    sql: include_str!("migrations/001_initial.sql"),
}];

/// Bring the schema up to date. Returns how many migrations were applied.
///
/// Each migration and its `schema_migrations` row commit together, so an
/// interrupted run leaves the database at the last complete version.
pub fn run_migrations(conn: &Connection) -> Result<usize> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL
        )",
    )
    .context("Failed to create schema_migrations table")?;

    let pending = pending_migrations(conn)?;
    if pending.is_empty() {
        tracing::debug!("Schema is up to date");
        return Ok(0);
    }

    for migration in &pending {
        apply(conn, migration)?;
    }
    tracing::info!(applied = pending.len(), "Schema migrated");
    Ok(pending.len())
}

fn pending_migrations(conn: &Connection) -> Result<Vec<&'static Migration>> {
    let mut stmt = conn.prepare("SELECT version FROM schema_migrations")?;
    let applied = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<HashSet<_>, _>>()?;

    Ok(MIGRATIONS
        .iter()
        .filter(|m| !applied.contains(m.version))
        .collect())
}

fn apply(conn: &Connection, migration: &Migration) -> Result<()> {
    tracing::info!(version = migration.version, "Applying migration '{}'", migration.name);

    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(migration.sql)
        .and_then(|_| {
            tx.execute(
                "INSERT INTO schema_migrations (version, name, applied_at) VALUES (?, ?, ?)",
                (
                    migration.version,
                    migration.name,
                    chrono::Utc::now().to_rfc3339(),
                ),
            )
        })
        .with_context(|| format!("Migration {} ({}) failed", migration.version, migration.name))?;
    tx.commit()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(conn: &Connection, kind: &str, name: &str) -> i64 {
        conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = ? AND name = ?",
            [kind, name],
            |row| row.get(0),
        )
        .unwrap()
    }

    #[test]
    fn fresh_database_gets_cards_table_and_index() {
        let conn = Connection::open_in_memory().unwrap();

        assert_eq!(run_migrations(&conn).unwrap(), MIGRATIONS.len());

        assert_eq!(count(&conn, "table", "cards"), 1);
        assert_eq!(count(&conn, "index", "idx_cards_bucket_position"), 1);
        assert!(pending_migrations(&conn).unwrap().is_empty());
    }

    #[test]
    fn second_run_applies_nothing() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        assert_eq!(run_migrations(&conn).unwrap(), 0);

        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, MIGRATIONS.len() as i64);
    }

    #[test]
    fn position_column_accepts_null() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        conn.execute(
            "INSERT INTO cards (id, bucket, title, position, created_at, updated_at)
             VALUES ('a', 'todo', 'A', NULL, '', '')",
            [],
        )
        .unwrap();
    }
}
