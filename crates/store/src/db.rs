use std::fs;
use std::path::Path;

use rusqlite::{params, Connection};

use crate::error::StoreError;

const MIGRATION_V1_SQL: &str = r#"
CREATE TABLE documents (
    path        TEXT PRIMARY KEY,
    parent      TEXT NOT NULL,
    name        TEXT NOT NULL,
    body        TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

CREATE INDEX documents_parent_idx
    ON documents (parent, name);
"#;

const MIGRATIONS: &[(i64, &str)] = &[(1, MIGRATION_V1_SQL)];

pub const LATEST_SCHEMA_VERSION: i64 = 1;

/// Open (creating if needed) the store database and bring its schema up to
/// date.
pub fn open(path: impl AsRef<Path>) -> Result<Connection, StoreError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|source| StoreError::Io { path: parent.display().to_string(), source })?;
    }

    let mut conn = Connection::open(path).map_err(StoreError::sqlite("open store database"))?;
    conn.execute_batch(
        "
        PRAGMA foreign_keys = ON;
        PRAGMA journal_mode = WAL;
        ",
    )
    .map_err(StoreError::sqlite("configure sqlite pragmas"))?;

    migrate(&mut conn)?;
    Ok(conn)
}

/// In-memory database with the full schema, for tests and dry runs.
pub fn open_in_memory() -> Result<Connection, StoreError> {
    let mut conn =
        Connection::open_in_memory().map_err(StoreError::sqlite("open in-memory database"))?;
    migrate(&mut conn)?;
    Ok(conn)
}

pub fn schema_version(conn: &Connection) -> Result<i64, StoreError> {
    conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_migrations", [], |row| row.get(0))
        .map_err(StoreError::sqlite("read current schema version"))
}

fn migrate(conn: &mut Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS schema_migrations (
            version     INTEGER PRIMARY KEY,
            applied_at  TEXT NOT NULL
        );
        ",
    )
    .map_err(StoreError::sqlite("ensure schema_migrations table exists"))?;

    let mut current_version = schema_version(conn)?;

    for (version, sql) in MIGRATIONS {
        if *version <= current_version {
            continue;
        }

        let tx = conn.transaction().map_err(StoreError::sqlite("start migration transaction"))?;
        tx.execute_batch(sql).map_err(StoreError::sqlite("apply store migration"))?;
        tx.execute(
            "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, datetime('now'))",
            params![version],
        )
        .map_err(StoreError::sqlite("record store migration"))?;
        tx.commit().map_err(StoreError::sqlite("commit store migration"))?;

        tracing::debug!(version, "applied store migration");
        current_version = *version;
    }

    Ok(())
}
