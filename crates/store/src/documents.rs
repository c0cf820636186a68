// Key/value document store: JSON documents addressed by `/`-separated paths.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;

use crate::db;
use crate::error::StoreError;
use crate::paths::split_parent;

/// Minimal document contract the persistence gateway relies on.
pub trait DocumentStore: Send + Sync {
    fn get(&self, path: &str) -> Result<Option<Value>, StoreError>;

    /// Create or replace the document at `path`.
    fn put(&self, path: &str, document: &Value) -> Result<(), StoreError>;

    /// Returns whether a document was removed.
    fn delete(&self, path: &str) -> Result<bool, StoreError>;

    /// Names of the documents directly under `prefix`, sorted.
    fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError>;
}

/// SQLite-backed store. One row per document.
#[derive(Debug)]
pub struct SqliteDocumentStore {
    conn: Mutex<Connection>,
}

impl SqliteDocumentStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        Ok(Self { conn: Mutex::new(db::open(path)?) })
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Ok(Self { conn: Mutex::new(db::open_in_memory()?) })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl DocumentStore for SqliteDocumentStore {
    fn get(&self, path: &str) -> Result<Option<Value>, StoreError> {
        let conn = self.conn()?;
        let body: Option<String> = conn
            .query_row("SELECT body FROM documents WHERE path = ?1", params![path], |row| {
                row.get(0)
            })
            .optional()
            .map_err(StoreError::sqlite("read document"))?;

        body.map(|body| {
            serde_json::from_str(&body)
                .map_err(|source| StoreError::Decode { path: path.to_string(), source })
        })
        .transpose()
    }

    fn put(&self, path: &str, document: &Value) -> Result<(), StoreError> {
        let (parent, name) = split_parent(path);
        let body = document.to_string();

        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(StoreError::sqlite("start write transaction"))?;
        tx.execute(
            "INSERT INTO documents (path, parent, name, body, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5) \
             ON CONFLICT(path) DO UPDATE \
             SET body = excluded.body, updated_at = excluded.updated_at",
            params![path, parent, name, body, Utc::now().to_rfc3339()],
        )
        .map_err(StoreError::sqlite("write document"))?;
        tx.commit().map_err(StoreError::sqlite("commit document write"))?;

        tracing::debug!(path, bytes = body.len(), "stored document");
        Ok(())
    }

    fn delete(&self, path: &str) -> Result<bool, StoreError> {
        let conn = self.conn()?;
        let removed = conn
            .execute("DELETE FROM documents WHERE path = ?1", params![path])
            .map_err(StoreError::sqlite("delete document"))?;
        Ok(removed > 0)
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT name FROM documents WHERE parent = ?1 ORDER BY name")
            .map_err(StoreError::sqlite("prepare document listing"))?;
        let names = stmt
            .query_map(params![prefix.trim_end_matches('/')], |row| row.get(0))
            .map_err(StoreError::sqlite("list documents"))?
            .collect::<Result<Vec<String>, _>>()
            .map_err(StoreError::sqlite("read document listing"))?;
        Ok(names)
    }
}

/// Process-local store. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    documents: Mutex<BTreeMap<String, Value>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn documents(&self) -> Result<MutexGuard<'_, BTreeMap<String, Value>>, StoreError> {
        self.documents.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn get(&self, path: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.documents()?.get(path).cloned())
    }

    fn put(&self, path: &str, document: &Value) -> Result<(), StoreError> {
        self.documents()?.insert(path.to_string(), document.clone());
        Ok(())
    }

    fn delete(&self, path: &str) -> Result<bool, StoreError> {
        Ok(self.documents()?.remove(path).is_some())
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let prefix = prefix.trim_end_matches('/');
        Ok(self
            .documents()?
            .keys()
            .filter_map(|path| {
                let (parent, name) = split_parent(path);
                (parent == prefix).then(|| name.to_string())
            })
            .collect())
    }
}
