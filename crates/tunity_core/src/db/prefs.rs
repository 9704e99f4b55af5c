//! Namespaced string preferences backed by SQLite.
//!
//! # Responsibility
//! - Provide a small key-value contract (the local preferences store).
//! - Serialize access to one connection so callbacks from any thread can
//!   write safely.
//!
//! # Invariants
//! - Keys are scoped by namespace; two namespaces never see each other's keys.
//! - `put_string` overwrites the previous value wholesale.

use super::{DbError, DbResult};
use log::debug;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Mutex, MutexGuard};

/// Key-value contract for small string blobs.
pub trait KeyValueStore: Send + Sync {
    fn get_string(&self, key: &str) -> DbResult<Option<String>>;
    fn put_string(&self, key: &str, value: &str) -> DbResult<()>;
    fn contains(&self, key: &str) -> DbResult<bool>;
    fn remove(&self, key: &str) -> DbResult<()>;
}

/// SQLite-backed preferences scoped to one namespace.
pub struct SqlitePreferences {
    conn: Mutex<Connection>,
    namespace: String,
}

impl SqlitePreferences {
    /// Wraps a migrated connection (see `open_db`).
    pub fn new(conn: Connection, namespace: impl Into<String>) -> Self {
        Self {
            conn: Mutex::new(conn),
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        self.namespace.as_str()
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| DbError::LockPoisoned)
    }
}

impl KeyValueStore for SqlitePreferences {
    fn get_string(&self, key: &str) -> DbResult<Option<String>> {
        let conn = self.lock()?;
        let value = conn
            .query_row(
                "SELECT value FROM preferences WHERE namespace = ?1 AND key = ?2;",
                params![self.namespace, key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn put_string(&self, key: &str, value: &str) -> DbResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO preferences (namespace, key, value)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(namespace, key) DO UPDATE SET
                value = excluded.value,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![self.namespace, key, value],
        )?;
        debug!(
            "event=prefs_put module=db status=ok namespace={} key={} bytes={}",
            self.namespace,
            key,
            value.len()
        );
        Ok(())
    }

    fn contains(&self, key: &str) -> DbResult<bool> {
        let conn = self.lock()?;
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM preferences WHERE namespace = ?1 AND key = ?2);",
            params![self.namespace, key],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn remove(&self, key: &str) -> DbResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "DELETE FROM preferences WHERE namespace = ?1 AND key = ?2;",
            params![self.namespace, key],
        )?;
        Ok(())
    }
}
