use super::{check_quota, Storage, StorageError};
use crate::config;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// SQLite-backed storage in the user's data directory
pub struct SqliteStorage {
    conn: Connection,
    quota: usize,
}

impl std::fmt::Debug for SqliteStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStorage")
            .field("quota", &self.quota)
            .finish_non_exhaustive()
    }
}

impl SqliteStorage {
    /// Create or open the storage database at `db_path`
    pub fn open(db_path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(db_path)?;
        let storage = Self::with_connection(conn)?;
        log::info!("Storage database opened at {:?}", db_path);
        Ok(storage)
    }

    /// Storage that disappears with the process
    pub fn open_in_memory() -> Result<Self, StorageError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StorageError> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS items (
                key TEXT PRIMARY KEY NOT NULL,
                value TEXT NOT NULL
            );
            ",
        )?;

        Ok(Self {
            conn,
            quota: config::STORAGE_QUOTA_BYTES,
        })
    }

    pub fn with_quota(mut self, quota: usize) -> Self {
        self.quota = quota;
        self
    }
}

impl Storage for SqliteStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM items WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        check_quota(self, key, value)?;
        self.conn.execute(
            "INSERT INTO items (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = ?2",
            params![key, value],
        )?;
        log::debug!("Stored {} ({} bytes)", key, value.len());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.conn
            .execute("DELETE FROM items WHERE key = ?1", params![key])?;
        Ok(())
    }

    fn used_bytes(&self, excluding: Option<&str>) -> Result<usize, StorageError> {
        let used: i64 = self.conn.query_row(
            "SELECT COALESCE(SUM(LENGTH(CAST(key AS BLOB)) + LENGTH(CAST(value AS BLOB))), 0)
             FROM items WHERE ?1 IS NULL OR key != ?1",
            params![excluding],
            |row| row.get(0),
        )?;
        Ok(used.max(0) as usize)
    }

    fn quota(&self) -> usize {
        self.quota
    }
}
