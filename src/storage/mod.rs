//! Key/value storage for persisted state.
//!
//! Mirrors the semantics of browser local storage: string slots under string
//! keys with a shared size quota. Writes that would push the total past the
//! quota fail with [`StorageError::QuotaExceeded`] and leave existing data
//! untouched.

mod memory;
mod sqlite;

pub use memory::MemoryStorage;
pub use sqlite::SqliteStorage;

use crate::config;

pub trait Storage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, enforcing the quota.
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove_item(&self, key: &str) -> Result<(), StorageError>;

    /// Bytes used by all keys and values, optionally ignoring one slot.
    fn used_bytes(&self, excluding: Option<&str>) -> Result<usize, StorageError>;

    fn quota(&self) -> usize {
        config::STORAGE_QUOTA_BYTES
    }
}

/// Size a slot is accounted at
pub fn slot_size(key: &str, value: &str) -> usize {
    key.len() + value.len()
}

/// Fail with `QuotaExceeded` if writing `value` under `key` would exceed the quota.
pub fn check_quota<S: Storage + ?Sized>(storage: &S, key: &str, value: &str) -> Result<(), StorageError> {
    let required = storage.used_bytes(Some(key))? + slot_size(key, value);
    let limit = storage.quota();
    if required > limit {
        log::error!(
            "Insufficient storage space: {} bytes needed, limit is {}",
            required,
            limit
        );
        return Err(StorageError::QuotaExceeded { required, limit });
    }
    Ok(())
}

/// Errors raised by storage operations
#[derive(Debug)]
pub enum StorageError {
    /// The write would exceed the storage quota
    QuotaExceeded { required: usize, limit: usize },
    Database(rusqlite::Error),
    Serialize(serde_json::Error),
    Io(std::io::Error),
}

impl StorageError {
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, StorageError::QuotaExceeded { .. })
    }
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::QuotaExceeded { required, limit } => write!(
                f,
                "Storage quota exceeded: {} bytes needed, limit is {}",
                required, limit
            ),
            StorageError::Database(e) => write!(f, "Database error: {}", e),
            StorageError::Serialize(e) => write!(f, "Serialization error: {}", e),
            StorageError::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<rusqlite::Error> for StorageError {
    fn from(e: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(err, _) = &e {
            if err.code == rusqlite::ErrorCode::DiskFull {
                return StorageError::QuotaExceeded {
                    required: 0,
                    limit: config::STORAGE_QUOTA_BYTES,
                };
            }
        }
        StorageError::Database(e)
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::Serialize(e)
    }
}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        StorageError::Io(e)
    }
}
