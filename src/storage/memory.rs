use super::{check_quota, slot_size, Storage, StorageError};
use crate::config;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;

/// Storage kept in memory for the lifetime of the process.
#[derive(Debug)]
pub struct MemoryStorage {
    items: RefCell<HashMap<String, String>>,
    quota: usize,
    writes: Cell<usize>,
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::with_quota(config::STORAGE_QUOTA_BYTES)
    }
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota: usize) -> Self {
        Self {
            items: RefCell::new(HashMap::new()),
            quota,
            writes: Cell::new(0),
        }
    }

    /// Number of successful `set_item` calls
    pub fn write_count(&self) -> usize {
        self.writes.get()
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.items.borrow().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        check_quota(self, key, value)?;
        self.items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.items.borrow_mut().remove(key);
        Ok(())
    }

    fn used_bytes(&self, excluding: Option<&str>) -> Result<usize, StorageError> {
        Ok(self
            .items
            .borrow()
            .iter()
            .filter(|(key, _)| Some(key.as_str()) != excluding)
            .map(|(key, value)| slot_size(key, value))
            .sum())
    }

    fn quota(&self) -> usize {
        self.quota
    }
}
