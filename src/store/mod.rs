//! Collaborator interfaces the practice engine talks through.
//!
//! The hosted backend, local device storage and entitlement service sit
//! behind these traits. `crate::db::SqliteStore` implements the storage
//! traits; `MemoryStorage` is an in-process `LocalStorage`.

mod memory;

pub use memory::MemoryStorage;

use crate::domain::{ItemFilter, ItemId, LearnableItem, ProgressFilter, ProgressRecord, Tier, UserId};
use crate::error::Result;

/// Read access to the content catalog
pub trait ContentStore {
    fn fetch_items(&self, filter: &ItemFilter) -> Result<Vec<LearnableItem>>;
    fn fetch_items_by_ids(&self, ids: &[ItemId]) -> Result<Vec<LearnableItem>>;
}

/// Per-user progress records
pub trait ProgressStore {
    fn get_progress(&self, user: &UserId, item: ItemId) -> Result<Option<ProgressRecord>>;
    fn upsert_progress(&self, record: &ProgressRecord) -> Result<()>;
    fn list_progress(&self, user: &UserId, filter: ProgressFilter) -> Result<Vec<ProgressRecord>>;
}

/// User profile fields owned by the practice engine
pub trait ProfileStore {
    fn set_determined_level(&self, user: &UserId, level: Tier) -> Result<()>;
    fn get_determined_level(&self, user: &UserId) -> Result<Option<Tier>>;
}

/// Per-installation key/value storage
pub trait LocalStorage {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

impl<T: LocalStorage + ?Sized> LocalStorage for std::sync::Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}
