pub mod items;
pub mod profiles;
pub mod progress;
pub mod schema;

use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::domain::{ItemFilter, ItemId, LearnableItem, ProgressFilter, ProgressRecord, Tier, UserId};
use crate::error::{CoreError, Result};
use crate::store::{ContentStore, LocalStorage, ProfileStore, ProgressStore};

// Re-export all public items from submodules
pub use items::*;
pub use profiles::*;
pub use progress::*;
pub use schema::run_migrations;

pub type DbPool = Arc<Mutex<Connection>>;

/// Extension trait for logging errors before discarding them
pub trait LogOnError<T> {
    /// Log the error at warn level and return None
    fn log_warn(self, context: &str) -> Option<T>;
    /// Log the error at warn level and return the default
    fn log_warn_default(self, context: &str) -> T
    where
        T: Default;
}

impl<T, E: std::fmt::Display> LogOnError<T> for std::result::Result<T, E> {
    fn log_warn(self, context: &str) -> Option<T> {
        match self {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!("{}: {}", context, e);
                None
            }
        }
    }

    fn log_warn_default(self, context: &str) -> T
    where
        T: Default,
    {
        match self {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!("{}: {}", context, e);
                T::default()
            }
        }
    }
}

/// Try to acquire the database lock, returning an error if poisoned
pub fn try_lock(pool: &DbPool) -> Result<MutexGuard<'_, Connection>> {
    pool.lock().map_err(|_: PoisonError<_>| {
        tracing::error!("Database mutex poisoned - a thread panicked while holding the lock");
        CoreError::StorageUnavailable("database unavailable".into())
    })
}

pub fn init_db(path: &Path) -> Result<DbPool> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok();
    }

    // Create backup before migrations if database exists
    if path.exists() {
        let backup_path = path.with_extension("db.backup");
        if let Err(e) = std::fs::copy(path, &backup_path) {
            tracing::warn!("Could not create database backup: {}", e);
        }
    }

    let conn = Connection::open(path)?;
    run_migrations(&conn)?;
    Ok(Arc::new(Mutex::new(conn)))
}

/// SQLite-backed implementation of every storage collaborator
#[derive(Clone)]
pub struct SqliteStore {
    pool: DbPool,
}

impl SqliteStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self::new(init_db(path)?))
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        run_migrations(&conn)?;
        Ok(Self::new(Arc::new(Mutex::new(conn))))
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub fn insert_items(&self, items: &[LearnableItem]) -> Result<()> {
        let conn = try_lock(&self.pool)?;
        for item in items {
            upsert_item(&conn, item)?;
        }
        Ok(())
    }

    pub fn record_earned_badges(&self, user: &UserId, keys: &[&str]) -> Result<Vec<String>> {
        let conn = try_lock(&self.pool)?;
        Ok(profiles::record_earned_badges(&conn, user, keys)?)
    }
}

impl ContentStore for SqliteStore {
    fn fetch_items(&self, filter: &ItemFilter) -> Result<Vec<LearnableItem>> {
        let conn = try_lock(&self.pool)?;
        Ok(get_items(&conn, filter)?)
    }

    fn fetch_items_by_ids(&self, ids: &[ItemId]) -> Result<Vec<LearnableItem>> {
        let conn = try_lock(&self.pool)?;
        Ok(get_items_by_ids(&conn, ids)?)
    }
}

impl ProgressStore for SqliteStore {
    fn get_progress(&self, user: &UserId, item: ItemId) -> Result<Option<ProgressRecord>> {
        let conn = try_lock(&self.pool)?;
        Ok(progress::get_progress(&conn, user, item)?)
    }

    fn upsert_progress(&self, record: &ProgressRecord) -> Result<()> {
        let conn = try_lock(&self.pool)?;
        Ok(progress::upsert_progress(&conn, record)?)
    }

    fn list_progress(&self, user: &UserId, filter: ProgressFilter) -> Result<Vec<ProgressRecord>> {
        let conn = try_lock(&self.pool)?;
        Ok(progress::list_progress(&conn, user, filter)?)
    }
}

impl ProfileStore for SqliteStore {
    fn set_determined_level(&self, user: &UserId, level: Tier) -> Result<()> {
        let conn = try_lock(&self.pool)?;
        Ok(profiles::set_determined_level(&conn, user, level)?)
    }

    fn get_determined_level(&self, user: &UserId) -> Result<Option<Tier>> {
        let conn = try_lock(&self.pool)?;
        Ok(profiles::get_determined_level(&conn, user)?)
    }
}

impl LocalStorage for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = try_lock(&self.pool)?;
        Ok(get_local(&conn, key)?)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let conn = try_lock(&self.pool)?;
        Ok(set_local(&conn, key, value)?)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let conn = try_lock(&self.pool)?;
        Ok(remove_local(&conn, key)?)
    }
}
