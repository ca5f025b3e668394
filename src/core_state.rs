//! Application state shared by every command.
//!
//! `CoreState` knows where the database lives and which notifier shows
//! reminders. Each command opens its own store, so there is no
//! long-lived connection to guard.

use std::path::PathBuf;
use std::sync::Arc;

use crate::config;
use crate::db;
use crate::notifications::dispatch::ConsoleNotifier;
use crate::notifications::Notifier;
use crate::store::SqliteStore;

pub struct CoreState {
    /// SQLite file holding the key-value store.
    pub db_path: PathBuf,
    notifier: Arc<dyn Notifier>,
}

impl CoreState {
    /// State for the configured data directory, printing reminders to
    /// the terminal.
    pub fn new() -> Self {
        Self::with_path(config::database_path())
    }

    pub fn with_path(db_path: PathBuf) -> Self {
        Self {
            db_path,
            notifier: Arc::new(ConsoleNotifier),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Open the store, creating and migrating the database if needed.
    pub fn open_store(&self) -> Result<SqliteStore, CoreError> {
        SqliteStore::open(&self.db_path).map_err(CoreError::Database)
    }

    pub fn notifier(&self) -> Arc<dyn Notifier> {
        Arc::clone(&self.notifier)
    }
}

impl Default for CoreState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Database error: {0}")]
    Database(#[from] db::DatabaseError),
}
