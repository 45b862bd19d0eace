//! Persistence collaborators for the activation engine.
//!
//! The engine only needs keyed get/set. Two backends are provided: a
//! process-local [`MemoryStore`] and a durable [`SqliteStore`], either of
//! which can be wrapped in a [`RetryingStore`].

pub mod error;
pub mod interface;
pub mod memory;
pub mod retry;
pub mod sqlite;

use std::sync::Arc;

pub use error::StorageError;
pub use interface::{load_json, store_json, Persistence};
pub use memory::MemoryStore;
pub use retry::RetryingStore;
pub use sqlite::SqliteStore;

use crate::config::{RetryConfig, StorageBackend, StorageConfig};

/// Build the configured backend, wrapped with the retry policy.
pub fn open_store(
    storage: &StorageConfig,
    retry: &RetryConfig,
) -> Result<Arc<dyn Persistence>, StorageError> {
    let store: Arc<dyn Persistence> = match storage.backend {
        StorageBackend::Memory => {
            Arc::new(RetryingStore::new(MemoryStore::new(), retry.clone()))
        }
        StorageBackend::Sqlite => {
            let path = storage
                .path
                .clone()
                .ok_or_else(|| StorageError::Backend("sqlite backend requires a path".into()))?;
            log::info!("Opening SQLite store at {}", path);
            Arc::new(RetryingStore::new(SqliteStore::open(path)?, retry.clone()))
        }
    };
    Ok(store)
}
