//! Key-value persistence for the funnel session
//!
//! The session survives restarts through a small string-keyed store. Every
//! access is fail-open: callers log storage errors and carry on with default
//! state rather than blocking the funnel.

pub mod file_store;
pub mod memory_store;
pub mod persisted;

use crate::error::StorageError;

pub use file_store::FileStore;
pub use memory_store::MemoryStore;
pub use persisted::{clear_persisted, keys, load_persisted, PersistedData};

/// String-keyed, string-valued store
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove_many(&self, keys: &[&str]) -> Result<(), StorageError>;
}
