//! Key-value persistence behind the quiz cache.
//!
//! The cache never touches the filesystem directly; it talks to a
//! `KeyValueStore`, so tests can swap in `MemoryStore` while the application
//! uses the directory-backed `FileStore`.

mod file;
mod memory;

use thiserror::Error;

pub use file::FileStore;
pub use memory::MemoryStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage quota exceeded: {needed} bytes needed, {available} available")]
    QuotaExceeded { needed: usize, available: usize },

    #[error("Storage lock poisoned")]
    Poisoned,
}

/// String key-value storage with prefix scans.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Insert or overwrite a value.
    fn put(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove a key. Removing a missing key is not an error.
    fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// All keys starting with `prefix`.
    fn scan(&self, prefix: &str) -> Result<Vec<String>, StoreError>;
}
