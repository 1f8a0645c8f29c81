//! Device-local key/value storage
//!
//! A synchronous string store in the shape of a browser's `localStorage`.

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

/// Storage errors
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage file is not a JSON object: {0}")]
    Format(#[from] serde_json::Error),
}

/// Device-local string storage
pub trait LocalStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}
