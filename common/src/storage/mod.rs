//! Object store plumbing shared by the logkeeper crates.
//!
//! - [`config`]: serde-friendly description of the backing object store.
//! - [`factory`]: builds an `ObjectStore` from that description.

pub mod config;
pub mod factory;

/// Errors raised while constructing or talking to the backing store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// The store could not be created or reached.
    Storage(String),
}

impl std::error::Error for StorageError {}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Storage(msg) => write!(f, "storage error: {}", msg),
        }
    }
}

/// Result type for storage construction and access.
pub type StorageResult<T> = std::result::Result<T, StorageError>;
