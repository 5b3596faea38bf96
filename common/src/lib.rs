pub mod storage;

pub use storage::config::StorageConfig;
pub use storage::factory::create_object_store;
pub use storage::{StorageError, StorageResult};
