//! Object store factory.
//!
//! Creates the object store described by a [`StorageConfig`], supporting
//! in-memory, local filesystem and S3 backends.

use std::sync::Arc;

use object_store::ObjectStore;
use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;

use super::config::StorageConfig;
use super::{StorageError, StorageResult};

/// Creates an object store instance based on the provided configuration.
///
/// # Examples
///
/// ```rust,ignore
/// use common::{StorageConfig, create_object_store};
///
/// let store = create_object_store(&StorageConfig::InMemory)?;
/// ```
pub fn create_object_store(config: &StorageConfig) -> StorageResult<Arc<dyn ObjectStore>> {
    match config {
        StorageConfig::InMemory => Ok(Arc::new(InMemory::new())),
        StorageConfig::Local(local_config) => {
            // Create the directory if it doesn't exist
            std::fs::create_dir_all(&local_config.path).map_err(|e| {
                StorageError::Storage(format!(
                    "Failed to create storage directory '{}': {}",
                    local_config.path, e
                ))
            })?;
            let store = LocalFileSystem::new_with_prefix(&local_config.path).map_err(|e| {
                StorageError::Storage(format!("Failed to create local filesystem store: {}", e))
            })?;
            tracing::debug!(path = %local_config.path, "opened local object store");
            Ok(Arc::new(store))
        }
        StorageConfig::Aws(aws_config) => {
            let store = AmazonS3Builder::from_env()
                .with_region(&aws_config.region)
                .with_bucket_name(&aws_config.bucket)
                .build()
                .map_err(|e| {
                    StorageError::Storage(format!("Failed to create AWS S3 store: {}", e))
                })?;
            tracing::debug!(
                bucket = %aws_config.bucket,
                region = %aws_config.region,
                "opened S3 object store"
            );
            Ok(Arc::new(store))
        }
    }
}
