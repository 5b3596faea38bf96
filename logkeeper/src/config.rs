//! Configuration options for log retrieval.
//!
//! This module defines the configuration used to open a
//! [`LogKeeper`](crate::LogKeeper) and the per-download options.

use std::path::Path;

use common::StorageConfig;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};

/// Configuration for opening a [`LogKeeper`](crate::LogKeeper).
///
/// # Example
///
/// ```yaml
/// storage:
///   type: Aws
///   region: us-east-1
///   bucket: build-logs
/// prefetch: false
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Object store holding build metadata and log chunks.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Whether stream cursors fetch their next chunk in the background while
    /// the current one is being read.
    ///
    /// Trades at most one extra chunk buffer per source for lower latency at
    /// chunk boundaries. Defaults to `true`.
    #[serde(default = "default_prefetch")]
    pub prefetch: bool,
}

fn default_prefetch() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            prefetch: default_prefetch(),
        }
    }
}

impl Config {
    /// Loads a configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::InvalidInput(format!("{}: {}", path.display(), e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| Error::InvalidInput(format!("{}: {}", path.display(), e)))
    }
}

/// Options for [`LogKeeper::download_log_lines_with_options`](crate::LogKeeper::download_log_lines_with_options).
#[derive(Debug, Clone, Default)]
pub struct DownloadOptions {
    /// Token that aborts the download when cancelled.
    ///
    /// Once cancelled, the next pull returns [`Error::Cancelled`]. Lines
    /// already returned stay valid.
    pub cancellation: Option<CancellationToken>,
}
