//! Command-line arguments for the logkeeper binary.

use clap::{Parser, Subcommand};
use common::StorageConfig;
use common::storage::config::{AwsObjectStoreConfig, LocalObjectStoreConfig};

use logkeeper::{Config, Result};

/// CLI arguments for the logkeeper binary.
#[derive(Debug, Parser)]
#[command(name = "logkeeper")]
#[command(about = "Look up CI builds and tests and download their merged logs")]
pub struct CliArgs {
    /// YAML configuration file. Storage flags override its storage section.
    #[arg(long)]
    pub config: Option<String>,

    /// Storage data directory path (for local storage).
    #[arg(long, default_value = ".data")]
    pub data_dir: String,

    /// Use in-memory storage (for testing).
    #[arg(long, default_value = "false")]
    pub in_memory: bool,

    /// S3 bucket name (enables S3 storage when set).
    #[arg(long)]
    pub s3_bucket: Option<String>,

    /// AWS region for S3 storage.
    #[arg(long, default_value = "us-east-1")]
    pub s3_region: String,

    /// Disable background fetching of the next chunk.
    #[arg(long, default_value = "false")]
    pub no_prefetch: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print a build as JSON.
    Build { build_id: String },

    /// Print a test as JSON.
    Test { build_id: String, test_id: String },

    /// Print the tests of a build as JSON, ordered by start.
    Tests { build_id: String },

    /// Print the merged log of a build, or of one test when given.
    Download {
        build_id: String,
        test_id: Option<String>,
    },
}

impl CliArgs {
    /// Builds the keeper configuration from the config file and flags.
    pub fn to_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_yaml_file(path)?,
            None => Config {
                storage: self.storage(),
                ..Default::default()
            },
        };
        if self.config.is_some() && self.storage_flags_set() {
            config.storage = self.storage();
        }
        if self.no_prefetch {
            config.prefetch = false;
        }
        Ok(config)
    }

    fn storage_flags_set(&self) -> bool {
        self.in_memory || self.s3_bucket.is_some() || self.data_dir != ".data"
    }

    fn storage(&self) -> StorageConfig {
        if self.in_memory {
            StorageConfig::InMemory
        } else if let Some(bucket) = &self.s3_bucket {
            StorageConfig::Aws(AwsObjectStoreConfig {
                region: self.s3_region.clone(),
                bucket: bucket.clone(),
            })
        } else {
            StorageConfig::Local(LocalObjectStoreConfig {
                path: self.data_dir.clone(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn args(extra: &[&str]) -> CliArgs {
        let mut argv = vec!["logkeeper"];
        argv.extend_from_slice(extra);
        CliArgs::try_parse_from(argv).unwrap()
    }

    #[test]
    fn should_create_in_memory_config() {
        // given
        let args = args(&["--in-memory", "build", "b1"]);

        // when
        let config = args.to_config().unwrap();

        // then
        assert_eq!(config.storage, StorageConfig::InMemory);
        assert!(config.prefetch);
    }

    #[test]
    fn should_create_local_config() {
        // given
        let args = args(&["--data-dir", "/tmp/logs", "tests", "b1"]);

        // when
        let config = args.to_config().unwrap();

        // then
        assert_eq!(
            config.storage,
            StorageConfig::Local(LocalObjectStoreConfig {
                path: "/tmp/logs".to_string()
            })
        );
    }

    #[test]
    fn should_create_s3_config() {
        // given
        let args = args(&[
            "--s3-bucket",
            "build-logs",
            "--s3-region",
            "eu-west-1",
            "--no-prefetch",
            "download",
            "b1",
        ]);

        // when
        let config = args.to_config().unwrap();

        // then
        assert_eq!(
            config.storage,
            StorageConfig::Aws(AwsObjectStoreConfig {
                region: "eu-west-1".to_string(),
                bucket: "build-logs".to_string(),
            })
        );
        assert!(!config.prefetch);
    }

    #[test]
    fn should_parse_download_with_optional_test() {
        let whole = args(&["download", "b1"]);
        let single = args(&["download", "b1", "t1"]);

        assert!(matches!(
            whole.command,
            Command::Download { ref test_id, .. } if test_id.is_none()
        ));
        assert!(matches!(
            single.command,
            Command::Download { ref test_id, .. } if test_id.as_deref() == Some("t1")
        ));
    }

    #[test]
    fn should_let_flags_override_config_file_storage() {
        // given
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "storage:\n  type: Local\n  path: /srv/logs\nprefetch: true").unwrap();
        let path = file.path().to_str().unwrap().to_string();

        // when
        let from_file = args(&["--config", &path, "build", "b1"]).to_config().unwrap();
        let overridden = args(&["--config", &path, "--in-memory", "build", "b1"])
            .to_config()
            .unwrap();

        // then
        assert_eq!(
            from_file.storage,
            StorageConfig::Local(LocalObjectStoreConfig {
                path: "/srv/logs".to_string()
            })
        );
        assert_eq!(overridden.storage, StorageConfig::InMemory);
    }
}
