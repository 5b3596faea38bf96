//! Storage configuration types.
//!
//! Describes which object store holds build metadata and log chunks, so
//! services and tools can pick InMemory, local filesystem or S3 via config
//! files or command-line flags.

use serde::{Deserialize, Serialize};

/// Object store backing the log bucket.
///
/// Defaults to a local `.data` directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum StorageConfig {
    /// In-memory object store (useful for testing and development).
    InMemory,

    /// Local filesystem object store.
    Local(LocalObjectStoreConfig),

    /// AWS S3 object store.
    Aws(AwsObjectStoreConfig),
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig::Local(LocalObjectStoreConfig {
            path: ".data".to_string(),
        })
    }
}

/// AWS S3 object store configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AwsObjectStoreConfig {
    /// AWS region (e.g., "us-west-2").
    pub region: String,

    /// S3 bucket name.
    pub bucket: String,
}

/// Local filesystem object store configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LocalObjectStoreConfig {
    /// Path to the local directory acting as the bucket root.
    pub path: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_default_to_local_data_dir() {
        // given/when
        let config = StorageConfig::default();

        // then
        assert_eq!(
            config,
            StorageConfig::Local(LocalObjectStoreConfig {
                path: ".data".to_string()
            })
        );
    }

    #[test]
    fn should_deserialize_in_memory_config() {
        // given
        let yaml = r#"type: InMemory"#;

        // when
        let config: StorageConfig = serde_yaml::from_str(yaml).unwrap();

        // then
        assert_eq!(config, StorageConfig::InMemory);
    }

    #[test]
    fn should_deserialize_local_config() {
        // given
        let yaml = r#"
type: Local
path: /var/lib/logkeeper
"#;

        // when
        let config: StorageConfig = serde_yaml::from_str(yaml).unwrap();

        // then
        assert_eq!(
            config,
            StorageConfig::Local(LocalObjectStoreConfig {
                path: "/var/lib/logkeeper".to_string()
            })
        );
    }

    #[test]
    fn should_deserialize_aws_config() {
        // given
        let yaml = r#"
type: Aws
region: us-west-2
bucket: build-logs
"#;

        // when
        let config: StorageConfig = serde_yaml::from_str(yaml).unwrap();

        // then
        assert_eq!(
            config,
            StorageConfig::Aws(AwsObjectStoreConfig {
                region: "us-west-2".to_string(),
                bucket: "build-logs".to_string(),
            })
        );
    }

    #[test]
    fn should_serialize_with_type_tag() {
        // given
        let config = StorageConfig::Local(LocalObjectStoreConfig {
            path: "/tmp/logs".to_string(),
        });

        // when
        let yaml = serde_yaml::to_string(&config).unwrap();

        // then
        assert!(yaml.contains("type: Local"));
        assert!(yaml.contains("path: /tmp/logs"));
    }
}
