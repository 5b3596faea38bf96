//! Core data types for log retrieval.
//!
//! Builds and tests are the metadata records a download is keyed by; chunks
//! are the stored runs of lines the merge reads; log lines are what callers
//! receive.

use serde::{Deserialize, Serialize};

/// Ordering key of a log line.
///
/// Assigned at storage time, in nanoseconds on the build's timeline. Global
/// and test lines share this domain, which is what makes them mergeable.
pub type Timestamp = u64;

/// One CI job execution, owning a global log and zero or more tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Build {
    /// Unique build identifier.
    pub id: String,
    /// Logical job or builder name.
    pub builder: String,
    /// Numeric build sequence for the builder.
    pub build_num: i64,
    /// CI task information.
    #[serde(default)]
    pub info: BuildInfo,
}

/// CI task information attached to a build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildInfo {
    /// Owning CI task reference.
    #[serde(default)]
    pub task_id: String,
}

/// One test execution within a build.
///
/// # Active Interval
///
/// A test does not store its end. It is considered running from `start` until
/// the next test of the same build starts; see
/// [`LogKeeper::test_interval`](crate::LogKeeper::test_interval).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Test {
    /// Unique test identifier within the build.
    pub id: String,
    /// The owning build.
    pub build_id: String,
    /// Test name.
    pub name: String,
    /// CI task information.
    #[serde(default)]
    pub info: TestInfo,
    #[serde(default)]
    pub phase: String,
    #[serde(default)]
    pub command: String,
    /// Start marker of the test on the build's timeline.
    pub start: Timestamp,
}

/// CI task information attached to a test.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestInfo {
    /// Owning CI task reference.
    #[serde(default)]
    pub task_id: String,
}

/// A single line of log output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    /// The ordering key of the line.
    pub timestamp: Timestamp,
    /// Raw line text, without a trailing newline.
    pub data: String,
}

impl LogLine {
    /// Creates a new log line.
    pub fn new(timestamp: Timestamp, data: impl Into<String>) -> Self {
        Self {
            timestamp,
            data: data.into(),
        }
    }
}

/// A stored, ordered run of log lines of one stream.
///
/// Chunks of the global stream have no `test_id`. The key range is inclusive
/// on both ends: `start` is the first line's key and `end` the last one's.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// The owning build.
    pub build_id: String,
    /// The owning test, or `None` for global chunks.
    pub test_id: Option<String>,
    /// Key of the first line.
    pub start: Timestamp,
    /// Key of the last line.
    pub end: Timestamp,
    /// Number of lines stored in the chunk.
    pub num_lines: u64,
}

impl Chunk {
    /// Returns true if the chunk's key range intersects `range` (half-open).
    pub fn overlaps(&self, range: &std::ops::Range<Timestamp>) -> bool {
        !range.is_empty() && self.start < range.end && self.end >= range.start
    }

    /// Returns true if `timestamp` lies within the chunk's declared key range.
    pub fn contains(&self, timestamp: Timestamp) -> bool {
        self.start <= timestamp && timestamp <= self.end
    }
}

/// Which stream of a build a chunk listing targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkScope {
    /// The build-wide global log.
    Global { build_id: String },
    /// The log owned by one test of the build.
    Test { build_id: String, test_id: String },
}

impl ChunkScope {
    pub fn global(build_id: impl Into<String>) -> Self {
        ChunkScope::Global {
            build_id: build_id.into(),
        }
    }

    pub fn test(build_id: impl Into<String>, test_id: impl Into<String>) -> Self {
        ChunkScope::Test {
            build_id: build_id.into(),
            test_id: test_id.into(),
        }
    }

    /// Returns the build this scope belongs to.
    pub fn build_id(&self) -> &str {
        match self {
            ChunkScope::Global { build_id } => build_id,
            ChunkScope::Test { build_id, .. } => build_id,
        }
    }

    /// Returns the test this scope belongs to, if any.
    pub fn test_id(&self) -> Option<&str> {
        match self {
            ChunkScope::Global { .. } => None,
            ChunkScope::Test { test_id, .. } => Some(test_id),
        }
    }
}
