//! Logkeeper - merged retrieval of CI build and test logs.
//!
//! A build owns a global log and any number of tests, each with its own log.
//! Both kinds of log are stored as runs of timestamped lines ("chunks") in an
//! object store. This crate reconstructs one chronologically ordered stream
//! from them without loading the whole log into memory.
//!
//! # Architecture
//!
//! - **Storage** ([`MetadataLookup`], [`ChunkStore`], [`BucketStorage`]):
//!   resolves builds and tests and lists and fetches chunks.
//! - **Chunk index** ([`ChunkIndex`]): orders a stream's chunks and selects
//!   the global chunks overlapping a test's active interval.
//! - **Merge**: one lazy cursor per source, combined by a k-way merge keyed by
//!   timestamp, with test lines winning ties over global lines.
//! - **Retrieval** ([`LogKeeper`]): the caller-facing lookups and downloads.
//!
//! # Active Interval
//!
//! A test runs from its start marker until the next test of the build starts.
//! A single-test download includes the global lines of that interval, so the
//! reader sees what the build printed around the test.
//!
//! # Example
//!
//! ```ignore
//! use logkeeper::{Config, LogKeeper};
//!
//! let keeper = LogKeeper::open(Config::default()).await?;
//! let test = keeper.find_test_by_id("build-1", "test-7").await?;
//!
//! let mut lines = keeper.download_log_lines(&test.build_id, &test.id).await?;
//! while let Some(line) = lines.next().await? {
//!     println!("{} {}", line.timestamp, line.data);
//! }
//! ```

mod codec;
mod config;
mod cursor;
mod error;
mod index;
mod merge;
mod model;
mod range;
mod retrieval;
mod storage;

pub use codec::{build_metadata_path, chunk_path, encode_lines, test_metadata_path};
pub use config::{Config, DownloadOptions};
pub use error::{Error, Result};
pub use index::ChunkIndex;
pub use model::{Build, BuildInfo, Chunk, ChunkScope, LogLine, Test, TestInfo, Timestamp};
pub use retrieval::{LogKeeper, LogLineIterator};
pub use storage::{BucketStorage, ChunkLines, ChunkStore, MetadataLookup};
