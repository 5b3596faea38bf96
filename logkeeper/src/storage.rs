//! Storage contracts consumed by the retrieval core, and their object-store
//! implementation.
//!
//! - [`MetadataLookup`]: resolves builds and tests.
//! - [`ChunkStore`]: lists the chunks of a stream and opens a chunk for
//!   reading.
//! - [`BucketStorage`]: implements both over the bucket layout described in
//!   [`codec`](crate::codec).

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{StreamExt, TryStreamExt, stream};
use object_store::ObjectStore;
use object_store::path::Path;
use serde::de::DeserializeOwned;

use crate::codec::{
    METADATA_FILE, build_metadata_path, chunk_path, chunk_prefix, decode_line, parse_chunk_name,
    test_metadata_path, tests_prefix,
};
use crate::error::{Error, Result};
use crate::model::{Build, Chunk, ChunkScope, LogLine, Test, Timestamp};

/// Maximum number of test metadata documents fetched at once when listing.
const METADATA_FETCH_CONCURRENCY: usize = 16;

/// Read-only access to build and test metadata.
///
/// A missing record is `Ok(None)`, distinct from a failed lookup.
#[async_trait]
pub trait MetadataLookup: Send + Sync {
    /// Resolves a build by ID.
    async fn resolve_build(&self, build_id: &str) -> Result<Option<Build>>;

    /// Resolves a test of a build by ID.
    async fn resolve_test(&self, build_id: &str, test_id: &str) -> Result<Option<Test>>;

    /// Lists the tests of a build ordered by `(start, id)`.
    ///
    /// Returns an empty list for unknown builds.
    async fn list_tests(&self, build_id: &str) -> Result<Vec<Test>>;
}

/// Chunk listing and reading.
#[async_trait]
pub trait ChunkStore: Send + Sync {
    /// Lists the chunks stored for a stream, in no particular order.
    async fn list_chunks(&self, scope: &ChunkScope) -> Result<Vec<Chunk>>;

    /// Fetches a chunk and returns a lazy decoder over its lines.
    async fn read_chunk(&self, chunk: &Chunk) -> Result<ChunkLines>;
}

/// Lines of a single fetched chunk.
///
/// Lines are decoded on demand from the fetched blob, in storage order. The
/// decoder rejects lines whose keys decrease or fall outside the chunk's
/// declared range, rather than yielding them out of order.
#[derive(Debug)]
pub struct ChunkLines {
    chunk: Chunk,
    data: Bytes,
    pos: usize,
    yielded: u64,
    last: Option<Timestamp>,
}

impl ChunkLines {
    /// Creates a decoder over the raw blob of `chunk`.
    pub fn new(chunk: Chunk, data: Bytes) -> Self {
        Self {
            chunk,
            data,
            pos: 0,
            yielded: 0,
            last: None,
        }
    }

    /// Returns the chunk being decoded.
    pub fn chunk(&self) -> &Chunk {
        &self.chunk
    }

    /// Returns the next line, or `None` once the chunk is exhausted.
    pub fn next(&mut self) -> Result<Option<LogLine>> {
        if self.pos >= self.data.len() {
            if self.yielded != self.chunk.num_lines {
                tracing::warn!(
                    path = %chunk_path(&self.chunk),
                    expected = self.chunk.num_lines,
                    actual = self.yielded,
                    "chunk line count differs from its name"
                );
            }
            return Ok(None);
        }

        let rest = &self.data[self.pos..];
        let (raw, consumed) = match rest.iter().position(|&b| b == b'\n') {
            Some(i) => (&rest[..i], i + 1),
            None => (rest, rest.len()),
        };
        let line = decode_line(raw)?;
        self.pos += consumed;

        if let Some(last) = self.last {
            if line.timestamp < last {
                return Err(Error::MalformedChunk(format!(
                    "{}: line at {} follows line at {}",
                    chunk_path(&self.chunk),
                    line.timestamp,
                    last
                )));
            }
        }
        if !self.chunk.contains(line.timestamp) {
            return Err(Error::MalformedChunk(format!(
                "{}: line at {} outside declared range {}..={}",
                chunk_path(&self.chunk),
                line.timestamp,
                self.chunk.start,
                self.chunk.end
            )));
        }

        self.last = Some(line.timestamp);
        self.yielded += 1;
        Ok(Some(line))
    }
}

/// Object-store backed metadata and chunk storage.
///
/// Wraps `Arc<dyn ObjectStore>` with the bucket layout operations.
#[derive(Clone)]
pub struct BucketStorage {
    store: Arc<dyn ObjectStore>,
}

impl BucketStorage {
    /// Creates a new bucket storage over an object store.
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Fetches an object, mapping a missing object to `None`.
    async fn get_optional(&self, path: &Path) -> Result<Option<Bytes>> {
        match self.store.get(path).await {
            Ok(result) => Ok(Some(result.bytes().await?)),
            Err(object_store::Error::NotFound { .. }) => Ok(None),
            Err(e) => Err(Error::Storage(e.to_string())),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &Path) -> Result<Option<T>> {
        let Some(data) = self.get_optional(path).await? else {
            return Ok(None);
        };
        let value = serde_json::from_slice(&data)
            .map_err(|e| Error::Encoding(format!("{}: {}", path, e)))?;
        Ok(Some(value))
    }
}

#[async_trait]
impl MetadataLookup for BucketStorage {
    #[tracing::instrument(level = "debug", skip(self))]
    async fn resolve_build(&self, build_id: &str) -> Result<Option<Build>> {
        self.get_json(&build_metadata_path(build_id)).await
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn resolve_test(&self, build_id: &str, test_id: &str) -> Result<Option<Test>> {
        let test: Option<Test> = self.get_json(&test_metadata_path(build_id, test_id)).await?;
        // A document filed under another build is not a test of this one.
        Ok(test.filter(|t| t.build_id == build_id))
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn list_tests(&self, build_id: &str) -> Result<Vec<Test>> {
        let listing = self
            .store
            .list_with_delimiter(Some(&tests_prefix(build_id)))
            .await?;

        let fetched: Vec<(Path, Option<Test>)> = stream::iter(listing.common_prefixes)
            .map(|dir| async move {
                let path = dir.child(METADATA_FILE);
                let test = self.get_json::<Test>(&path).await?;
                Ok::<_, Error>((path, test))
            })
            .buffered(METADATA_FETCH_CONCURRENCY)
            .try_collect()
            .await?;

        let mut tests = Vec::with_capacity(fetched.len());
        for (path, test) in fetched {
            match test {
                Some(test) if test.build_id == build_id => tests.push(test),
                Some(_) => tracing::warn!(%path, "skipping test filed under another build"),
                None => tracing::warn!(%path, "skipping test directory without metadata"),
            }
        }

        tests.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.id.cmp(&b.id)));
        Ok(tests)
    }
}

#[async_trait]
impl ChunkStore for BucketStorage {
    #[tracing::instrument(level = "debug", skip(self))]
    async fn list_chunks(&self, scope: &ChunkScope) -> Result<Vec<Chunk>> {
        let prefix = chunk_prefix(scope);
        // Delimited listing keeps a test directory's chunks separate from
        // deeper objects, and the global directory from test directories.
        let listing = self.store.list_with_delimiter(Some(&prefix)).await?;
        let chunks = listing
            .objects
            .iter()
            .filter_map(|meta| {
                let name = meta.location.filename()?;
                parse_chunk_name(scope, name)
            })
            .collect();
        Ok(chunks)
    }

    #[tracing::instrument(level = "debug", skip_all, fields(path = %chunk_path(chunk)))]
    async fn read_chunk(&self, chunk: &Chunk) -> Result<ChunkLines> {
        let path = chunk_path(chunk);
        let data = self
            .get_optional(&path)
            .await?
            .ok_or_else(|| Error::Storage(format!("indexed chunk {} is missing", path)))?;
        Ok(ChunkLines::new(chunk.clone(), data))
    }
}
