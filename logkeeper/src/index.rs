//! Chunk selection.
//!
//! [`ChunkIndex`] turns raw chunk listings into the ordered chunk lists a
//! download reads: all chunks of a stream, or the global chunks overlapping a
//! test's active interval. Selection only looks at chunk metadata; no line is
//! read here.

use std::ops::{Range, RangeBounds};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::model::{Chunk, ChunkScope, Timestamp};
use crate::range::normalize_timestamp;
use crate::storage::ChunkStore;

/// Ordered chunk listings for builds and tests.
#[derive(Clone)]
pub struct ChunkIndex {
    store: Arc<dyn ChunkStore>,
}

impl ChunkIndex {
    /// Creates an index over a chunk store.
    pub fn new(store: Arc<dyn ChunkStore>) -> Self {
        Self { store }
    }

    /// Returns all global chunks of a build in ascending key order.
    pub async fn chunks_for_build(&self, build_id: &str) -> Result<Vec<Chunk>> {
        self.ordered(&ChunkScope::global(build_id)).await
    }

    /// Returns all chunks owned by a test in ascending key order.
    pub async fn chunks_for_test(&self, build_id: &str, test_id: &str) -> Result<Vec<Chunk>> {
        self.ordered(&ChunkScope::test(build_id, test_id)).await
    }

    /// Returns the global chunks of a build whose key range intersects
    /// `range`, in ascending key order.
    ///
    /// A chunk that only partially overlaps is returned whole; trimming to the
    /// exact interval happens when lines are read.
    pub async fn global_chunks_in_interval(
        &self,
        build_id: &str,
        range: impl RangeBounds<Timestamp> + Send,
    ) -> Result<Vec<Chunk>> {
        let range = normalize_timestamp(&range);
        let chunks = self.chunks_for_build(build_id).await?;
        Ok(select_overlapping(&chunks, &range).to_vec())
    }

    async fn ordered(&self, scope: &ChunkScope) -> Result<Vec<Chunk>> {
        let mut chunks = self.store.list_chunks(scope).await?;
        chunks.sort_by_key(|c| (c.start, c.end));
        validate_stream(&chunks)?;
        tracing::debug!(?scope, chunks = chunks.len(), "indexed stream");
        Ok(chunks)
    }
}

/// Checks that the sorted chunks of one stream do not overlap.
///
/// Adjacent chunks may share a boundary key, since keys are non-decreasing
/// rather than strictly increasing.
fn validate_stream(chunks: &[Chunk]) -> Result<()> {
    for pair in chunks.windows(2) {
        let (prev, next) = (&pair[0], &pair[1]);
        if next.start < prev.end {
            return Err(Error::MalformedChunk(format!(
                "chunks {}..={} and {}..={} of build {} overlap",
                prev.start, prev.end, next.start, next.end, prev.build_id
            )));
        }
    }
    Ok(())
}

/// Selects the chunks overlapping `range` from a sorted, non-overlapping list.
///
/// Both chunk starts and ends are sorted, so the overlapping chunks form one
/// contiguous run found with two binary searches.
pub(crate) fn select_overlapping<'a>(chunks: &'a [Chunk], range: &Range<Timestamp>) -> &'a [Chunk] {
    if range.start >= range.end {
        return &[];
    }
    let first = chunks.partition_point(|c| c.end < range.start);
    let last = chunks.partition_point(|c| c.start < range.end);
    if first >= last {
        return &[];
    }
    &chunks[first..last]
}
