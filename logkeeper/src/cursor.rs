//! Per-source line cursors.
//!
//! A [`StreamCursor`] walks the ordered chunks of one stream, opening each
//! chunk only when the previous one is drained. It optionally fetches the
//! following chunk in the background while the current one is consumed.

use std::ops::Range;
use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::error::{Error, Result};
use crate::model::{Chunk, LogLine, Timestamp};
use crate::storage::{ChunkLines, ChunkStore};

/// Lazy cursor over the lines of one stream.
///
/// When `bounds` is set, lines below the range are skipped and the first line
/// at or past its end exhausts the cursor; stream keys never decrease, so no
/// later line can fall back inside.
pub(crate) struct StreamCursor {
    store: Arc<dyn ChunkStore>,
    chunks: Vec<Chunk>,
    next_chunk_idx: usize,
    current: Option<ChunkLines>,
    prefetch_enabled: bool,
    /// In-flight fetch of `chunks[next_chunk_idx]`.
    prefetch: Option<JoinHandle<Result<ChunkLines>>>,
    bounds: Option<Range<Timestamp>>,
    last: Option<Timestamp>,
    exhausted: bool,
}

impl StreamCursor {
    /// Creates a cursor over `chunks`, which must be in ascending key order.
    pub(crate) fn new(
        store: Arc<dyn ChunkStore>,
        chunks: Vec<Chunk>,
        bounds: Option<Range<Timestamp>>,
        prefetch: bool,
    ) -> Self {
        Self {
            store,
            chunks,
            next_chunk_idx: 0,
            current: None,
            prefetch_enabled: prefetch,
            prefetch: None,
            bounds,
            last: None,
            exhausted: false,
        }
    }

    /// Returns the next line of the stream, or `None` once it is exhausted.
    pub(crate) async fn next(&mut self) -> Result<Option<LogLine>> {
        loop {
            if self.exhausted {
                return Ok(None);
            }

            if let Some(lines) = &mut self.current {
                if let Some(line) = lines.next()? {
                    self.check_order(&line)?;
                    if let Some(bounds) = &self.bounds {
                        if line.timestamp < bounds.start {
                            continue;
                        }
                        if line.timestamp >= bounds.end {
                            self.finish();
                            return Ok(None);
                        }
                    }
                    return Ok(Some(line));
                }
                // Current chunk exhausted, move to next
                self.current = None;
            }

            if !self.advance_chunk().await? {
                self.finish();
                return Ok(None);
            }
        }
    }

    /// Opens the next chunk, preferring an already running prefetch.
    ///
    /// Returns `true` if a chunk was opened, `false` if no chunks remain.
    async fn advance_chunk(&mut self) -> Result<bool> {
        let Some(chunk) = self.chunks.get(self.next_chunk_idx) else {
            return Ok(false);
        };

        let lines = match &mut self.prefetch {
            // The handle stays in place while awaited so that dropping the
            // cursor mid-fetch still aborts the task.
            Some(handle) => {
                let joined = handle.await;
                self.prefetch = None;
                joined.map_err(|e| Error::Internal(format!("chunk prefetch failed: {}", e)))??
            }
            None => self.store.read_chunk(chunk).await?,
        };

        self.next_chunk_idx += 1;
        self.current = Some(lines);
        self.start_prefetch();
        Ok(true)
    }

    fn start_prefetch(&mut self) {
        if !self.prefetch_enabled {
            return;
        }
        let Some(chunk) = self.chunks.get(self.next_chunk_idx).cloned() else {
            return;
        };
        let store = Arc::clone(&self.store);
        tracing::trace!(start = chunk.start, end = chunk.end, "prefetching chunk");
        self.prefetch = Some(tokio::spawn(async move { store.read_chunk(&chunk).await }));
    }

    /// Enforces non-decreasing keys across chunk boundaries.
    fn check_order(&mut self, line: &LogLine) -> Result<()> {
        if let Some(last) = self.last {
            if line.timestamp < last {
                let chunk = &self.chunks[self.next_chunk_idx - 1];
                return Err(Error::MalformedChunk(format!(
                    "line at {} in chunk {}..={} follows line at {} of the previous chunk",
                    line.timestamp, chunk.start, chunk.end, last
                )));
            }
        }
        self.last = Some(line.timestamp);
        Ok(())
    }

    fn finish(&mut self) {
        self.exhausted = true;
        self.current = None;
        if let Some(handle) = self.prefetch.take() {
            handle.abort();
        }
    }
}

impl Drop for StreamCursor {
    fn drop(&mut self) {
        if let Some(handle) = self.prefetch.take() {
            handle.abort();
        }
    }
}
