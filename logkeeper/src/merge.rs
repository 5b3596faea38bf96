//! K-way merge of per-stream cursors.
//!
//! Every source is already ordered by key, so the merge only has to hold the
//! current head line of each source. Heads are kept in a min-heap keyed by
//! `(timestamp, rank)`, where `rank` is the source's position in the list the
//! merge was built with. Equal keys therefore come out in source order, which
//! makes the output deterministic for a fixed source list.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::cursor::StreamCursor;
use crate::error::Result;
use crate::model::{LogLine, Timestamp};

/// Head line of one source.
struct Head {
    timestamp: Timestamp,
    rank: usize,
    line: LogLine,
}

impl PartialEq for Head {
    fn eq(&self, other: &Self) -> bool {
        self.timestamp == other.timestamp && self.rank == other.rank
    }
}

impl Eq for Head {}

impl PartialOrd for Head {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Head {
    // Reversed so that `BinaryHeap` pops the smallest key first.
    fn cmp(&self, other: &Self) -> Ordering {
        (other.timestamp, other.rank).cmp(&(self.timestamp, self.rank))
    }
}

/// Merges ordered sources into one ordered sequence.
///
/// Nothing is read until the first call to [`next`](Self::next). After that,
/// at most one line per source is held ahead of the consumer, and a source is
/// only advanced when its previous head has been handed out.
pub(crate) struct MergeIterator {
    sources: Vec<StreamCursor>,
    heap: BinaryHeap<Head>,
    primed: bool,
    /// Source whose head was last returned and still needs a replacement.
    pending: Option<usize>,
}

impl MergeIterator {
    pub(crate) fn new(sources: Vec<StreamCursor>) -> Self {
        Self {
            heap: BinaryHeap::with_capacity(sources.len()),
            sources,
            primed: false,
            pending: None,
        }
    }

    /// Returns the next line in merged order, or `None` when every source is
    /// exhausted. A failing source fails the merge.
    pub(crate) async fn next(&mut self) -> Result<Option<LogLine>> {
        if !self.primed {
            for rank in 0..self.sources.len() {
                self.pull(rank).await?;
            }
            self.primed = true;
        }
        if let Some(rank) = self.pending.take() {
            self.pull(rank).await?;
        }

        let Some(head) = self.heap.pop() else {
            return Ok(None);
        };
        self.pending = Some(head.rank);
        Ok(Some(head.line))
    }

    async fn pull(&mut self, rank: usize) -> Result<()> {
        if let Some(line) = self.sources[rank].next().await? {
            self.heap.push(Head {
                timestamp: line.timestamp,
                rank,
                line,
            });
        }
        Ok(())
    }
}
