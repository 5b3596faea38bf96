//! The retrieval entry point.
//!
//! [`LogKeeper`] resolves builds and tests and assembles downloads: it picks
//! the chunks each source needs, wraps them in stream cursors and hands the
//! cursors to the merge. The returned [`LogLineIterator`] is lazy; nothing is
//! read until the caller pulls the first line.

use std::ops::Range;
use std::sync::Arc;

use common::create_object_store;
use futures::Stream;
use object_store::ObjectStore;
use tokio_util::sync::CancellationToken;

use crate::config::{Config, DownloadOptions};
use crate::cursor::StreamCursor;
use crate::error::{Error, Result};
use crate::index::ChunkIndex;
use crate::merge::MergeIterator;
use crate::model::{Build, Chunk, LogLine, Test, Timestamp};
use crate::range::active_interval;
use crate::storage::{BucketStorage, ChunkStore, MetadataLookup};

/// Read access to build metadata and merged log downloads.
///
/// # Example
///
/// ```ignore
/// use logkeeper::{Config, LogKeeper};
///
/// let keeper = LogKeeper::open(Config::default()).await?;
/// let mut lines = keeper.download_log_lines("build-1", "").await?;
/// while let Some(line) = lines.next().await? {
///     println!("{}", line.data);
/// }
/// ```
pub struct LogKeeper {
    metadata: Arc<dyn MetadataLookup>,
    chunks: Arc<dyn ChunkStore>,
    index: ChunkIndex,
    config: Config,
}

impl LogKeeper {
    /// Opens a keeper over the object store described by `config.storage`.
    ///
    /// # Errors
    ///
    /// Returns an error if the object store cannot be initialized.
    pub async fn open(config: Config) -> Result<Self> {
        let store = create_object_store(&config.storage)?;
        Ok(Self::new(store, config))
    }

    /// Creates a keeper over an existing object store laid out as a log
    /// bucket.
    pub fn new(store: Arc<dyn ObjectStore>, config: Config) -> Self {
        let storage = Arc::new(BucketStorage::new(store));
        Self::with_collaborators(storage.clone(), storage, config)
    }

    /// Creates a keeper over custom metadata and chunk storage.
    pub fn with_collaborators(
        metadata: Arc<dyn MetadataLookup>,
        chunks: Arc<dyn ChunkStore>,
        config: Config,
    ) -> Self {
        Self {
            metadata,
            index: ChunkIndex::new(chunks.clone()),
            chunks,
            config,
        }
    }

    /// Returns the build with the given ID.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no such build exists.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn find_build_by_id(&self, build_id: &str) -> Result<Build> {
        self.metadata
            .resolve_build(build_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("build {}", build_id)))
    }

    /// Returns the test with the given ID within a build.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the build has no such test.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn find_test_by_id(&self, build_id: &str, test_id: &str) -> Result<Test> {
        self.metadata
            .resolve_test(build_id, test_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("test {} of build {}", test_id, build_id)))
    }

    /// Returns the tests of a build ordered by start marker.
    ///
    /// An unknown build has no tests.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn find_tests_for_build(&self, build_id: &str) -> Result<Vec<Test>> {
        self.metadata.list_tests(build_id).await
    }

    /// Returns the active interval of a test, or `None` if the build has no
    /// such test.
    ///
    /// The interval is half-open: it ends at the start of the next test of
    /// the build, or at [`Timestamp::MAX`] for the last test.
    pub async fn test_interval(
        &self,
        build_id: &str,
        test_id: &str,
    ) -> Result<Option<Range<Timestamp>>> {
        let Some(test) = self.metadata.resolve_test(build_id, test_id).await? else {
            return Ok(None);
        };
        let tests = self.metadata.list_tests(build_id).await?;
        Ok(Some(active_interval(&test, &tests)))
    }

    /// Downloads the merged log of a build or of one of its tests.
    ///
    /// With an empty `test_id`, the result holds every test's lines and the
    /// whole global log. Otherwise it holds the test's own lines and the
    /// global lines inside the test's active interval. Either way lines come
    /// out ordered by timestamp; equal timestamps put test lines first.
    ///
    /// Unknown builds and tests produce an empty iterator, not an error.
    pub async fn download_log_lines(&self, build_id: &str, test_id: &str) -> Result<LogLineIterator> {
        self.download_log_lines_with_options(build_id, test_id, DownloadOptions::default())
            .await
    }

    /// Downloads the merged log of a build or test with custom options.
    ///
    /// See [`download_log_lines`](Self::download_log_lines) for the download
    /// semantics and [`DownloadOptions`] for the available options.
    #[tracing::instrument(level = "debug", skip(self, options))]
    pub async fn download_log_lines_with_options(
        &self,
        build_id: &str,
        test_id: &str,
        options: DownloadOptions,
    ) -> Result<LogLineIterator> {
        let sources = if test_id.is_empty() {
            self.build_sources(build_id).await?
        } else {
            self.test_sources(build_id, test_id).await?
        };
        tracing::debug!(sources = sources.len(), "assembled download");
        Ok(LogLineIterator::new(
            MergeIterator::new(sources),
            options.cancellation,
        ))
    }

    /// One cursor per test in listing order, then the global log.
    async fn build_sources(&self, build_id: &str) -> Result<Vec<StreamCursor>> {
        if self.metadata.resolve_build(build_id).await?.is_none() {
            tracing::debug!(build_id, "build not found, download is empty");
            return Ok(Vec::new());
        }

        let tests = self.metadata.list_tests(build_id).await?;
        let mut sources = Vec::with_capacity(tests.len() + 1);
        for test in &tests {
            let chunks = self.index.chunks_for_test(build_id, &test.id).await?;
            sources.push(self.cursor(chunks, None));
        }
        let global = self.index.chunks_for_build(build_id).await?;
        sources.push(self.cursor(global, None));
        Ok(sources)
    }

    /// The test's own cursor, then the global log bounded to its interval.
    async fn test_sources(&self, build_id: &str, test_id: &str) -> Result<Vec<StreamCursor>> {
        let Some(test) = self.metadata.resolve_test(build_id, test_id).await? else {
            tracing::debug!(build_id, test_id, "test not found, download is empty");
            return Ok(Vec::new());
        };

        let tests = self.metadata.list_tests(build_id).await?;
        let interval = active_interval(&test, &tests);
        let owned = self.index.chunks_for_test(build_id, test_id).await?;
        let global = self
            .index
            .global_chunks_in_interval(build_id, interval.clone())
            .await?;
        tracing::debug!(
            start = interval.start,
            end = interval.end,
            global_chunks = global.len(),
            "selected global chunks for test"
        );

        Ok(vec![
            self.cursor(owned, None),
            self.cursor(global, Some(interval)),
        ])
    }

    fn cursor(&self, chunks: Vec<Chunk>, bounds: Option<Range<Timestamp>>) -> StreamCursor {
        StreamCursor::new(self.chunks.clone(), chunks, bounds, self.config.prefetch)
    }
}

/// Lazily merged log lines of a download.
///
/// Lines are produced one at a time in timestamp order. After an error,
/// including [`Error::Cancelled`], the iterator releases every open chunk and
/// background fetch and returns `Ok(None)` from then on. Dropping it early
/// releases them as well.
pub struct LogLineIterator {
    merge: Option<MergeIterator>,
    cancellation: Option<CancellationToken>,
}

impl LogLineIterator {
    pub(crate) fn new(merge: MergeIterator, cancellation: Option<CancellationToken>) -> Self {
        Self {
            merge: Some(merge),
            cancellation,
        }
    }

    /// Returns the next log line, or `None` if the download is complete.
    pub async fn next(&mut self) -> Result<Option<LogLine>> {
        let Some(merge) = &mut self.merge else {
            return Ok(None);
        };

        let result = match &self.cancellation {
            Some(token) => {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => Err(Error::Cancelled),
                    result = merge.next() => result,
                }
            }
            None => merge.next().await,
        };

        if let Err(e) = &result {
            tracing::debug!(error = %e, "download stopped");
            self.merge = None;
        }
        result
    }

    /// Adapts the iterator into a [`Stream`] of lines.
    ///
    /// The stream ends after the first error.
    pub fn into_stream(self) -> impl Stream<Item = Result<LogLine>> + Send {
        futures::stream::unfold(self, |mut iter| async move {
            match iter.next().await {
                Ok(Some(line)) => Some((Ok(line), iter)),
                Ok(None) => None,
                Err(e) => Some((Err(e), iter)),
            }
        })
    }
}
