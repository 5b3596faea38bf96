//! Error types for log retrieval.
//!
//! This module defines [`Error`], the error type for every retrieval
//! operation, along with a convenient [`Result`] type alias.

use common::StorageError;

/// Error type for log retrieval operations.
///
/// # Error Categories
///
/// - [`NotFound`](Error::NotFound): A build or test does not exist. Only the
///   metadata lookups surface this; downloads of unknown builds or tests
///   produce an empty stream instead.
/// - [`Storage`](Error::Storage): The object store holding metadata or chunks
///   could not be reached or failed the request.
/// - [`Cancelled`](Error::Cancelled): The caller abandoned the request.
/// - [`MalformedChunk`](Error::MalformedChunk): Stored lines or chunks violate
///   the ordering invariants. Output is never reordered to compensate.
/// - [`Encoding`](Error::Encoding): A chunk line or metadata document could
///   not be decoded.
/// - [`InvalidInput`](Error::InvalidInput): The caller provided invalid
///   arguments.
/// - [`Internal`](Error::Internal): Unexpected internal errors that indicate
///   bugs or invariant violations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The requested build or test does not exist.
    NotFound(String),

    /// Storage-related errors from the underlying object store.
    Storage(String),

    /// The request was cancelled before it completed.
    ///
    /// Lines delivered before cancellation remain valid.
    Cancelled,

    /// Stored data violates the non-decreasing ordering of a stream.
    MalformedChunk(String),

    /// Encoding or decoding errors.
    Encoding(String),

    /// Invalid input or parameter errors.
    InvalidInput(String),

    /// Internal errors indicating bugs or invariant violations.
    Internal(String),
}

impl std::error::Error for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::NotFound(msg) => write!(f, "Not found: {}", msg),
            Error::Storage(msg) => write!(f, "Storage error: {}", msg),
            Error::Cancelled => write!(f, "Request cancelled"),
            Error::MalformedChunk(msg) => write!(f, "Malformed chunk: {}", msg),
            Error::Encoding(msg) => write!(f, "Encoding error: {}", msg),
            Error::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            Error::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl From<StorageError> for Error {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Storage(msg) => Error::Storage(msg),
        }
    }
}

impl From<object_store::Error> for Error {
    fn from(err: object_store::Error) -> Self {
        Error::Storage(err.to_string())
    }
}

/// Result type alias for log retrieval operations.
pub type Result<T> = std::result::Result<T, Error>;
