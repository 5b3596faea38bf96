//! Bucket layout and chunk encoding.
//!
//! # Layout
//!
//! Metadata and chunks live under one object-store prefix per build:
//!
//! ```text
//! builds/{build_id}/metadata.json
//! builds/{build_id}/global/{start}_{end}_{num_lines}
//! builds/{build_id}/tests/{test_id}/metadata.json
//! builds/{build_id}/tests/{test_id}/{start}_{end}_{num_lines}
//! ```
//!
//! The chunk object name carries the chunk's key range, so listing a prefix is
//! enough to index a stream without opening any chunk.
//!
//! # Line Encoding
//!
//! A chunk is a sequence of newline-terminated records:
//!
//! ```text
//! | timestamp (decimal u64) | ' ' | data (UTF-8, no '\n') | '\n' |
//! ```

use bytes::{BufMut, Bytes, BytesMut};
use object_store::path::Path;

use crate::error::{Error, Result};
use crate::model::{Chunk, ChunkScope, LogLine, Timestamp};

const BUILDS_DIR: &str = "builds";
const GLOBAL_DIR: &str = "global";
const TESTS_DIR: &str = "tests";
pub(crate) const METADATA_FILE: &str = "metadata.json";

/// Path of a build's metadata document.
pub fn build_metadata_path(build_id: &str) -> Path {
    Path::from_iter([BUILDS_DIR, build_id, METADATA_FILE])
}

/// Path of a test's metadata document.
pub fn test_metadata_path(build_id: &str, test_id: &str) -> Path {
    Path::from_iter([BUILDS_DIR, build_id, TESTS_DIR, test_id, METADATA_FILE])
}

/// Prefix under which every test directory of a build lives.
pub(crate) fn tests_prefix(build_id: &str) -> Path {
    Path::from_iter([BUILDS_DIR, build_id, TESTS_DIR])
}

/// Prefix under which the chunks of a stream live.
pub(crate) fn chunk_prefix(scope: &ChunkScope) -> Path {
    match scope {
        ChunkScope::Global { build_id } => Path::from_iter([BUILDS_DIR, build_id, GLOBAL_DIR]),
        ChunkScope::Test { build_id, test_id } => {
            Path::from_iter([BUILDS_DIR, build_id, TESTS_DIR, test_id])
        }
    }
}

/// Path of a chunk object.
pub fn chunk_path(chunk: &Chunk) -> Path {
    let scope = match &chunk.test_id {
        Some(test_id) => ChunkScope::test(chunk.build_id.as_str(), test_id.as_str()),
        None => ChunkScope::global(chunk.build_id.as_str()),
    };
    chunk_prefix(&scope).child(chunk_name(chunk))
}

fn chunk_name(chunk: &Chunk) -> String {
    format!("{}_{}_{}", chunk.start, chunk.end, chunk.num_lines)
}

/// Parses a chunk object name into a [`Chunk`] of the given scope.
///
/// Returns `None` for names that are not chunks (such as `metadata.json`).
pub(crate) fn parse_chunk_name(scope: &ChunkScope, name: &str) -> Option<Chunk> {
    let mut parts = name.split('_');
    let start = parts.next()?.parse::<Timestamp>().ok()?;
    let end = parts.next()?.parse::<Timestamp>().ok()?;
    let num_lines = parts.next()?.parse::<u64>().ok()?;
    if parts.next().is_some() || start > end {
        return None;
    }
    Some(Chunk {
        build_id: scope.build_id().to_string(),
        test_id: scope.test_id().map(str::to_string),
        start,
        end,
        num_lines,
    })
}

/// Encodes log lines into the chunk blob format.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if a line's data contains a newline.
pub fn encode_lines(lines: &[LogLine]) -> Result<Bytes> {
    let mut buf = BytesMut::new();
    for line in lines {
        if line.data.contains('\n') {
            return Err(Error::InvalidInput(format!(
                "log line at {} contains a newline",
                line.timestamp
            )));
        }
        buf.put_slice(line.timestamp.to_string().as_bytes());
        buf.put_u8(b' ');
        buf.put_slice(line.data.as_bytes());
        buf.put_u8(b'\n');
    }
    Ok(buf.freeze())
}

/// Decodes a single record (without its trailing newline).
///
/// Invalid UTF-8 in the data is replaced rather than rejected; only the
/// timestamp prefix is strict.
pub(crate) fn decode_line(raw: &[u8]) -> Result<LogLine> {
    let split = raw
        .iter()
        .position(|&b| b == b' ')
        .ok_or_else(|| Error::Encoding("log line is missing its timestamp".to_string()))?;
    let timestamp = std::str::from_utf8(&raw[..split])
        .ok()
        .and_then(|s| s.parse::<Timestamp>().ok())
        .ok_or_else(|| {
            Error::Encoding(format!(
                "invalid log line timestamp: {:?}",
                String::from_utf8_lossy(&raw[..split])
            ))
        })?;
    let data = String::from_utf8_lossy(&raw[split + 1..]).into_owned();
    Ok(LogLine { timestamp, data })
}
