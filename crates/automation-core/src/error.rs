//! Tagged domain errors.
//!
//! Errors that must be recognized across module boundaries carry a stable
//! string kind. Callers identify them with a predicate against that kind
//! instead of matching on a concrete error type, so an error raised deep in
//! one module can be classified in another without coupling the two.

use thiserror::Error;

/// Stable-kind discriminator carried by domain errors.
pub trait TaggedError: std::error::Error {
    fn error_kind(&self) -> &'static str;
}

/// Returns true when `err` carries the given kind.
pub fn has_kind(err: &dyn TaggedError, kind: &str) -> bool {
    err.error_kind() == kind
}

pub const STREAM_STALLED_KIND: &str = "StreamStalled";

/// A byte transfer made no progress within its allowed idle window.
///
/// Distinguished from ordinary network failures so that callers retry only
/// genuine stalls.
#[derive(Clone, Debug, Error)]
#[error(
    "Stream stalled: failed to transfer {chunk_size_bytes} bytes over the previous {max_activity_dwell_time}ms"
)]
pub struct StreamStalledError {
    /// Longest tolerated gap between observed activity, in milliseconds.
    pub max_activity_dwell_time: u64,
    /// Size of the transfer chunk that failed to move.
    pub chunk_size_bytes: u64,
}

impl StreamStalledError {
    pub fn new(max_activity_dwell_time: u64, chunk_size_bytes: u64) -> Self {
        Self {
            max_activity_dwell_time,
            chunk_size_bytes,
        }
    }

    pub fn is_stream_stalled(err: &dyn TaggedError) -> bool {
        has_kind(err, STREAM_STALLED_KIND)
    }
}

impl TaggedError for StreamStalledError {
    fn error_kind(&self) -> &'static str {
        STREAM_STALLED_KIND
    }
}
