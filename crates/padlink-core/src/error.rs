//! Error taxonomy for the adapter.
//!
//! Coordinate errors and invariant violations are programming-contract
//! failures: they are returned to the caller and never clamped or retried.
use thiserror::Error;

use crate::coords::Position;

/// Result alias used throughout the crate.
pub type Result<T, E = AdapterError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum AdapterError {
    /// A line/column pair that does not exist in the snapshot.
    #[error("position {position} is outside the document ({lines} lines)")]
    PositionOutOfBounds { position: Position, lines: usize },

    /// A char offset past the end of the snapshot.
    #[error("offset {offset} is outside the document ({len} chars)")]
    OffsetOutOfBounds { offset: usize, len: usize },

    #[error("invalid range: start {start} is after end {end}")]
    InvalidRange { start: usize, end: usize },

    /// Two edits of one batch cover the same characters of the prior document.
    #[error("edits overlap: [{first_start}, {first_end}) and [{second_start}, {second_end})")]
    OverlappingEdits {
        first_start: usize,
        first_end: usize,
        second_start: usize,
        second_end: usize,
    },

    /// An operation's length disagrees with the document it is applied to.
    #[error("{context}: expected length {expected}, got {actual}")]
    LengthMismatch {
        context: &'static str,
        expected: usize,
        actual: usize,
    },

    /// The translated operation does not reproduce the editor's text.
    #[error("snapshot diverged from the editor at offset {offset}")]
    SnapshotDivergence { offset: usize },

    #[error("an operation replay is already in progress")]
    ReentrantReplay,

    /// Content changes arrived during a replay that the replay did not cause.
    #[error("{batches} content change(s) from another source arrived during replay")]
    ForeignMutation { batches: usize },

    #[error(transparent)]
    Host(#[from] anyhow::Error),
}

impl AdapterError {
    pub(crate) fn length(context: &'static str, expected: usize, actual: usize) -> Self {
        Self::LengthMismatch {
            context,
            expected,
            actual,
        }
    }
}
