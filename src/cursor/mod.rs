//! Progress cursors tracked per stream segment.
//!
//! [`Cursor`] is a closed set of variants. Plain variants ([`SequenceCursor`],
//! [`PartitionOffsetCursor`]) only compare against each other; decorators
//! ([`ReplayCursor`], [`MergedCursor`]) wrap other cursors and own their advance
//! logic. Absent progress (a segment that never started) is `Option<Cursor>`
//! everywhere, never a sentinel variant.

pub mod capability;
pub mod merged;
pub mod offsets;
pub mod replay;
pub mod sequence;

pub use capability::{
    advance, resolve_lower_bound, resolve_upper_bound, unwrap_as, CursorRef, CursorVariant,
    DecoratorCursor, PositionCursor,
};
pub use merged::{is_merge_in_progress, merge_position, MergedCursor};
pub use offsets::PartitionOffsetCursor;
pub use replay::{is_replay, ReplayCursor};
pub use sequence::SequenceCursor;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Discriminant of a [`Cursor`], used in diagnostics and persisted envelopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CursorKind {
    Sequence,
    PartitionOffsets,
    Replay,
    Merged,
}

impl CursorKind {
    /// Returns the canonical snake_case name (matches the serialized `type` tag).
    pub fn as_str(self) -> &'static str {
        match self {
            CursorKind::Sequence => "sequence",
            CursorKind::PartitionOffsets => "partition_offsets",
            CursorKind::Replay => "replay",
            CursorKind::Merged => "merged",
        }
    }
}

impl fmt::Display for CursorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fault raised by the cursor algebra. Faults from a concrete variant pass
/// through the decorators unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CursorError {
    #[error("{expected} cursor cannot be compared with a {found} cursor")]
    IncompatibleVariants {
        expected: CursorKind,
        found: CursorKind,
    },
    #[error("merged cursor requires at least one segment cursor")]
    EmptyMerge,
}

impl CursorError {
    pub(crate) fn incompatible(expected: CursorKind, found: &Cursor) -> Self {
        CursorError::IncompatibleVariants {
            expected,
            found: found.kind(),
        }
    }
}

/// Read position of a single segment.
///
/// Serializes as an internally tagged object (`{"type": "sequence", ...}`) so
/// merged and replay cursors nest their inner cursors polymorphically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Cursor {
    Sequence(SequenceCursor),
    PartitionOffsets(PartitionOffsetCursor),
    Replay(Box<ReplayCursor>),
    Merged(Box<MergedCursor>),
}

impl Cursor {
    /// Shorthand for a global sequence cursor.
    pub fn sequence(index: u64) -> Self {
        Cursor::Sequence(SequenceCursor::new(index))
    }

    pub fn kind(&self) -> CursorKind {
        match self {
            Cursor::Sequence(_) => CursorKind::Sequence,
            Cursor::PartitionOffsets(_) => CursorKind::PartitionOffsets,
            Cursor::Replay(_) => CursorKind::Replay,
            Cursor::Merged(_) => CursorKind::Merged,
        }
    }

    /// True for variants that wrap other cursors.
    pub fn is_decorator(&self) -> bool {
        matches!(self, Cursor::Replay(_) | Cursor::Merged(_))
    }

    /// Borrowed view used by [`CursorVariant::project`].
    pub fn as_variant(&self) -> CursorRef<'_> {
        match self {
            Cursor::Sequence(cursor) => CursorRef::Sequence(cursor),
            Cursor::PartitionOffsets(cursor) => CursorRef::PartitionOffsets(cursor),
            Cursor::Replay(cursor) => CursorRef::Replay(cursor),
            Cursor::Merged(cursor) => CursorRef::Merged(cursor),
        }
    }

    /// Walks the decorator chain looking for a `T`. See [`unwrap_as`].
    pub fn unwrap_as<T: CursorVariant>(&self) -> Option<&T> {
        unwrap_as(Some(self))
    }

    /// Serializes the cursor to its tagged JSON form.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Restores a cursor from its tagged JSON form.
    pub fn from_json(payload: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(payload)
    }
}

impl PositionCursor for Cursor {
    fn lower_bound(&self, other: &Cursor) -> Result<Cursor, CursorError> {
        match self {
            Cursor::Sequence(cursor) => cursor.lower_bound(other),
            Cursor::PartitionOffsets(cursor) => cursor.lower_bound(other),
            Cursor::Replay(cursor) => cursor.lower_bound(other),
            Cursor::Merged(cursor) => cursor.lower_bound(other),
        }
    }

    fn upper_bound(&self, other: &Cursor) -> Result<Cursor, CursorError> {
        match self {
            Cursor::Sequence(cursor) => cursor.upper_bound(other),
            Cursor::PartitionOffsets(cursor) => cursor.upper_bound(other),
            Cursor::Replay(cursor) => cursor.upper_bound(other),
            Cursor::Merged(cursor) => cursor.upper_bound(other),
        }
    }

    fn covers(&self, other: &Cursor) -> Result<bool, CursorError> {
        match self {
            Cursor::Sequence(cursor) => cursor.covers(other),
            Cursor::PartitionOffsets(cursor) => cursor.covers(other),
            Cursor::Replay(cursor) => cursor.covers(other),
            Cursor::Merged(cursor) => cursor.covers(other),
        }
    }

    fn position(&self) -> Option<u64> {
        match self {
            Cursor::Sequence(cursor) => cursor.position(),
            Cursor::PartitionOffsets(cursor) => cursor.position(),
            Cursor::Replay(cursor) => cursor.position(),
            Cursor::Merged(cursor) => cursor.position(),
        }
    }
}

impl From<SequenceCursor> for Cursor {
    fn from(cursor: SequenceCursor) -> Self {
        Cursor::Sequence(cursor)
    }
}

impl From<PartitionOffsetCursor> for Cursor {
    fn from(cursor: PartitionOffsetCursor) -> Self {
        Cursor::PartitionOffsets(cursor)
    }
}

impl From<ReplayCursor> for Cursor {
    fn from(cursor: ReplayCursor) -> Self {
        Cursor::Replay(Box::new(cursor))
    }
}

impl From<MergedCursor> for Cursor {
    fn from(cursor: MergedCursor) -> Self {
        Cursor::Merged(Box::new(cursor))
    }
}
