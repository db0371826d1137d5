use super::{Cursor, CursorError, CursorKind, PositionCursor};
use serde::{Deserialize, Serialize};
use std::cmp;

/// Position in a single globally ordered stream.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct SequenceCursor {
    index: u64,
}

impl SequenceCursor {
    pub fn new(index: u64) -> Self {
        Self { index }
    }

    /// Global index of the last processed entry.
    pub fn index(&self) -> u64 {
        self.index
    }

    /// Returns a cursor moved forward by `delta` entries.
    pub fn offset_by(&self, delta: u64) -> Self {
        Self::new(self.index.saturating_add(delta))
    }

    fn comparable(other: &Cursor) -> Result<&SequenceCursor, CursorError> {
        match other {
            Cursor::Sequence(cursor) => Ok(cursor),
            other => Err(CursorError::incompatible(CursorKind::Sequence, other)),
        }
    }
}

impl PositionCursor for SequenceCursor {
    fn lower_bound(&self, other: &Cursor) -> Result<Cursor, CursorError> {
        let other = Self::comparable(other)?;
        Ok(Cursor::Sequence(cmp::min(*self, *other)))
    }

    fn upper_bound(&self, other: &Cursor) -> Result<Cursor, CursorError> {
        let other = Self::comparable(other)?;
        Ok(Cursor::Sequence(cmp::max(*self, *other)))
    }

    fn covers(&self, other: &Cursor) -> Result<bool, CursorError> {
        let other = Self::comparable(other)?;
        Ok(self.index >= other.index)
    }

    fn position(&self) -> Option<u64> {
        Some(self.index)
    }
}
