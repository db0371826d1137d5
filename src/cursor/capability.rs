//! Capability traits implemented by every cursor variant, plus the free helpers
//! that operate over them.

use super::{
    Cursor, CursorError, MergedCursor, PartitionOffsetCursor, ReplayCursor, SequenceCursor,
};

/// Comparison capability shared by every cursor.
pub trait PositionCursor {
    /// Position both `self` and `other` are guaranteed to have reached.
    fn lower_bound(&self, other: &Cursor) -> Result<Cursor, CursorError>;

    /// Furthest position reachable by combining both guarantees.
    fn upper_bound(&self, other: &Cursor) -> Result<Cursor, CursorError>;

    /// True when `self` already subsumes `other`, so nothing up to `other` needs replaying.
    fn covers(&self, other: &Cursor) -> Result<bool, CursorError>;

    /// Single numeric position for lag reporting, when the variant has one.
    fn position(&self) -> Option<u64> {
        None
    }
}

/// Capability of cursors that wrap other cursors.
pub trait DecoratorCursor: PositionCursor {
    /// Returns the cursor after processing up to `new_cursor`.
    fn advanced_to(&self, new_cursor: &Cursor) -> Result<Cursor, CursorError>;

    /// Typed accessor: `self` when it is a `T`, otherwise whatever the
    /// decorator's traversal rule finds further down the chain.
    fn unwrap_as<T: CursorVariant>(&self) -> Option<&T>;

    /// Innermost definite lower bound, without running any merge logic.
    fn absolute_lower_bound(&self) -> Result<Option<Cursor>, CursorError>;

    /// Innermost definite upper bound, without running any merge logic.
    fn absolute_upper_bound(&self) -> Result<Option<Cursor>, CursorError>;
}

/// Borrowed view over the concrete variant held by a [`Cursor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorRef<'a> {
    Sequence(&'a SequenceCursor),
    PartitionOffsets(&'a PartitionOffsetCursor),
    Replay(&'a ReplayCursor),
    Merged(&'a MergedCursor),
}

/// Concrete cursor types that [`unwrap_as`] can project onto.
pub trait CursorVariant: Sized {
    fn project(cursor: CursorRef<'_>) -> Option<&Self>;
}

impl CursorVariant for SequenceCursor {
    fn project(cursor: CursorRef<'_>) -> Option<&Self> {
        match cursor {
            CursorRef::Sequence(cursor) => Some(cursor),
            _ => None,
        }
    }
}

impl CursorVariant for PartitionOffsetCursor {
    fn project(cursor: CursorRef<'_>) -> Option<&Self> {
        match cursor {
            CursorRef::PartitionOffsets(cursor) => Some(cursor),
            _ => None,
        }
    }
}

impl CursorVariant for ReplayCursor {
    fn project(cursor: CursorRef<'_>) -> Option<&Self> {
        match cursor {
            CursorRef::Replay(cursor) => Some(cursor),
            _ => None,
        }
    }
}

impl CursorVariant for MergedCursor {
    fn project(cursor: CursorRef<'_>) -> Option<&Self> {
        match cursor {
            CursorRef::Merged(cursor) => Some(cursor),
            _ => None,
        }
    }
}

/// Retrieves a `T` from `cursor`, following each decorator's traversal rule.
pub fn unwrap_as<T: CursorVariant>(cursor: Option<&Cursor>) -> Option<&T> {
    match cursor? {
        Cursor::Replay(replay) => replay.unwrap_as::<T>(),
        Cursor::Merged(merged) => merged.unwrap_as::<T>(),
        plain => T::project(plain.as_variant()),
    }
}

/// Strips decorators down to the innermost definite lower bound.
pub fn resolve_lower_bound(cursor: Option<&Cursor>) -> Result<Option<Cursor>, CursorError> {
    match cursor {
        None => Ok(None),
        Some(Cursor::Replay(replay)) => replay.absolute_lower_bound(),
        Some(Cursor::Merged(merged)) => merged.absolute_lower_bound(),
        Some(plain) => Ok(Some(plain.clone())),
    }
}

/// Strips decorators down to the innermost definite upper bound.
pub fn resolve_upper_bound(cursor: Option<&Cursor>) -> Result<Option<Cursor>, CursorError> {
    match cursor {
        None => Ok(None),
        Some(Cursor::Replay(replay)) => replay.absolute_upper_bound(),
        Some(Cursor::Merged(merged)) => merged.absolute_upper_bound(),
        Some(plain) => Ok(Some(plain.clone())),
    }
}

/// Threads a processed position into the segment's cursor: decorators advance
/// themselves, while plain or absent cursors are replaced by `new_cursor`.
pub fn advance(current: Option<&Cursor>, new_cursor: &Cursor) -> Result<Cursor, CursorError> {
    match current {
        Some(Cursor::Replay(replay)) => replay.advanced_to(new_cursor),
        Some(Cursor::Merged(merged)) => merged.advanced_to(new_cursor),
        _ => Ok(new_cursor.clone()),
    }
}
