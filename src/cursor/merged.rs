use super::capability::{self, resolve_lower_bound, resolve_upper_bound};
use super::{Cursor, CursorError, CursorRef, CursorVariant, DecoratorCursor, PositionCursor};
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// Progress of a segment recombined from two halves that were split earlier.
///
/// Each half keeps advancing on its own until both reach the same position, at
/// which point the merged cursor collapses into that single cursor. The
/// `*_advanced` flags describe only the most recent [`advanced_to`] call; they
/// are not persisted and take no part in equality or hashing.
///
/// At least one half is always present; a merge of two unstarted segments is
/// no cursor at all.
///
/// [`advanced_to`]: DecoratorCursor::advanced_to
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "MergedCursorRecord")]
pub struct MergedCursor {
    lower_segment: Option<Cursor>,
    upper_segment: Option<Cursor>,
    #[serde(skip)]
    lower_advanced: bool,
    #[serde(skip)]
    upper_advanced: bool,
}

#[derive(Deserialize)]
struct MergedCursorRecord {
    #[serde(default)]
    lower_segment: Option<Cursor>,
    #[serde(default)]
    upper_segment: Option<Cursor>,
}

impl TryFrom<MergedCursorRecord> for MergedCursor {
    type Error = CursorError;

    fn try_from(record: MergedCursorRecord) -> Result<Self, Self::Error> {
        Self::try_new(record.lower_segment, record.upper_segment)
    }
}

impl MergedCursor {
    /// Wraps the cursors of the segment with the lower id and the one with the
    /// higher id. Fails with [`CursorError::EmptyMerge`] when both are absent.
    pub fn try_new(
        lower_segment: Option<Cursor>,
        upper_segment: Option<Cursor>,
    ) -> Result<Self, CursorError> {
        if lower_segment.is_none() && upper_segment.is_none() {
            return Err(CursorError::EmptyMerge);
        }
        Ok(Self::new(lower_segment, upper_segment))
    }

    /// Callers guarantee at least one half is present.
    pub(crate) fn new(lower_segment: Option<Cursor>, upper_segment: Option<Cursor>) -> Self {
        Self::with_advancement(lower_segment, upper_segment, false, false)
    }

    pub(crate) fn with_advancement(
        lower_segment: Option<Cursor>,
        upper_segment: Option<Cursor>,
        lower_advanced: bool,
        upper_advanced: bool,
    ) -> Self {
        Self {
            lower_segment,
            upper_segment,
            lower_advanced,
            upper_advanced,
        }
    }

    /// Combines two segment cursors, skipping the merged state when there is
    /// nothing to reconcile: equal halves yield that cursor and two absent halves
    /// yield no cursor.
    pub fn merge(lower_segment: Option<Cursor>, upper_segment: Option<Cursor>) -> Option<Cursor> {
        collapse(lower_segment, upper_segment)
    }

    pub fn lower_segment(&self) -> Option<&Cursor> {
        self.lower_segment.as_ref()
    }

    pub fn upper_segment(&self) -> Option<&Cursor> {
        self.upper_segment.as_ref()
    }

    /// Whether the last advance moved the lower half.
    pub fn is_lower_segment_advanced(&self) -> bool {
        self.lower_advanced
    }

    /// Whether the last advance moved the upper half.
    pub fn is_upper_segment_advanced(&self) -> bool {
        self.upper_advanced
    }
}

/// Collapses equal halves into one cursor and two absent halves into none;
/// anything else stays merged with cleared advance flags.
fn collapse(lower: Option<Cursor>, upper: Option<Cursor>) -> Option<Cursor> {
    match (lower, upper) {
        (None, None) => None,
        (Some(lower), Some(upper)) if lower == upper => Some(lower),
        (lower, upper) => Some(Cursor::Merged(Box::new(MergedCursor::new(lower, upper)))),
    }
}

/// Moves one half towards `target`.
///
/// An unstarted half jumps to `target`. A decorated half that already covers
/// `target` is left alone so it never rewinds; otherwise it advances itself.
/// A plain half takes the upper bound.
fn advance_half(current: Option<&Cursor>, target: &Cursor) -> Result<Cursor, CursorError> {
    let Some(cursor) = current else {
        return Ok(target.clone());
    };
    match cursor {
        Cursor::Replay(replay) => advance_decorated(cursor, &**replay, target),
        Cursor::Merged(merged) => advance_decorated(cursor, &**merged, target),
        plain => plain.upper_bound(target),
    }
}

fn advance_decorated<D: DecoratorCursor>(
    cursor: &Cursor,
    decorator: &D,
    target: &Cursor,
) -> Result<Cursor, CursorError> {
    if cursor.covers(target)? {
        Ok(cursor.clone())
    } else {
        decorator.advanced_to(target)
    }
}

fn half_covers(half: Option<&Cursor>, other: &Cursor) -> Result<bool, CursorError> {
    match half {
        Some(cursor) => cursor.covers(other),
        None => Ok(false),
    }
}

impl PositionCursor for MergedCursor {
    fn lower_bound(&self, other: &Cursor) -> Result<Cursor, CursorError> {
        let lower = self
            .lower_segment
            .as_ref()
            .map(|half| half.lower_bound(other))
            .transpose()?;
        let upper = self
            .upper_segment
            .as_ref()
            .map(|half| half.lower_bound(other))
            .transpose()?;
        collapse(lower, upper).ok_or(CursorError::EmptyMerge)
    }

    /// Incorporates `other` into each half the same way an advance would.
    fn upper_bound(&self, other: &Cursor) -> Result<Cursor, CursorError> {
        let lower = advance_half(self.lower_segment.as_ref(), other)?;
        let upper = advance_half(self.upper_segment.as_ref(), other)?;
        collapse(Some(lower), Some(upper)).ok_or(CursorError::EmptyMerge)
    }

    /// Only as strong as the weaker half; an unstarted half covers nothing.
    fn covers(&self, other: &Cursor) -> Result<bool, CursorError> {
        if !half_covers(self.lower_segment.as_ref(), other)? {
            return Ok(false);
        }
        half_covers(self.upper_segment.as_ref(), other)
    }
}

impl DecoratorCursor for MergedCursor {
    fn advanced_to(&self, new_cursor: &Cursor) -> Result<Cursor, CursorError> {
        let lower = advance_half(self.lower_segment.as_ref(), new_cursor)?;
        let upper = advance_half(self.upper_segment.as_ref(), new_cursor)?;
        let lower_advanced = self.lower_segment.as_ref() != Some(&lower);
        let upper_advanced = self.upper_segment.as_ref() != Some(&upper);
        if lower_advanced && upper_advanced && lower == upper {
            return Ok(lower);
        }
        Ok(Cursor::Merged(Box::new(Self::with_advancement(
            Some(lower),
            Some(upper),
            lower_advanced,
            upper_advanced,
        ))))
    }

    /// Follows whichever half moved on the last advance, lower half first.
    ///
    /// When neither half moved this returns `None` even if an untouched half
    /// holds a `T`.
    fn unwrap_as<T: CursorVariant>(&self) -> Option<&T> {
        if let Some(this) = T::project(CursorRef::Merged(self)) {
            return Some(this);
        }
        if self.lower_advanced {
            capability::unwrap_as(self.lower_segment.as_ref())
        } else if self.upper_advanced {
            capability::unwrap_as(self.upper_segment.as_ref())
        } else {
            None
        }
    }

    fn absolute_lower_bound(&self) -> Result<Option<Cursor>, CursorError> {
        let lower = resolve_lower_bound(self.lower_segment.as_ref())?;
        let upper = resolve_lower_bound(self.upper_segment.as_ref())?;
        match (lower, upper) {
            (Some(lower), Some(upper)) => lower.lower_bound(&upper).map(Some),
            _ => Ok(None),
        }
    }

    fn absolute_upper_bound(&self) -> Result<Option<Cursor>, CursorError> {
        let lower = resolve_upper_bound(self.lower_segment.as_ref())?;
        let upper = resolve_upper_bound(self.upper_segment.as_ref())?;
        match (lower, upper) {
            (Some(lower), Some(upper)) => lower.upper_bound(&upper).map(Some),
            _ => Ok(None),
        }
    }
}

impl PartialEq for MergedCursor {
    fn eq(&self, other: &Self) -> bool {
        self.lower_segment == other.lower_segment && self.upper_segment == other.upper_segment
    }
}

impl Eq for MergedCursor {}

impl Hash for MergedCursor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.lower_segment.hash(state);
        self.upper_segment.hash(state);
    }
}

/// True when `cursor` is, or wraps, a merged cursor whose halves have not converged.
pub fn is_merge_in_progress(cursor: Option<&Cursor>) -> bool {
    capability::unwrap_as::<MergedCursor>(cursor).is_some()
}

/// Position at which the pending merge completes: the position of the merged
/// cursor's absolute upper bound. `None` when no merge is in progress or the
/// bound has no numeric position.
pub fn merge_position(cursor: Option<&Cursor>) -> Result<Option<u64>, CursorError> {
    let Some(merged) = capability::unwrap_as::<MergedCursor>(cursor) else {
        return Ok(None);
    };
    Ok(merged
        .absolute_upper_bound()?
        .and_then(|bound| bound.position()))
}
