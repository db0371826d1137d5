use super::capability::{self, advance, resolve_lower_bound, resolve_upper_bound};
use super::{Cursor, CursorError, CursorRef, CursorVariant, DecoratorCursor, PositionCursor};
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// Decorator marking a segment that was reset and is re-processing entries it
/// already handled before the reset.
///
/// `token_at_reset` is the position the segment had reached when it was reset;
/// `current` is how far the replay has progressed. Once the replay moves past
/// `token_at_reset` the decorator drops away and the plain cursor is returned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayCursor {
    token_at_reset: Cursor,
    #[serde(default)]
    current: Option<Cursor>,
    #[serde(skip, default = "resume_replaying")]
    replaying: bool,
}

fn resume_replaying() -> bool {
    true
}

impl ReplayCursor {
    /// Creates a replay cursor that is still behind `token_at_reset`.
    pub fn new(token_at_reset: Cursor, current: Option<Cursor>) -> Self {
        Self::with_progress(token_at_reset, current, true)
    }

    fn with_progress(token_at_reset: Cursor, current: Option<Cursor>, replaying: bool) -> Self {
        Self {
            token_at_reset,
            current,
            replaying,
        }
    }

    /// Builds the cursor a reset segment should start from.
    ///
    /// Without a `token_at_reset` there is nothing to replay and `start` is
    /// returned. Resetting an already replaying segment keeps the original reset
    /// point. When `start` already covers the reset point no replay is needed.
    pub fn create(
        token_at_reset: Option<Cursor>,
        start: Option<Cursor>,
    ) -> Result<Option<Cursor>, CursorError> {
        let Some(reset) = token_at_reset else {
            return Ok(start);
        };
        let reset = match reset {
            Cursor::Replay(nested) => {
                let nested = *nested;
                nested.token_at_reset
            }
            other => other,
        };
        if let Some(start) = &start {
            if let Some(floor) = resolve_lower_bound(Some(&reset))? {
                if start.covers(&floor)? {
                    return Ok(Some(start.clone()));
                }
            }
        }
        Ok(Some(Cursor::Replay(Box::new(Self::new(reset, start)))))
    }

    pub fn token_at_reset(&self) -> &Cursor {
        &self.token_at_reset
    }

    pub fn current(&self) -> Option<&Cursor> {
        self.current.as_ref()
    }

    /// Whether the entry that produced this cursor had been processed before the reset.
    pub fn is_replaying(&self) -> bool {
        self.replaying
    }

    fn lowered(&self, current: Option<Cursor>) -> Cursor {
        Cursor::Replay(Box::new(Self::new(self.token_at_reset.clone(), current)))
    }
}

/// True when `cursor` is, or wraps, a replay cursor that is still replaying.
pub fn is_replay(cursor: Option<&Cursor>) -> bool {
    capability::unwrap_as::<ReplayCursor>(cursor).is_some_and(ReplayCursor::is_replaying)
}

impl PositionCursor for ReplayCursor {
    fn lower_bound(&self, other: &Cursor) -> Result<Cursor, CursorError> {
        let theirs = match other {
            Cursor::Replay(replay) => replay.current.as_ref(),
            other => Some(other),
        };
        let current = match (&self.current, theirs) {
            (Some(mine), Some(theirs)) => Some(mine.lower_bound(theirs)?),
            _ => None,
        };
        Ok(self.lowered(current))
    }

    fn upper_bound(&self, other: &Cursor) -> Result<Cursor, CursorError> {
        match other {
            Cursor::Replay(replay) => match &replay.current {
                Some(theirs) => self.advanced_to(theirs),
                None => Ok(Cursor::Replay(Box::new(self.clone()))),
            },
            other => self.advanced_to(other),
        }
    }

    fn covers(&self, other: &Cursor) -> Result<bool, CursorError> {
        let Some(mine) = &self.current else {
            return Ok(false);
        };
        match other {
            Cursor::Replay(replay) => match &replay.current {
                Some(theirs) => mine.covers(theirs),
                None => Ok(true),
            },
            other => mine.covers(other),
        }
    }

    fn position(&self) -> Option<u64> {
        self.current.as_ref().and_then(|current| current.position())
    }
}

impl DecoratorCursor for ReplayCursor {
    fn advanced_to(&self, new_cursor: &Cursor) -> Result<Cursor, CursorError> {
        let reset_reached = match resolve_upper_bound(Some(&self.token_at_reset))? {
            Some(bound) => new_cursor.covers(&bound)?,
            None => true,
        };
        if reset_reached && !self.token_at_reset.covers(new_cursor)? {
            // Replay is over; a decorated reset point keeps its own bookkeeping.
            return advance(Some(&self.token_at_reset), new_cursor);
        }
        if self.token_at_reset.covers(new_cursor)? {
            return Ok(Cursor::Replay(Box::new(Self::with_progress(
                self.token_at_reset.clone(),
                Some(new_cursor.clone()),
                true,
            ))));
        }
        // New entry that was never seen before the reset, but the replay is not done yet.
        let token_at_reset = self.token_at_reset.upper_bound(new_cursor)?;
        let current = advance(Some(&self.token_at_reset), new_cursor)?;
        Ok(Cursor::Replay(Box::new(Self::with_progress(
            token_at_reset,
            Some(current),
            false,
        ))))
    }

    fn unwrap_as<T: CursorVariant>(&self) -> Option<&T> {
        T::project(CursorRef::Replay(self)).or_else(|| capability::unwrap_as(self.current.as_ref()))
    }

    fn absolute_lower_bound(&self) -> Result<Option<Cursor>, CursorError> {
        resolve_lower_bound(self.current.as_ref())
    }

    fn absolute_upper_bound(&self) -> Result<Option<Cursor>, CursorError> {
        resolve_upper_bound(self.current.as_ref())
    }
}

impl PartialEq for ReplayCursor {
    fn eq(&self, other: &Self) -> bool {
        self.token_at_reset == other.token_at_reset && self.current == other.current
    }
}

impl Eq for ReplayCursor {}

impl Hash for ReplayCursor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.token_at_reset.hash(state);
        self.current.hash(state);
    }
}
