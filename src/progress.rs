//! Per-segment cursor bookkeeping for the stream processor.
//!
//! [`SegmentProgress`] owns the cursor of one segment and threads every
//! processed position through the cursor algebra, logging merge and collapse
//! transitions as they happen.

use crate::codec::{CodecError, CursorCodec, PersistedCursor};
use crate::config::CursorConfig;
use crate::cursor::{
    advance, is_merge_in_progress, merge_position, resolve_lower_bound, Cursor, CursorError,
    MergedCursor, PositionCursor,
};
use crate::logging::{JsonLineLogger, LogLevel, LoggingError};
use thiserror::Error;

const LOG_MODULE: &str = "ceptra_cursor::progress";

/// What a single [`SegmentProgress::advance`] did to the segment cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// The segment had no cursor and adopted the processed position.
    Started,
    /// The cursor already reflected the processed position.
    Unchanged,
    Advanced,
    /// A merge is still pending; the flags report which halves moved.
    Merging {
        lower_advanced: bool,
        upper_advanced: bool,
    },
    /// Both halves converged and the cursor collapsed to a single position.
    MergeCompleted,
}

/// Errors surfaced while tracking segment progress.
#[derive(Debug, Error)]
pub enum ProgressError {
    #[error(transparent)]
    Cursor(#[from] CursorError),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Logging(#[from] LoggingError),
}

/// Cursor of a single segment plus the logger recording its transitions.
#[derive(Debug, Clone)]
pub struct SegmentProgress {
    segment: String,
    cursor: Option<Cursor>,
    codec: CursorCodec,
    logger: JsonLineLogger,
}

impl SegmentProgress {
    /// Starts tracking `segment` from `cursor` (`None` when it never started).
    pub fn new(segment: impl Into<String>, cursor: Option<Cursor>, config: &CursorConfig) -> Self {
        let mut logger = JsonLineLogger::new(LOG_MODULE, config.rotation_policy());
        logger.set_level(config.log_level);
        Self {
            segment: segment.into(),
            cursor,
            codec: config.codec(),
            logger,
        }
    }

    /// Restores tracking from a checkpointed cursor.
    pub fn restore(
        segment: impl Into<String>,
        record: &PersistedCursor,
        config: &CursorConfig,
    ) -> Result<Self, ProgressError> {
        let cursor = config.codec().decode(record)?;
        Ok(Self::new(segment, cursor, config))
    }

    pub fn segment(&self) -> &str {
        &self.segment
    }

    pub fn cursor(&self) -> Option<&Cursor> {
        self.cursor.as_ref()
    }

    pub fn into_cursor(self) -> Option<Cursor> {
        self.cursor
    }

    pub fn logger(&self) -> &JsonLineLogger {
        &self.logger
    }

    pub fn set_log_level(&mut self, level: LogLevel) {
        self.logger.set_level(level);
    }

    pub fn is_merge_in_progress(&self) -> bool {
        is_merge_in_progress(self.cursor.as_ref())
    }

    /// Position at which the pending merge completes, if one is pending.
    pub fn merge_position(&self) -> Result<Option<u64>, ProgressError> {
        Ok(merge_position(self.cursor.as_ref())?)
    }

    /// Absorbs the sibling segment with the higher id: the current cursor
    /// becomes the lower half and `upper` the upper half.
    pub fn merge_with(&mut self, upper: Option<Cursor>, now_ms: u64) -> Result<(), ProgressError> {
        let lower = self.cursor.take();
        self.cursor = MergedCursor::merge(lower, upper);
        let message = if self.is_merge_in_progress() {
            "segments merged"
        } else {
            "segments merged at a common position"
        };
        self.logger.log(
            now_ms,
            LogLevel::Info,
            &self.segment,
            message,
            self.cursor.as_ref(),
        )?;
        Ok(())
    }

    /// Threads a processed position into the segment cursor.
    pub fn advance(
        &mut self,
        position: &Cursor,
        now_ms: u64,
    ) -> Result<AdvanceOutcome, ProgressError> {
        let was_merging = self.is_merge_in_progress();
        let next = advance(self.cursor.as_ref(), position)?;
        let outcome = if self.cursor.is_none() {
            AdvanceOutcome::Started
        } else if let Cursor::Merged(merged) = &next {
            AdvanceOutcome::Merging {
                lower_advanced: merged.is_lower_segment_advanced(),
                upper_advanced: merged.is_upper_segment_advanced(),
            }
        } else if was_merging && !is_merge_in_progress(Some(&next)) {
            AdvanceOutcome::MergeCompleted
        } else if self.cursor.as_ref() == Some(&next) {
            AdvanceOutcome::Unchanged
        } else {
            AdvanceOutcome::Advanced
        };
        let (level, message) = match outcome {
            AdvanceOutcome::MergeCompleted => (LogLevel::Info, "merge completed"),
            AdvanceOutcome::Started => (LogLevel::Debug, "segment started"),
            AdvanceOutcome::Unchanged => (LogLevel::Trace, "cursor unchanged"),
            AdvanceOutcome::Merging { .. } => (LogLevel::Debug, "merge advanced"),
            AdvanceOutcome::Advanced => (LogLevel::Debug, "cursor advanced"),
        };
        self.cursor = Some(next);
        self.logger
            .log(now_ms, level, &self.segment, message, self.cursor.as_ref())?;
        Ok(outcome)
    }

    /// Lowers the cursor to what both this segment and `sibling` have reached.
    /// A segment without a cursor stays without one.
    pub fn reconcile(&mut self, sibling: &Cursor, now_ms: u64) -> Result<(), ProgressError> {
        let Some(current) = &self.cursor else {
            return Ok(());
        };
        let lowered = current.lower_bound(sibling)?;
        self.cursor = Some(lowered);
        self.logger.log(
            now_ms,
            LogLevel::Debug,
            &self.segment,
            "cursor reconciled with sibling",
            self.cursor.as_ref(),
        )?;
        Ok(())
    }

    /// True when entries up to `position` still need processing.
    pub fn requires_replay(&self, position: &Cursor) -> Result<bool, ProgressError> {
        match &self.cursor {
            Some(cursor) => Ok(!cursor.covers(position)?),
            None => Ok(true),
        }
    }

    /// Distance between `head` and the position every part of the segment has reached.
    pub fn lag(&self, head: u64) -> Result<Option<u64>, ProgressError> {
        let bound = resolve_lower_bound(self.cursor.as_ref())?;
        Ok(bound
            .and_then(|bound| bound.position())
            .map(|position| head.saturating_sub(position)))
    }

    /// Encodes the current cursor for persistence.
    pub fn checkpoint(&self) -> Result<PersistedCursor, ProgressError> {
        Ok(self.codec.encode(self.cursor.as_ref())?)
    }
}
