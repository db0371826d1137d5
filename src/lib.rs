//! CEPtra progress cursor algebra.
//!
//! Tracks how far each stream segment has been read and reconciles the cursors
//! of segments that were split and are being merged back together.

pub mod app;
pub mod codec;
pub mod config;
pub mod cursor;
pub mod logging;
pub mod progress;

pub use codec::{CodecError, CursorCodec, PersistedCursor};
pub use config::{ConfigError, CursorConfig};
pub use cursor::{
    advance, is_merge_in_progress, is_replay, merge_position, resolve_lower_bound,
    resolve_upper_bound, unwrap_as, Cursor, CursorError, CursorKind, CursorRef, CursorVariant,
    DecoratorCursor, MergedCursor, PartitionOffsetCursor, PositionCursor, ReplayCursor,
    SequenceCursor,
};
pub use logging::{JsonLineLogger, LogFile, LogLevel, LogRotationPolicy, LoggingError};
pub use progress::{AdvanceOutcome, ProgressError, SegmentProgress};
