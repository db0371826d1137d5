use crate::cursor::Cursor;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use thiserror::Error;

/// Severity levels accepted by the cursor logger.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Returns the canonical uppercase representation.
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rotation policy: the active file plus at most `max_files` rotated files are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogRotationPolicy {
    pub max_bytes: usize,
    pub max_files: usize,
}

impl Default for LogRotationPolicy {
    fn default() -> Self {
        Self {
            max_bytes: 1 << 20,
            max_files: 4,
        }
    }
}

/// Log lines accumulated for one rotated file.
#[derive(Debug, Default, Clone)]
pub struct LogFile {
    lines: Vec<String>,
    bytes_written: usize,
}

impl LogFile {
    /// Lines contained within this log file.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Total bytes recorded before rotation.
    pub fn bytes_written(&self) -> usize {
        self.bytes_written
    }
}

/// JSON-line logger that records cursor transitions for one component.
///
/// Each line carries the segment it concerns and, when given, the serialized
/// cursor the transition produced.
#[derive(Debug, Clone)]
pub struct JsonLineLogger {
    module: String,
    policy: LogRotationPolicy,
    current_level: LogLevel,
    files: VecDeque<LogFile>,
    active: LogFile,
}

impl JsonLineLogger {
    /// Creates a logger tagging every line with `module`.
    pub fn new(module: impl Into<String>, policy: LogRotationPolicy) -> Self {
        Self {
            module: module.into(),
            policy,
            current_level: LogLevel::Info,
            files: VecDeque::new(),
            active: LogFile::default(),
        }
    }

    /// Module name stamped on every line.
    pub fn module(&self) -> &str {
        &self.module
    }

    /// Returns the current log level.
    pub fn level(&self) -> LogLevel {
        self.current_level
    }

    /// Applies a dynamic log-level override.
    pub fn set_level(&mut self, level: LogLevel) {
        self.current_level = level;
    }

    /// True when an entry at `level` would be recorded.
    pub fn enabled(&self, level: LogLevel) -> bool {
        level >= self.current_level
    }

    /// Emits one JSON-line entry. Entries below the active level are dropped.
    pub fn log(
        &mut self,
        ts_ms: u64,
        level: LogLevel,
        segment: &str,
        message: &str,
        cursor: Option<&Cursor>,
    ) -> Result<(), LoggingError> {
        if !self.enabled(level) {
            return Ok(());
        }
        let record = LogRecord {
            ts: ts_ms,
            level: level.as_str(),
            module: &self.module,
            segment,
            message,
            cursor,
        };
        let line = serde_json::to_string(&record)?;
        self.rotate_if_needed(line.len());
        self.active.bytes_written = self.active.bytes_written.saturating_add(line.len());
        self.active.lines.push(line);
        Ok(())
    }

    /// Rotated history followed by the active file.
    pub fn files(&self) -> impl Iterator<Item = &LogFile> {
        self.files.iter().chain(std::iter::once(&self.active))
    }

    /// Every retained line, oldest first.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.files()
            .flat_map(|file| file.lines().iter().map(String::as_str))
    }

    fn rotate_if_needed(&mut self, next_line_len: usize) {
        if self.active.bytes_written + next_line_len <= self.policy.max_bytes {
            return;
        }
        if self.active.lines.is_empty() {
            return;
        }
        self.files.push_back(std::mem::take(&mut self.active));
        while self.files.len() > self.policy.max_files {
            self.files.pop_front();
        }
    }
}

/// Errors surfaced while serializing JSON-line logs.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("failed to serialize log record: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Serialize)]
struct LogRecord<'a> {
    ts: u64,
    level: &'static str,
    module: &'a str,
    segment: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    cursor: Option<&'a Cursor>,
}
