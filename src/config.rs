use crate::codec::CursorCodec;
use crate::logging::{LogLevel, LogRotationPolicy};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

const DEFAULT_LOG_MAX_BYTES: usize = 1 << 20;
const DEFAULT_LOG_MAX_FILES: usize = 4;

/// Runtime knobs for cursor tracking. Every field is optional in the JSON form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CursorConfig {
    pub log_level: LogLevel,
    pub log_max_bytes: usize,
    pub log_max_files: usize,
    /// Reject persisted cursors whose checksum does not match their payload.
    pub verify_checksums: bool,
}

impl Default for CursorConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            log_max_bytes: DEFAULT_LOG_MAX_BYTES,
            log_max_files: DEFAULT_LOG_MAX_FILES,
            verify_checksums: true,
        }
    }
}

impl CursorConfig {
    /// Builds a validated config from a JSON object.
    pub fn from_value(value: Value) -> Result<Self, ConfigError> {
        if !value.is_object() {
            return Err(ConfigError::Invalid(
                "cursor config must be a JSON object".into(),
            ));
        }
        let config: Self = serde_json::from_value(value).map_err(ConfigError::Decode)?;
        config.validate()
    }

    /// Reads and validates a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();
        let payload = fs::read_to_string(path_ref).map_err(|source| ConfigError::Read {
            path: path_ref.to_path_buf(),
            source,
        })?;
        let value: Value =
            serde_json::from_str(&payload).map_err(|source| ConfigError::Parse {
                path: path_ref.to_path_buf(),
                source,
            })?;
        Self::from_value(value)
    }

    pub fn rotation_policy(&self) -> LogRotationPolicy {
        LogRotationPolicy {
            max_bytes: self.log_max_bytes,
            max_files: self.log_max_files,
        }
    }

    pub fn codec(&self) -> CursorCodec {
        CursorCodec::new(self.verify_checksums)
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if self.log_max_bytes == 0 {
            return Err(ConfigError::Invalid(
                "log_max_bytes must be greater than zero".into(),
            ));
        }
        if self.log_max_files == 0 {
            return Err(ConfigError::Invalid(
                "log_max_files must be greater than zero".into(),
            ));
        }
        Ok(self)
    }
}

/// Errors surfaced while loading cursor configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read cursor config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse cursor config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid cursor config: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("invalid cursor config: {0}")]
    Invalid(String),
}
