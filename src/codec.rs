use crate::cursor::{Cursor, CursorKind};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Persisted form of a segment cursor, including its checksum.
///
/// `payload` is the tagged JSON form of the cursor, or `null` for a segment
/// that has not started. Transient advance/replay flags are never part of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedCursor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<CursorKind>,
    pub checksum: String,
    pub payload: String,
}

/// Errors surfaced while encoding or decoding persisted cursors.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("failed to serialize cursor: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("failed to deserialize cursor: {0}")]
    Deserialize(#[source] serde_json::Error),
    #[error("cursor checksum mismatch (recorded {expected}, computed {found})")]
    ChecksumMismatch { expected: String, found: String },
    #[error("persisted cursor kind {recorded} does not match payload kind {found}")]
    KindMismatch { recorded: String, found: String },
}

/// Encodes cursors into [`PersistedCursor`] records and validates them on load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorCodec {
    verify_checksums: bool,
}

impl Default for CursorCodec {
    fn default() -> Self {
        Self {
            verify_checksums: true,
        }
    }
}

impl CursorCodec {
    pub fn new(verify_checksums: bool) -> Self {
        Self { verify_checksums }
    }

    pub fn verifies_checksums(&self) -> bool {
        self.verify_checksums
    }

    pub fn encode(&self, cursor: Option<&Cursor>) -> Result<PersistedCursor, CodecError> {
        let payload = serde_json::to_string(&cursor).map_err(CodecError::Serialize)?;
        Ok(PersistedCursor {
            kind: cursor.map(Cursor::kind),
            checksum: compute_checksum(payload.as_bytes()),
            payload,
        })
    }

    /// Restores the cursor. Advance and replay flags come back at their defaults.
    ///
    /// The recorded `kind` must match the decoded payload; `none` stands for an
    /// unstarted segment.
    pub fn decode(&self, record: &PersistedCursor) -> Result<Option<Cursor>, CodecError> {
        if self.verify_checksums {
            let found = compute_checksum(record.payload.as_bytes());
            if found != record.checksum {
                return Err(CodecError::ChecksumMismatch {
                    expected: record.checksum.clone(),
                    found,
                });
            }
        }
        let cursor: Option<Cursor> =
            serde_json::from_str(&record.payload).map_err(CodecError::Deserialize)?;
        let found = cursor.as_ref().map(Cursor::kind);
        if found != record.kind {
            return Err(CodecError::KindMismatch {
                recorded: kind_name(record.kind),
                found: kind_name(found),
            });
        }
        Ok(cursor)
    }
}

fn kind_name(kind: Option<CursorKind>) -> String {
    kind.map_or("none", CursorKind::as_str).to_string()
}

fn compute_checksum(payload: &[u8]) -> String {
    let digest = Sha256::digest(payload);
    to_hex(&digest)
}

fn to_hex(bytes: &[u8]) -> String {
    let mut encoded = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        encoded.push_str(&format!("{:02x}", byte));
    }
    encoded
}
