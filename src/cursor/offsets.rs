use super::{Cursor, CursorError, CursorKind, PositionCursor};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-partition offset vector for sources that are only ordered within a partition.
///
/// A partition missing from the map has no processed entries. Comparison is
/// vector dominance: neither cursor covers the other when each is ahead on a
/// different partition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PartitionOffsetCursor {
    offsets: BTreeMap<String, u64>,
}

impl PartitionOffsetCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a cursor from `(partition, offset)` pairs; later duplicates win.
    pub fn from_offsets<P: Into<String>>(offsets: impl IntoIterator<Item = (P, u64)>) -> Self {
        Self {
            offsets: offsets
                .into_iter()
                .map(|(partition, offset)| (partition.into(), offset))
                .collect(),
        }
    }

    /// Returns a copy with `partition` moved to at least `offset`. Never rewinds.
    pub fn advanced_to_offset(&self, partition: impl Into<String>, offset: u64) -> Self {
        let mut offsets = self.offsets.clone();
        let entry = offsets.entry(partition.into()).or_insert(offset);
        *entry = (*entry).max(offset);
        Self { offsets }
    }

    pub fn offset(&self, partition: &str) -> Option<u64> {
        self.offsets.get(partition).copied()
    }

    pub fn offsets(&self) -> &BTreeMap<String, u64> {
        &self.offsets
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    fn comparable(other: &Cursor) -> Result<&PartitionOffsetCursor, CursorError> {
        match other {
            Cursor::PartitionOffsets(cursor) => Ok(cursor),
            other => Err(CursorError::incompatible(
                CursorKind::PartitionOffsets,
                other,
            )),
        }
    }
}

impl PositionCursor for PartitionOffsetCursor {
    fn lower_bound(&self, other: &Cursor) -> Result<Cursor, CursorError> {
        let other = Self::comparable(other)?;
        let offsets = self
            .offsets
            .iter()
            .filter_map(|(partition, offset)| {
                other
                    .offsets
                    .get(partition)
                    .map(|theirs| (partition.clone(), (*offset).min(*theirs)))
            })
            .collect();
        Ok(Cursor::PartitionOffsets(Self { offsets }))
    }

    fn upper_bound(&self, other: &Cursor) -> Result<Cursor, CursorError> {
        let other = Self::comparable(other)?;
        let mut offsets = self.offsets.clone();
        for (partition, offset) in &other.offsets {
            let entry = offsets.entry(partition.clone()).or_insert(*offset);
            *entry = (*entry).max(*offset);
        }
        Ok(Cursor::PartitionOffsets(Self { offsets }))
    }

    fn covers(&self, other: &Cursor) -> Result<bool, CursorError> {
        let other = Self::comparable(other)?;
        Ok(other.offsets.iter().all(|(partition, offset)| {
            self.offsets
                .get(partition)
                .is_some_and(|mine| mine >= offset)
        }))
    }

    /// Sum of all partition offsets.
    fn position(&self) -> Option<u64> {
        Some(
            self.offsets
                .values()
                .fold(0u64, |total, offset| total.saturating_add(*offset)),
        )
    }
}
