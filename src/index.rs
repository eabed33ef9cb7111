//! Time-sorted location index with nearest-timestamp lookup

use crate::error::{Error, Result};
use crate::history::LocationRecord;

/// Location records sorted ascending by timestamp.
///
/// Built once from a parsed history and read-only afterwards, so it can be
/// shared across worker threads without locking.
#[derive(Debug, Clone, Default)]
pub struct TemporalIndex {
    records: Vec<LocationRecord>,
}

/// Closest record to a queried timestamp
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchResult<'a> {
    pub record: &'a LocationRecord,
    /// `|target - record.timestamp|`, never negative
    pub delta_seconds: f64,
}

impl TemporalIndex {
    /// Sort the records once and take ownership of them.
    ///
    /// The sort is stable, so records sharing a timestamp keep file order.
    pub fn new(mut records: Vec<LocationRecord>) -> Self {
        records.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[LocationRecord] {
        &self.records
    }

    /// First and last timestamps covered by the index
    pub fn span(&self) -> Option<(f64, f64)> {
        Some((self.records.first()?.timestamp, self.records.last()?.timestamp))
    }

    /// Find the record closest in time to `target`.
    ///
    /// Targets outside the covered range clamp to the first or last record.
    /// When both neighbours are equally far away the earlier one wins.
    pub fn nearest(&self, target: f64) -> Result<MatchResult<'_>> {
        if self.records.is_empty() {
            return Err(Error::EmptyIndex);
        }

        // Leftmost insertion position
        let pos = self.records.partition_point(|r| r.timestamp < target);

        let record = if pos == 0 {
            &self.records[0]
        } else if pos == self.records.len() {
            &self.records[pos - 1]
        } else {
            let before = &self.records[pos - 1];
            let after = &self.records[pos];
            if after.timestamp - target < target - before.timestamp {
                after
            } else {
                before
            }
        };

        Ok(MatchResult {
            record,
            delta_seconds: (target - record.timestamp).abs(),
        })
    }
}
