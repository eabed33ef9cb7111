//! Match acceptance policy

use crate::error::Result;
use crate::index::{MatchResult, TemporalIndex};

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Decides whether the nearest location sample is close enough in time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchPolicy {
    /// Maximum gap in hours, exclusive
    pub tolerance_hours: f64,
    /// Hours added to every capture time before matching
    pub time_offset_hours: f64,
}

/// Outcome of matching one capture time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchDecision<'a> {
    pub matched: MatchResult<'a>,
    pub accepted: bool,
}

impl Default for MatchPolicy {
    fn default() -> Self {
        Self {
            tolerance_hours: 1.0,
            time_offset_hours: 0.0,
        }
    }
}

impl MatchPolicy {
    pub fn new(tolerance_hours: f64, time_offset_hours: f64) -> Self {
        Self {
            tolerance_hours,
            time_offset_hours,
        }
    }

    /// Capture time shifted by the configured offset
    pub fn corrected_timestamp(&self, capture_timestamp: f64) -> f64 {
        capture_timestamp + self.time_offset_hours * SECONDS_PER_HOUR
    }

    /// A gap equal to the tolerance is rejected
    pub fn accepts(&self, matched: &MatchResult<'_>) -> bool {
        matched.delta_seconds / SECONDS_PER_HOUR < self.tolerance_hours
    }

    /// Correct the capture time, look up the nearest record and judge it
    pub fn evaluate<'a>(
        &self,
        index: &'a TemporalIndex,
        capture_timestamp: f64,
    ) -> Result<MatchDecision<'a>> {
        let matched = index.nearest(self.corrected_timestamp(capture_timestamp))?;
        Ok(MatchDecision {
            accepted: self.accepts(&matched),
            matched,
        })
    }
}
