//! Capture time extraction
//!
//! Photos record their capture time as a naive `DateTimeOriginal` EXIF
//! string. It is converted to epoch seconds according to the configured
//! [`CaptureClock`].

pub mod exif;

use crate::config::CaptureClock;
use crate::error::{Error, Result};
use chrono::{Local, NaiveDateTime, TimeZone};
use std::path::Path;
use tracing::trace;

/// Source of photo capture times
pub trait CaptureTimeReader: Sync {
    /// Capture time in epoch seconds, or an error when the photo has none
    fn read_capture_timestamp(&self, path: &Path) -> Result<f64>;

    /// Whether the photo already carries a GPS position
    fn has_geolocation(&self, _path: &Path) -> bool {
        false
    }
}

/// Reads `DateTimeOriginal` with kamadak-exif
#[derive(Debug, Clone, Copy, Default)]
pub struct ExifCaptureReader {
    pub clock: CaptureClock,
}

impl ExifCaptureReader {
    pub fn new(clock: CaptureClock) -> Self {
        Self { clock }
    }
}

impl CaptureTimeReader for ExifCaptureReader {
    fn read_capture_timestamp(&self, path: &Path) -> Result<f64> {
        let naive = exif::extract_capture_time(path)?;
        let timestamp = to_epoch_seconds(naive, self.clock).ok_or_else(|| Error::ExifRead {
            path: path.to_path_buf(),
            message: format!("capture time {} does not exist in the local time zone", naive),
        })?;
        trace!(?path, %naive, timestamp, "Resolved capture time");
        Ok(timestamp)
    }

    fn has_geolocation(&self, path: &Path) -> bool {
        exif::has_gps_position(path)
    }
}

/// Interpret a naive capture time on the given clock.
///
/// Returns `None` for local times skipped by a DST transition.
pub fn to_epoch_seconds(naive: NaiveDateTime, clock: CaptureClock) -> Option<f64> {
    let seconds = match clock {
        CaptureClock::Utc => naive.and_utc().timestamp(),
        CaptureClock::Local => Local.from_local_datetime(&naive).earliest()?.timestamp(),
    };
    Some(seconds as f64)
}
