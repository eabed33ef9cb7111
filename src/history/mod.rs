//! Location history loading
//!
//! Two export layouts are supported and told apart by the shape of the
//! top-level JSON value:
//! - an object whose `locations` key holds flat records (`records`)
//! - a top-level array of timeline entries with `timelinePath` points (`timeline`)
//!
//! Both are normalized into [`LocationRecord`] values in decimal degrees.

pub mod records;
pub mod timeline;

use crate::error::{Error, Result};
use chrono::NaiveDateTime;
use serde::Serialize;
use serde_json::Value;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{debug, info};

/// Accepted ISO-8601 layouts for history timestamps, in priority order
const HISTORY_TIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.fZ", "%Y-%m-%dT%H:%M:%SZ"];

/// A single normalized location sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LocationRecord {
    /// Seconds since the Unix epoch (UTC)
    pub timestamp: f64,
    /// Decimal degrees, negative = South
    pub latitude: f64,
    /// Decimal degrees, negative = West
    pub longitude: f64,
    /// Meters, 0 when the source has none
    pub altitude: f64,
}

impl LocationRecord {
    pub fn new(timestamp: f64, latitude: f64, longitude: f64, altitude: f64) -> Self {
        Self {
            timestamp,
            latitude,
            longitude,
            altitude,
        }
    }
}

/// Layout of a location history export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryFormat {
    /// `{"locations": [...]}` with E7 fixed-point coordinates
    Records,
    /// `[{"startTime": ..., "timelinePath": [...]}, ...]`
    Timeline,
}

impl HistoryFormat {
    /// Sniff the layout from the top-level JSON value
    pub fn detect(root: &Value) -> Option<Self> {
        match root {
            Value::Object(map) if map.get("locations").is_some_and(Value::is_array) => {
                Some(HistoryFormat::Records)
            }
            Value::Array(_) => Some(HistoryFormat::Timeline),
            _ => None,
        }
    }
}

/// Output of parsing a history document
#[derive(Debug, Clone)]
pub struct ParsedHistory {
    pub format: HistoryFormat,
    /// Records in file order (not yet sorted)
    pub records: Vec<LocationRecord>,
    /// Entries or points dropped with a warning
    pub skipped: usize,
    /// Entries carrying no location data
    pub ignored: usize,
}

/// Read and parse a location history file
pub fn load_history(path: &Path) -> Result<ParsedHistory> {
    let file = File::open(path).map_err(|e| Error::HistoryOpen {
        path: path.to_path_buf(),
        source: e,
    })?;

    let root: Value =
        serde_json::from_reader(BufReader::new(file)).map_err(|e| Error::HistoryParse {
            path: path.to_path_buf(),
            source: e,
        })?;

    let parsed = parse_history(root).ok_or_else(|| Error::UnrecognizedHistory {
        path: path.to_path_buf(),
    })??;

    info!(
        path = %path.display(),
        format = ?parsed.format,
        records = parsed.records.len(),
        skipped = parsed.skipped,
        ignored = parsed.ignored,
        "Parsed location history"
    );

    Ok(parsed)
}

/// Parse an already-decoded history document.
///
/// Returns `None` when the layout is not recognized.
pub fn parse_history(root: Value) -> Option<Result<ParsedHistory>> {
    let format = HistoryFormat::detect(&root)?;
    debug!(?format, "Detected location history layout");

    let parsed = match (format, root) {
        (HistoryFormat::Records, Value::Object(mut map)) => match map.remove("locations") {
            Some(Value::Array(entries)) => {
                records::parse_records(entries).map(|(records, ignored)| ParsedHistory {
                    format,
                    records,
                    skipped: 0,
                    ignored,
                })
            }
            _ => return None,
        },
        (HistoryFormat::Timeline, Value::Array(entries)) => {
            let (records, skipped, ignored) = timeline::parse_timeline(entries);
            Ok(ParsedHistory {
                format,
                records,
                skipped,
                ignored,
            })
        }
        _ => return None,
    };

    Some(parsed)
}

/// Parse an ISO-8601 UTC timestamp (`...Z`, with or without fractional seconds)
/// into epoch seconds
pub fn parse_history_timestamp(s: &str) -> Option<f64> {
    for format in HISTORY_TIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            let utc = dt.and_utc();
            return Some(utc.timestamp() as f64 + f64::from(utc.timestamp_subsec_nanos()) / 1e9);
        }
    }
    None
}
