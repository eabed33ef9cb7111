//! Timeline-path parsing
//!
//! Entries look like:
//!
//! ```json
//! {
//!   "startTime": "2023-01-01T00:00:00.000Z",
//!   "timelinePath": [
//!     { "point": "geo:10.0,20.0", "durationMinutesOffsetFromStartTime": "30" }
//!   ]
//! }
//! ```
//!
//! Unlike the flat list, a malformed point only drops that point.

use super::{LocationRecord, parse_history_timestamp};
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;
use tracing::{trace, warn};

/// `geo:<lat>,<lon>` in decimal degrees
static POINT_PATTERN: OnceLock<Regex> = OnceLock::new();

fn point_pattern() -> &'static Regex {
    POINT_PATTERN.get_or_init(|| {
        Regex::new(r"^geo:\s*([-+]?\d+(?:\.\d+)?),\s*([-+]?\d+(?:\.\d+)?)$").unwrap()
    })
}

/// Parse a top-level timeline array.
///
/// Returns the records in file order, the number of points dropped with a
/// warning, and the number of entries ignored for carrying no path.
pub fn parse_timeline(entries: Vec<Value>) -> (Vec<LocationRecord>, usize, usize) {
    let mut records = Vec::new();
    let mut skipped = 0usize;
    let mut ignored = 0usize;

    for (idx, entry) in entries.iter().enumerate() {
        let Some((start_time, path)) = timeline_path(entry) else {
            trace!(idx, "Ignoring timeline entry without a path");
            ignored += 1;
            continue;
        };

        let Some(start) = parse_history_timestamp(start_time) else {
            warn!(idx, start_time, points = path.len(), "Skipping timeline entry with invalid startTime");
            skipped += path.len();
            continue;
        };

        for (point_idx, point) in path.iter().enumerate() {
            match parse_path_point(point, start) {
                Ok(record) => records.push(record),
                Err(reason) => {
                    warn!(idx, point_idx, reason, "Skipping timeline point");
                    skipped += 1;
                }
            }
        }
    }

    (records, skipped, ignored)
}

/// Extract `startTime` and `timelinePath` when the entry has both
fn timeline_path(entry: &Value) -> Option<(&str, &Vec<Value>)> {
    let object = entry.as_object()?;
    let start_time = object.get("startTime")?.as_str()?;
    let path = object.get("timelinePath")?.as_array()?;
    Some((start_time, path))
}

/// Build one record from a path point relative to the entry start
fn parse_path_point(point: &Value, start: f64) -> Result<LocationRecord, &'static str> {
    let object: &Map<String, Value> = point.as_object().ok_or("point is not an object")?;

    let (latitude, longitude) = object
        .get("point")
        .and_then(Value::as_str)
        .and_then(parse_geo_point)
        .ok_or("malformed point string")?;

    let offset_minutes = object
        .get("durationMinutesOffsetFromStartTime")
        .and_then(offset_minutes)
        .ok_or("malformed durationMinutesOffsetFromStartTime")?;

    Ok(LocationRecord::new(
        start + offset_minutes as f64 * 60.0,
        latitude,
        longitude,
        0.0,
    ))
}

/// Parse `geo:<lat>,<lon>` into decimal degrees
pub fn parse_geo_point(s: &str) -> Option<(f64, f64)> {
    let caps = point_pattern().captures(s.trim())?;
    let latitude = caps[1].parse::<f64>().ok()?;
    let longitude = caps[2].parse::<f64>().ok()?;
    Some((latitude, longitude))
}

/// Offsets are whole minutes, sent as a number or a numeric string
fn offset_minutes(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}
