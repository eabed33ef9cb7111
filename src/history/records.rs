//! Flat `locations` list parsing
//!
//! Each entry carries an ISO-8601 `timestamp` and E7 fixed-point
//! coordinates. The file is assumed homogeneous, so a timestamp in an
//! unknown layout aborts the whole parse.

use super::{LocationRecord, parse_history_timestamp};
use crate::error::{Error, Result};
use serde::Deserialize;
use serde_json::Value;
use tracing::trace;

/// Scale factor of `latitudeE7` / `longitudeE7`
const E7: f64 = 10_000_000.0;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRecord {
    timestamp: Option<String>,
    /// Older exports: epoch milliseconds, string or number
    timestamp_ms: Option<Value>,
    latitude_e7: i64,
    longitude_e7: i64,
    altitude: Option<f64>,
}

/// Parse the `locations` array.
///
/// Returns the records in file order and the number of entries ignored for
/// carrying no location data.
pub fn parse_records(entries: Vec<Value>) -> Result<(Vec<LocationRecord>, usize)> {
    let mut records = Vec::with_capacity(entries.len());
    let mut ignored = 0usize;

    for (idx, entry) in entries.into_iter().enumerate() {
        let raw: RawRecord = match serde_json::from_value(entry) {
            Ok(raw) => raw,
            Err(e) => {
                trace!(idx, error = %e, "Ignoring entry without location data");
                ignored += 1;
                continue;
            }
        };

        let timestamp = match (&raw.timestamp, &raw.timestamp_ms) {
            (Some(ts), _) => {
                parse_history_timestamp(ts).ok_or_else(|| Error::TimestampParse {
                    source_info: format!("locations[{}]", idx),
                    message: format!("no valid date format found for {:?}", ts),
                })?
            }
            (None, Some(ms)) => match timestamp_ms_seconds(ms) {
                Some(ts) => ts,
                None => {
                    return Err(Error::TimestampParse {
                        source_info: format!("locations[{}]", idx),
                        message: format!("invalid timestampMs {}", ms),
                    });
                }
            },
            (None, None) => {
                trace!(idx, "Ignoring entry without timestamp");
                ignored += 1;
                continue;
            }
        };

        records.push(LocationRecord::new(
            timestamp,
            raw.latitude_e7 as f64 / E7,
            raw.longitude_e7 as f64 / E7,
            raw.altitude.unwrap_or(0.0),
        ));
    }

    Ok((records, ignored))
}

/// Convert a `timestampMs` value to epoch seconds
fn timestamp_ms_seconds(value: &Value) -> Option<f64> {
    let ms = match value {
        Value::String(s) => s.trim().parse::<i64>().ok()?,
        Value::Number(n) => n.as_i64()?,
        _ => return None,
    };
    Some(ms as f64 / 1000.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_e7_scaling() {
        let (records, ignored) = parse_records(vec![json!({
            "timestamp": "2023-01-01T00:00:00.000Z",
            "latitudeE7": 407128000,
            "longitudeE7": -740060000
        })])
        .unwrap();

        assert_eq!(ignored, 0);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].latitude, 40.7128);
        assert_eq!(records[0].longitude, -74.006);
        assert_eq!(records[0].altitude, 0.0);
        assert_eq!(records[0].timestamp, 1_672_531_200.0);
    }

    #[test]
    fn test_altitude_and_order_preserved() {
        let (records, _) = parse_records(vec![
            json!({"timestamp": "2023-01-01T02:00:00Z", "latitudeE7": 1, "longitudeE7": 2, "altitude": -15}),
            json!({"timestamp": "2023-01-01T01:00:00Z", "latitudeE7": 3, "longitudeE7": 4}),
        ])
        .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].altitude, -15.0);
        assert!(records[0].timestamp > records[1].timestamp);
    }

    #[test]
    fn test_entries_without_location_are_ignored() {
        let (records, ignored) = parse_records(vec![
            json!({"timestamp": "2023-01-01T00:00:00Z"}),
            json!({"latitudeE7": 1, "longitudeE7": 2}),
            json!("not an object"),
            json!({"timestamp": "2023-01-01T00:00:00Z", "latitudeE7": 1, "longitudeE7": 2}),
        ])
        .unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(ignored, 3);
    }

    #[test]
    fn test_invalid_timestamp_is_fatal() {
        let err = parse_records(vec![
            json!({"timestamp": "2023-01-01T00:00:00Z", "latitudeE7": 1, "longitudeE7": 2}),
            json!({"timestamp": "01/01/2023", "latitudeE7": 1, "longitudeE7": 2}),
        ])
        .unwrap_err();

        match err {
            Error::TimestampParse { source_info, .. } => assert_eq!(source_info, "locations[1]"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_timestamp_ms_fallback() {
        let (records, _) = parse_records(vec![
            json!({"timestampMs": "1672531200500", "latitudeE7": 1, "longitudeE7": 2}),
            json!({"timestampMs": 1672531201000i64, "latitudeE7": 1, "longitudeE7": 2}),
        ])
        .unwrap();

        assert_eq!(records[0].timestamp, 1_672_531_200.5);
        assert_eq!(records[1].timestamp, 1_672_531_201.0);
    }

    #[test]
    fn test_timestamp_wins_over_timestamp_ms() {
        let (records, _) = parse_records(vec![json!({
            "timestamp": "2023-01-01T00:00:00Z",
            "timestampMs": "0",
            "latitudeE7": 1,
            "longitudeE7": 2
        })])
        .unwrap();

        assert_eq!(records[0].timestamp, 1_672_531_200.0);
    }
}
