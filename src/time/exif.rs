//! EXIF capture time and GPS presence for images

use crate::error::{Error, Result};
use chrono::{NaiveDate, NaiveDateTime};
use exif::{Exif, In, Reader, Tag, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::trace;

fn read_exif(path: &Path) -> Result<Exif> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);

    Reader::new()
        .read_from_container(&mut reader)
        .map_err(|e| Error::ExifRead {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

/// Extract the original capture time (`DateTimeOriginal`)
pub fn extract_capture_time(path: &Path) -> Result<NaiveDateTime> {
    let exif = read_exif(path)?;

    let field = exif
        .get_field(Tag::DateTimeOriginal, In::PRIMARY)
        .ok_or_else(|| Error::ExifRead {
            path: path.to_path_buf(),
            message: "No DateTimeOriginal tag found in EXIF data".to_string(),
        })?;

    let parsed = match field.value {
        Value::Ascii(ref parts) => parts.first().and_then(|raw| parse_exif_ascii(raw)),
        _ => None,
    }
    .or_else(|| parse_exif_datetime(&field.display_value().to_string()));

    match parsed {
        Some(datetime) => {
            trace!(?path, %datetime, "Found EXIF capture time");
            Ok(datetime)
        }
        None => Err(Error::ExifRead {
            path: path.to_path_buf(),
            message: "Malformed DateTimeOriginal value".to_string(),
        }),
    }
}

/// Whether the image already has a GPS latitude
pub fn has_gps_position(path: &Path) -> bool {
    read_exif(path)
        .map(|exif| exif.get_field(Tag::GPSLatitude, In::PRIMARY).is_some())
        .unwrap_or(false)
}

/// Decode the raw ASCII value, e.g. `b"2024:01:15 14:30:00"`
fn parse_exif_ascii(raw: &[u8]) -> Option<NaiveDateTime> {
    let dt = exif::DateTime::from_ascii(raw).ok()?;
    NaiveDate::from_ymd_opt(i32::from(dt.year), u32::from(dt.month), u32::from(dt.day))?
        .and_hms_opt(u32::from(dt.hour), u32::from(dt.minute), u32::from(dt.second))
}

/// Parse EXIF datetime string format: "YYYY:MM:DD HH:MM:SS"
fn parse_exif_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim().trim_matches('"');

    let formats = [
        "%Y:%m:%d %H:%M:%S",
        "%Y:%m:%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
    ];

    for format in formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use std::io::Write;

    #[test]
    fn test_parse_exif_ascii() {
        let dt = parse_exif_ascii(b"2024:01:15 14:30:05").unwrap();
        assert_eq!((dt.year(), dt.month(), dt.day()), (2024, 1, 15));
        assert_eq!((dt.hour(), dt.minute(), dt.second()), (14, 30, 5));

        assert!(parse_exif_ascii(b"0000:00:00 00:00:00").is_none());
        assert!(parse_exif_ascii(b"garbage").is_none());
    }

    #[test]
    fn test_parse_exif_datetime() {
        let dt = parse_exif_datetime("2024:01:15 14:30:00").unwrap();
        assert_eq!(dt.year(), 2024);
        assert_eq!(dt.hour(), 14);

        let dt = parse_exif_datetime("\"2024:01:15 14:30:00\"").unwrap();
        assert_eq!(dt.day(), 15);

        let dt = parse_exif_datetime("2024-01-15 14:30:00").unwrap();
        assert_eq!(dt.minute(), 30);

        assert!(parse_exif_datetime("invalid").is_none());
    }

    #[test]
    fn test_file_without_exif() {
        let mut file = tempfile::Builder::new().suffix(".jpg").tempfile().unwrap();
        file.write_all(b"not really a jpeg").unwrap();

        let err = extract_capture_time(file.path()).unwrap_err();
        assert!(matches!(err, Error::ExifRead { .. }));
        assert!(!has_gps_position(file.path()));
    }
}
