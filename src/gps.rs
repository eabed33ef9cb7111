//! Coordinate conversions for EXIF GPS tags
//!
//! EXIF stores latitude/longitude as three unsigned rationals
//! (degrees, minutes, seconds) plus a hemisphere letter, and altitude as a
//! rational magnitude plus an above/below sea level flag.

use crate::error::{Error, Result};

/// Cardinal labels for latitude, `[negative, positive]`
pub const LATITUDE_LABELS: [&str; 2] = ["S", "N"];
/// Cardinal labels for longitude, `[negative, positive]`
pub const LONGITUDE_LABELS: [&str; 2] = ["W", "E"];

/// `GPSAltitudeRef` value for altitudes above sea level
pub const ABOVE_SEA_LEVEL: u8 = 0;
/// `GPSAltitudeRef` value for altitudes at or below sea level
pub const BELOW_SEA_LEVEL: u8 = 1;

/// Degrees/minutes/seconds split of a decimal angle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dms {
    pub degrees: u32,
    pub minutes: u32,
    /// Rounded to 5 decimal places
    pub seconds: f64,
    /// Empty for exactly zero
    pub label: &'static str,
}

/// Exact fraction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rational {
    pub numerator: i64,
    pub denominator: u64,
}

impl Rational {
    /// Unsigned 32-bit pair as stored in EXIF `RATIONAL` fields
    pub fn to_exif_pair(&self) -> Option<(u32, u32)> {
        Some((
            u32::try_from(self.numerator).ok()?,
            u32::try_from(self.denominator).ok()?,
        ))
    }

    pub fn to_f64(&self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }
}

/// Convert decimal degrees to degrees, minutes and seconds.
///
/// `labels` is `[negative, positive]`, e.g. [`LATITUDE_LABELS`].
pub fn to_deg(value: f64, labels: [&'static str; 2]) -> Dms {
    let label = if value < 0.0 {
        labels[0]
    } else if value > 0.0 {
        labels[1]
    } else {
        ""
    };

    let abs_value = value.abs();
    let degrees = abs_value.floor();
    let total_minutes = (abs_value - degrees) * 60.0;
    let minutes = total_minutes.floor();
    let seconds = round_to((total_minutes - minutes) * 60.0, 5);

    Dms {
        degrees: degrees as u32,
        minutes: minutes as u32,
        seconds,
        label,
    }
}

/// Exact fraction of a number's shortest decimal representation.
///
/// `40.7128` becomes `50891/1250`. Returns `None` for non-finite values and
/// values whose digits do not fit in 64 bits.
pub fn to_rational(number: f64) -> Option<Rational> {
    if !number.is_finite() {
        return None;
    }

    // Display for f64 is the shortest round-trip form and never uses exponents
    let text = number.to_string();
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.as_str()),
    };
    let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits, ""));

    let scale = 10u64.checked_pow(u32::try_from(frac_part.len()).ok()?)?;
    let magnitude: u64 = format!("{}{}", int_part, frac_part).parse().ok()?;

    let divisor = gcd(magnitude, scale);
    let numerator = i64::try_from(magnitude / divisor).ok()?;

    Some(Rational {
        numerator: if negative { -numerator } else { numerator },
        denominator: scale / divisor,
    })
}

/// `S` for negative latitudes, `N` otherwise (including zero)
pub fn latitude_ref(latitude: f64) -> &'static str {
    if latitude < 0.0 { "S" } else { "N" }
}

/// `W` for negative longitudes, `E` otherwise (including zero)
pub fn longitude_ref(longitude: f64) -> &'static str {
    if longitude < 0.0 { "W" } else { "E" }
}

/// Sea level counts as below
pub fn altitude_ref(altitude: f64) -> u8 {
    if altitude > 0.0 {
        ABOVE_SEA_LEVEL
    } else {
        BELOW_SEA_LEVEL
    }
}

/// Fully encoded GPS tag values for one position
#[derive(Debug, Clone, PartialEq)]
pub struct GpsTags {
    pub latitude_ref: &'static str,
    pub latitude: [Rational; 3],
    pub longitude_ref: &'static str,
    pub longitude: [Rational; 3],
    pub altitude_ref: u8,
    /// Always non-negative
    pub altitude: Rational,
}

impl GpsTags {
    /// `GPSVersionID` written alongside the position
    pub const VERSION_ID: [u8; 4] = [2, 0, 0, 0];

    pub fn from_position(latitude: f64, longitude: f64, altitude: f64) -> Result<Self> {
        Ok(Self {
            latitude_ref: latitude_ref(latitude),
            latitude: dms_rationals(to_deg(latitude, LATITUDE_LABELS))?,
            longitude_ref: longitude_ref(longitude),
            longitude: dms_rationals(to_deg(longitude, LONGITUDE_LABELS))?,
            altitude_ref: altitude_ref(altitude),
            altitude: exact(altitude.abs())?,
        })
    }
}

fn dms_rationals(dms: Dms) -> Result<[Rational; 3]> {
    Ok([
        exact(f64::from(dms.degrees))?,
        exact(f64::from(dms.minutes))?,
        exact(dms.seconds)?,
    ])
}

fn exact(value: f64) -> Result<Rational> {
    to_rational(value).ok_or(Error::GpsEncoding { value })
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_deg_south() {
        let dms = to_deg(-40.7128, LATITUDE_LABELS);
        assert_eq!(dms.degrees, 40);
        assert_eq!(dms.minutes, 42);
        assert!((dms.seconds - 46.08).abs() < 1e-9, "seconds {}", dms.seconds);
        assert_eq!(dms.label, "S");
    }

    #[test]
    fn test_to_deg_labels() {
        assert_eq!(to_deg(74.006, LONGITUDE_LABELS).label, "E");
        assert_eq!(to_deg(-74.006, LONGITUDE_LABELS).label, "W");
        assert_eq!(to_deg(0.0, LATITUDE_LABELS).label, "");

        let zero = to_deg(0.0, LATITUDE_LABELS);
        assert_eq!((zero.degrees, zero.minutes, zero.seconds), (0, 0, 0.0));
    }

    #[test]
    fn test_to_deg_seconds_rounded() {
        let dms = to_deg(10.123456789, LATITUDE_LABELS);
        assert_eq!(dms.degrees, 10);
        assert_eq!(dms.minutes, 7);
        assert_eq!(dms.seconds, 24.44444);
    }

    #[test]
    fn test_to_rational_exact() {
        let r = to_rational(40.7128).unwrap();
        assert_eq!(r, Rational { numerator: 50891, denominator: 1250 });
        assert_eq!(r.to_f64(), 40.7128);

        assert_eq!(to_rational(46.08).unwrap(), Rational { numerator: 1152, denominator: 25 });
        assert_eq!(to_rational(40.0).unwrap(), Rational { numerator: 40, denominator: 1 });
        assert_eq!(to_rational(0.0).unwrap(), Rational { numerator: 0, denominator: 1 });
        assert_eq!(to_rational(-0.5).unwrap(), Rational { numerator: -1, denominator: 2 });
        assert_eq!(to_rational(1e-7).unwrap(), Rational { numerator: 1, denominator: 10_000_000 });
    }

    #[test]
    fn test_to_rational_rejects_unrepresentable() {
        assert!(to_rational(f64::NAN).is_none());
        assert!(to_rational(f64::INFINITY).is_none());
        assert!(to_rational(1e30).is_none());
    }

    #[test]
    fn test_exif_pair() {
        assert_eq!(to_rational(46.08).unwrap().to_exif_pair(), Some((1152, 25)));
        assert_eq!(to_rational(-1.5).unwrap().to_exif_pair(), None);
    }

    #[test]
    fn test_references() {
        assert_eq!(latitude_ref(-0.1), "S");
        assert_eq!(latitude_ref(0.0), "N");
        assert_eq!(longitude_ref(-0.1), "W");
        assert_eq!(longitude_ref(0.0), "E");
        assert_eq!(altitude_ref(12.0), ABOVE_SEA_LEVEL);
        assert_eq!(altitude_ref(0.0), BELOW_SEA_LEVEL);
        assert_eq!(altitude_ref(-3.0), BELOW_SEA_LEVEL);
    }

    #[test]
    fn test_gps_tags() {
        let tags = GpsTags::from_position(-40.7128, -74.006, -12.5).unwrap();
        assert_eq!(tags.latitude_ref, "S");
        assert_eq!(tags.longitude_ref, "W");
        assert_eq!(tags.latitude[0], Rational { numerator: 40, denominator: 1 });
        assert_eq!(tags.latitude[1], Rational { numerator: 42, denominator: 1 });
        assert_eq!(tags.latitude[2].to_f64(), to_deg(-40.7128, LATITUDE_LABELS).seconds);
        assert_eq!(tags.altitude_ref, BELOW_SEA_LEVEL);
        assert_eq!(tags.altitude, Rational { numerator: 25, denominator: 2 });
    }
}
