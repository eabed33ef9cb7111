//! GPS metadata writing
//!
//! The tag set is written into a temporary copy placed next to the photo,
//! which is then renamed over the original. A failure at any step leaves
//! the original file untouched.

use crate::error::{Error, Result};
use crate::gps::{GpsTags, Rational};
use little_exif::exif_tag::ExifTag;
use little_exif::metadata::Metadata;
use little_exif::rational::uR64;
use std::fs;
use std::path::Path;
use tracing::{debug, trace, warn};

/// Destination of computed positions
pub trait GeoWriter: Sync {
    /// Persist the position into the photo's metadata in place
    fn write_geolocation(
        &self,
        path: &Path,
        latitude: f64,
        longitude: f64,
        altitude: f64,
    ) -> Result<()>;
}

/// Writes EXIF GPS tags in place with little_exif
#[derive(Debug, Clone, Copy)]
pub struct ExifGeoWriter {
    /// Restore the original modification time afterwards
    pub preserve_mtime: bool,
}

impl Default for ExifGeoWriter {
    fn default() -> Self {
        Self {
            preserve_mtime: true,
        }
    }
}

impl ExifGeoWriter {
    pub fn new(preserve_mtime: bool) -> Self {
        Self { preserve_mtime }
    }
}

impl GeoWriter for ExifGeoWriter {
    fn write_geolocation(
        &self,
        path: &Path,
        latitude: f64,
        longitude: f64,
        altitude: f64,
    ) -> Result<()> {
        let tags = GpsTags::from_position(latitude, longitude, altitude)?;
        let exif_tags = exif_gps_tags(&tags).ok_or(Error::ExifWrite {
            path: path.to_path_buf(),
            message: format!(
                "position {}, {} ({} m) exceeds EXIF rational range",
                latitude, longitude, altitude
            ),
        })?;

        let original_mtime = fs::metadata(path)?.modified().ok();

        // Stage next to the original so the final rename stays on one filesystem.
        // little_exif picks the container format from the extension.
        let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
        let suffix = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e))
            .unwrap_or_default();
        let staged = tempfile::Builder::new()
            .prefix(".geotag-")
            .suffix(&suffix)
            .tempfile_in(dir)?;
        fs::copy(path, staged.path())?;
        trace!(?path, staged = ?staged.path(), "Staged copy for GPS write");

        let write_err = |message: String| Error::ExifWrite {
            path: path.to_path_buf(),
            message,
        };

        let mut metadata = Metadata::new_from_path(staged.path())
            .map_err(|e| write_err(format!("failed to read metadata: {}", e)))?;
        for tag in exif_tags {
            metadata.set_tag(tag);
        }
        metadata
            .write_to_file(staged.path())
            .map_err(|e| write_err(format!("failed to write metadata: {}", e)))?;

        staged.persist(path).map_err(|e| write_err(e.error.to_string()))?;

        if self.preserve_mtime
            && let Some(mtime) = original_mtime
        {
            if let Err(e) =
                filetime::set_file_mtime(path, filetime::FileTime::from_system_time(mtime))
            {
                warn!(?path, error = %e, "Failed to restore modification time");
            }
        }

        debug!(?path, latitude, longitude, altitude, "Wrote GPS tags");
        Ok(())
    }
}

/// Map the encoded tag set onto little_exif tags
fn exif_gps_tags(tags: &GpsTags) -> Option<Vec<ExifTag>> {
    Some(vec![
        ExifTag::GPSVersionID(GpsTags::VERSION_ID.to_vec()),
        ExifTag::GPSLatitudeRef(tags.latitude_ref.to_string()),
        ExifTag::GPSLatitude(unsigned_rationals(&tags.latitude)?),
        ExifTag::GPSLongitudeRef(tags.longitude_ref.to_string()),
        ExifTag::GPSLongitude(unsigned_rationals(&tags.longitude)?),
        ExifTag::GPSAltitudeRef(vec![tags.altitude_ref]),
        ExifTag::GPSAltitude(unsigned_rationals(&[tags.altitude])?),
    ])
}

fn unsigned_rationals(values: &[Rational]) -> Option<Vec<uR64>> {
    values
        .iter()
        .map(|r| {
            r.to_exif_pair()
                .map(|(nominator, denominator)| uR64 { nominator, denominator })
        })
        .collect()
}
