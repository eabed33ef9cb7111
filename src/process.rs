//! Geotagging pipeline with Rayon parallel processing
//!
//! Handles the core logic of:
//! - Collecting photos from the photo directory
//! - Loading the location history into a temporal index
//! - Matching each capture time against the index
//! - Writing accepted positions back into the photos

use crate::config::Config;
use crate::error::{Error, Result};
use crate::history::load_history;
use crate::index::TemporalIndex;
use crate::matching::MatchPolicy;
use crate::time::{CaptureTimeReader, ExifCaptureReader};
use crate::writer::{ExifGeoWriter, GeoWriter};
use chrono::DateTime;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{Level, debug, error, info, span, warn};
use walkdir::WalkDir;

/// Result of processing a single photo
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoResult {
    /// Photo path
    pub source: PathBuf,
    /// Processing status
    pub status: GeotagStatus,
    /// Gap to the nearest location sample (absent when no match was attempted)
    pub delta_seconds: Option<f64>,
    /// Latitude/longitude written (or that would be written in a dry run)
    pub position: Option<(f64, f64)>,
    /// Skip reason or error message
    pub error: Option<String>,
}

/// Status of photo processing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeotagStatus {
    /// Nearest sample within tolerance, position written
    Geotagged,
    /// Nearest sample outside tolerance, nothing written
    NotGeotagged,
    /// No capture time, or already tagged
    Skipped,
    /// Match accepted but the write failed
    Failed,
    /// Dry run - would have been geotagged
    DryRun,
}

/// Processing statistics
#[derive(Debug, Default)]
pub struct GeotagStats {
    pub total_files: AtomicUsize,
    pub geotagged: AtomicUsize,
    pub not_geotagged: AtomicUsize,
    pub skipped: AtomicUsize,
    pub failed: AtomicUsize,
}

impl GeotagStats {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, status: GeotagStatus) {
        let counter = match status {
            GeotagStatus::Geotagged | GeotagStatus::DryRun => &self.geotagged,
            GeotagStatus::NotGeotagged => &self.not_geotagged,
            GeotagStatus::Skipped => &self.skipped,
            GeotagStatus::Failed => &self.failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn summary(&self) -> String {
        format!(
            "Total: {}, Geotagged: {}, Not geotagged: {}, Skipped: {}, Failed: {}",
            self.total_files.load(Ordering::Relaxed),
            self.geotagged.load(Ordering::Relaxed),
            self.not_geotagged.load(Ordering::Relaxed),
            self.skipped.load(Ordering::Relaxed),
            self.failed.load(Ordering::Relaxed)
        )
    }
}

/// Drives the per-photo geotagging loop
pub struct Geotagger<R = ExifCaptureReader, W = ExifGeoWriter> {
    config: Config,
    policy: MatchPolicy,
    reader: R,
    writer: W,
    stats: GeotagStats,
}

impl Geotagger {
    /// Create a geotagger reading and writing EXIF metadata
    pub fn new(config: Config) -> Self {
        let reader = ExifCaptureReader::new(config.capture_clock);
        let writer = ExifGeoWriter::new(config.preserve_mtime);
        Self::with_collaborators(config, reader, writer)
    }
}

impl<R: CaptureTimeReader, W: GeoWriter> Geotagger<R, W> {
    /// Create a geotagger with custom metadata collaborators
    pub fn with_collaborators(config: Config, reader: R, writer: W) -> Self {
        // Configure Rayon thread pool
        if config.threads > 0 {
            rayon::ThreadPoolBuilder::new()
                .num_threads(config.threads)
                .build_global()
                .ok(); // Ignore if already initialized
        }

        Self {
            policy: MatchPolicy::new(config.tolerance_hours, config.time_offset_hours),
            config,
            reader,
            writer,
            stats: GeotagStats::new(),
        }
    }

    /// Run the whole pipeline.
    ///
    /// Fails before touching any photo when the photo directory is
    /// unreadable or empty, or when the history yields no locations.
    pub fn run(&self) -> Result<Vec<PhotoResult>> {
        let _span = span!(Level::INFO, "geotag_run").entered();

        info!(photo_dir = %self.config.photo_dir.display(), "Scanning photo directory...");
        let photos = self.collect_photos()?;
        if photos.is_empty() {
            return Err(Error::NoPhotos {
                path: self.config.photo_dir.clone(),
            });
        }
        info!(count = photos.len(), "Selected photos to geotag");

        info!(history = %self.config.history_file.display(), "Loading location data (can take a while)...");
        let index = self.load_index()?;

        Ok(self.geotag_photos(&photos, &index))
    }

    /// Parse the history file and sort it into an index
    pub fn load_index(&self) -> Result<TemporalIndex> {
        let parsed = load_history(&self.config.history_file)?;
        let index = TemporalIndex::new(parsed.records);

        let Some((first, last)) = index.span() else {
            return Err(Error::EmptyHistory {
                path: self.config.history_file.clone(),
            });
        };

        info!(
            locations = index.len(),
            from = %format_epoch(first),
            to = %format_epoch(last),
            "Found locations"
        );

        Ok(index)
    }

    /// Match and tag every photo; results keep the order of `photos`
    pub fn geotag_photos(&self, photos: &[PathBuf], index: &TemporalIndex) -> Vec<PhotoResult> {
        self.stats.total_files.store(photos.len(), Ordering::Relaxed);

        let results: Vec<PhotoResult> = photos
            .par_iter()
            .map(|path| {
                let _photo_span = span!(Level::DEBUG, "geotag_photo", ?path).entered();
                let result = self.process_photo(path, index);
                self.stats.record(result.status);
                result
            })
            .collect();

        info!(summary = %self.stats.summary(), "Geotagging complete");
        results
    }

    /// Collect photos with a supported extension, sorted by path
    pub fn collect_photos(&self) -> Result<Vec<PathBuf>> {
        let dir = &self.config.photo_dir;

        // Surface an unreadable root as a fatal error rather than an empty list
        fs::read_dir(dir).map_err(|e| Error::PhotoDirOpen {
            path: dir.clone(),
            message: e.to_string(),
        })?;

        let max_depth = if self.config.recursive { usize::MAX } else { 1 };
        let mut photos = Vec::new();

        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(max_depth)
            .follow_links(true)
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "Failed to read directory entry, skipping");
                    continue;
                }
            };

            let path = entry.path();
            if entry.file_type().is_file()
                && let Some(ext) = path.extension().and_then(|e| e.to_str())
                && self.config.is_supported(ext)
            {
                photos.push(path.to_path_buf());
            }
        }

        photos.sort();
        debug!(count = photos.len(), extensions = ?self.config.extensions(), "Collected photos");

        Ok(photos)
    }

    fn process_photo(&self, path: &Path, index: &TemporalIndex) -> PhotoResult {
        let mut result = PhotoResult {
            source: path.to_path_buf(),
            status: GeotagStatus::Skipped,
            delta_seconds: None,
            position: None,
            error: None,
        };

        if self.config.skip_existing_gps && self.reader.has_geolocation(path) {
            debug!(?path, "Photo already has a GPS position, skipping");
            result.error = Some("already geotagged".to_string());
            return result;
        }

        let capture_timestamp = match self.reader.read_capture_timestamp(path) {
            Ok(ts) => ts,
            Err(e) => {
                warn!(?path, error = %e, "No capture time, skipping");
                result.error = Some(e.to_string());
                return result;
            }
        };

        let decision = match self.policy.evaluate(index, capture_timestamp) {
            Ok(decision) => decision,
            Err(e) => {
                error!(?path, error = %e, "Failed to match capture time");
                result.status = GeotagStatus::Failed;
                result.error = Some(e.to_string());
                return result;
            }
        };

        let record = decision.matched.record;
        result.delta_seconds = Some(decision.matched.delta_seconds);

        if !decision.accepted {
            debug!(?path, delta_seconds = decision.matched.delta_seconds, "Nearest location outside tolerance");
            result.status = GeotagStatus::NotGeotagged;
            return result;
        }

        if self.config.dry_run {
            result.status = GeotagStatus::DryRun;
            result.position = Some((record.latitude, record.longitude));
            return result;
        }

        match self
            .writer
            .write_geolocation(path, record.latitude, record.longitude, record.altitude)
        {
            Ok(()) => {
                result.status = GeotagStatus::Geotagged;
                result.position = Some((record.latitude, record.longitude));
            }
            Err(e) => {
                error!(?path, error = %e, "Failed to write GPS data");
                result.status = GeotagStatus::Failed;
                result.error = Some(e.to_string());
            }
        }

        result
    }

    pub fn stats(&self) -> &GeotagStats {
        &self.stats
    }
}

fn format_epoch(seconds: f64) -> String {
    DateTime::from_timestamp(seconds.floor() as i64, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| seconds.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Capture times keyed by file name; unknown names have none
    struct FakeReader {
        times: HashMap<String, f64>,
        tagged: Vec<String>,
    }

    impl FakeReader {
        fn new(times: &[(&str, f64)]) -> Self {
            Self {
                times: times.iter().map(|(n, t)| (n.to_string(), *t)).collect(),
                tagged: Vec::new(),
            }
        }
    }

    fn file_name(path: &Path) -> String {
        path.file_name().unwrap().to_string_lossy().into_owned()
    }

    impl CaptureTimeReader for FakeReader {
        fn read_capture_timestamp(&self, path: &Path) -> Result<f64> {
            self.times
                .get(&file_name(path))
                .copied()
                .ok_or_else(|| Error::ExifRead {
                    path: path.to_path_buf(),
                    message: "No DateTimeOriginal tag found in EXIF data".to_string(),
                })
        }

        fn has_geolocation(&self, path: &Path) -> bool {
            self.tagged.contains(&file_name(path))
        }
    }

    /// Records every write; names in `fail` return an error
    #[derive(Default)]
    struct FakeWriter {
        writes: Mutex<Vec<(String, f64, f64, f64)>>,
        fail: Vec<String>,
    }

    impl GeoWriter for FakeWriter {
        fn write_geolocation(
            &self,
            path: &Path,
            latitude: f64,
            longitude: f64,
            altitude: f64,
        ) -> Result<()> {
            let name = file_name(path);
            if self.fail.contains(&name) {
                return Err(Error::ExifWrite {
                    path: path.to_path_buf(),
                    message: "disk full".to_string(),
                });
            }
            self.writes
                .lock()
                .unwrap()
                .push((name, latitude, longitude, altitude));
            Ok(())
        }
    }

    fn history_json() -> &'static str {
        // Samples at t = 0, 3600, 7200
        r#"{"locations": [
            {"timestamp": "1970-01-01T01:00:00Z", "latitudeE7": 20000000, "longitudeE7": -20000000, "altitude": 5},
            {"timestamp": "1970-01-01T00:00:00Z", "latitudeE7": 10000000, "longitudeE7": -10000000},
            {"timestamp": "1970-01-01T02:00:00.000Z", "latitudeE7": 30000000, "longitudeE7": -30000000}
        ]}"#
    }

    fn setup(photos: &[&str]) -> (tempfile::TempDir, Config) {
        let dir = tempfile::tempdir().unwrap();
        let photo_dir = dir.path().join("photos");
        fs::create_dir_all(&photo_dir).unwrap();
        for name in photos {
            fs::write(photo_dir.join(name), b"").unwrap();
        }
        let history_file = dir.path().join("Records.json");
        fs::write(&history_file, history_json()).unwrap();

        let config = Config {
            history_file,
            photo_dir,
            ..Config::default()
        };
        (dir, config)
    }

    #[test]
    fn test_end_to_end_accepts_nearest() {
        let (_dir, config) = setup(&["a.jpg"]);
        let tagger =
            Geotagger::with_collaborators(config, FakeReader::new(&[("a.jpg", 3700.0)]), FakeWriter::default());

        let results = tagger.run().unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].status, GeotagStatus::Geotagged);
        assert_eq!(results[0].delta_seconds, Some(100.0));
        assert_eq!(results[0].position, Some((2.0, -2.0)));

        let writes = tagger.writer.writes.lock().unwrap();
        assert_eq!(writes.as_slice(), &[("a.jpg".to_string(), 2.0, -2.0, 5.0)]);
    }

    #[test]
    fn test_rejects_outside_tolerance() {
        let (_dir, config) = setup(&["far.jpg"]);
        let tagger = Geotagger::with_collaborators(
            config,
            FakeReader::new(&[("far.jpg", 7200.0 + 3600.0)]),
            FakeWriter::default(),
        );

        let results = tagger.run().unwrap();
        assert_eq!(results[0].status, GeotagStatus::NotGeotagged);
        assert_eq!(results[0].delta_seconds, Some(3600.0));
        assert_eq!(results[0].position, None);
        assert!(tagger.writer.writes.lock().unwrap().is_empty());
    }

    #[test]
    fn test_mixed_outcomes_keep_input_order() {
        let (_dir, mut config) = setup(&["d.jpg", "b.JPG", "a.jpeg", "c.JPEG", "e.png", "notes.txt"]);
        config.tolerance_hours = 0.5;
        let reader = FakeReader::new(&[("a.jpeg", 0.0), ("b.JPG", 5400.0), ("d.jpg", 7100.0)]);
        let writer = FakeWriter {
            fail: vec!["d.jpg".to_string()],
            ..FakeWriter::default()
        };
        let tagger = Geotagger::with_collaborators(config, reader, writer);

        let results = tagger.run().unwrap();
        let names: Vec<String> = results.iter().map(|r| file_name(&r.source)).collect();
        assert_eq!(names, ["a.jpeg", "b.JPG", "c.JPEG", "d.jpg"]);

        assert_eq!(results[0].status, GeotagStatus::Geotagged);
        // tie at 5400 resolves to the 3600 sample, 1800 s is not < 0.5 h
        assert_eq!(results[1].status, GeotagStatus::NotGeotagged);
        assert_eq!(results[1].delta_seconds, Some(1800.0));
        assert_eq!(results[2].status, GeotagStatus::Skipped);
        assert!(results[2].error.is_some());
        assert_eq!(results[3].status, GeotagStatus::Failed);
        assert_eq!(results[3].delta_seconds, Some(100.0));

        let stats = tagger.stats();
        assert_eq!(stats.total_files.load(Ordering::Relaxed), 4);
        assert_eq!(stats.geotagged.load(Ordering::Relaxed), 1);
        assert_eq!(stats.not_geotagged.load(Ordering::Relaxed), 1);
        assert_eq!(stats.skipped.load(Ordering::Relaxed), 1);
        assert_eq!(stats.failed.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_time_offset_shifts_capture_time() {
        let (_dir, mut config) = setup(&["a.jpg"]);
        config.time_offset_hours = -1.0;
        let tagger = Geotagger::with_collaborators(
            config,
            FakeReader::new(&[("a.jpg", 7200.0)]),
            FakeWriter::default(),
        );

        let results = tagger.run().unwrap();
        assert_eq!(results[0].position, Some((2.0, -2.0)));
        assert_eq!(results[0].delta_seconds, Some(0.0));
    }

    #[test]
    fn test_dry_run_does_not_write() {
        let (_dir, mut config) = setup(&["a.jpg"]);
        config.dry_run = true;
        let tagger = Geotagger::with_collaborators(
            config,
            FakeReader::new(&[("a.jpg", 10.0)]),
            FakeWriter::default(),
        );

        let results = tagger.run().unwrap();
        assert_eq!(results[0].status, GeotagStatus::DryRun);
        assert_eq!(results[0].position, Some((1.0, -1.0)));
        assert!(tagger.writer.writes.lock().unwrap().is_empty());
    }

    #[test]
    fn test_skip_existing_gps() {
        let (_dir, mut config) = setup(&["a.jpg", "b.jpg"]);
        config.skip_existing_gps = true;
        let mut reader = FakeReader::new(&[("a.jpg", 10.0), ("b.jpg", 10.0)]);
        reader.tagged.push("a.jpg".to_string());
        let tagger = Geotagger::with_collaborators(config, reader, FakeWriter::default());

        let results = tagger.run().unwrap();
        assert_eq!(results[0].status, GeotagStatus::Skipped);
        assert_eq!(results[1].status, GeotagStatus::Geotagged);
    }

    #[test]
    fn test_empty_photo_directory_aborts() {
        let (_dir, config) = setup(&["readme.txt", "image.png"]);
        let tagger = Geotagger::with_collaborators(config, FakeReader::new(&[]), FakeWriter::default());

        assert!(matches!(tagger.run(), Err(Error::NoPhotos { .. })));
        assert_eq!(tagger.stats().total_files.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_missing_photo_directory_aborts() {
        let (dir, mut config) = setup(&[]);
        config.photo_dir = dir.path().join("nope");
        let tagger = Geotagger::with_collaborators(config, FakeReader::new(&[]), FakeWriter::default());

        assert!(matches!(tagger.run(), Err(Error::PhotoDirOpen { .. })));
    }

    #[test]
    fn test_missing_history_aborts() {
        let (dir, mut config) = setup(&["a.jpg"]);
        config.history_file = dir.path().join("missing.json");
        let tagger = Geotagger::with_collaborators(config, FakeReader::new(&[]), FakeWriter::default());

        assert!(matches!(tagger.run(), Err(Error::HistoryOpen { .. })));
    }

    #[test]
    fn test_empty_history_aborts() {
        let (_dir, config) = setup(&["a.jpg"]);
        fs::write(&config.history_file, r#"{"locations": []}"#).unwrap();
        let tagger = Geotagger::with_collaborators(
            config,
            FakeReader::new(&[("a.jpg", 0.0)]),
            FakeWriter::default(),
        );

        assert!(matches!(tagger.run(), Err(Error::EmptyHistory { .. })));
        assert!(tagger.writer.writes.lock().unwrap().is_empty());
    }

    #[test]
    fn test_collect_photos_recursive_and_raw() {
        let (_dir, mut config) = setup(&["top.jpg", "raw.ARW"]);
        let nested = config.photo_dir.join("day2");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("inner.jpg"), b"").unwrap();

        let tagger = Geotagger::with_collaborators(config.clone(), FakeReader::new(&[]), FakeWriter::default());
        let photos = tagger.collect_photos().unwrap();
        assert_eq!(photos.len(), 1);

        config.recursive = true;
        config.include_raw = true;
        let tagger = Geotagger::with_collaborators(config, FakeReader::new(&[]), FakeWriter::default());
        let names: Vec<String> = tagger.collect_photos().unwrap().iter().map(|p| file_name(p)).collect();
        assert_eq!(names, ["inner.jpg", "raw.ARW", "top.jpg"]);
    }

    #[test]
    fn test_stats_summary() {
        let stats = GeotagStats::new();
        stats.record(GeotagStatus::Geotagged);
        stats.record(GeotagStatus::DryRun);
        stats.record(GeotagStatus::Failed);

        let summary = stats.summary();
        assert!(summary.contains("Geotagged: 2"));
        assert!(summary.contains("Failed: 1"));
    }
}
