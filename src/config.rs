//! Configuration types for the geotagger

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Extensions always scanned (exact, case-variant match)
pub const PHOTO_EXTENSIONS: &[&str] = &["jpg", "JPG", "jpeg", "JPEG"];

/// Extra extensions scanned when RAW files are included
pub const RAW_EXTENSIONS: &[&str] = &["arw", "ARW"];

/// How the naive EXIF capture time is turned into an instant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CaptureClock {
    /// Camera wall-clock time is read as UTC; `time_offset_hours` corrects for the zone
    #[default]
    Utc,
    /// Camera clock follows this machine's local time zone
    Local,
}

/// Configuration for the geotagger
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Location history JSON export
    pub history_file: PathBuf,

    /// Directory holding the photos to geotag
    pub photo_dir: PathBuf,

    /// Maximum gap between capture time and location sample, in hours (exclusive)
    pub tolerance_hours: f64,

    /// Hours added to each capture time before matching
    pub time_offset_hours: f64,

    /// Clock the camera was set to
    pub capture_clock: CaptureClock,

    /// Also geotag Sony RAW (ARW) files
    pub include_raw: bool,

    /// Descend into sub-directories of the photo directory
    pub recursive: bool,

    /// Leave photos that already carry a GPS position untouched
    pub skip_existing_gps: bool,

    /// Restore the original modification time after writing
    pub preserve_mtime: bool,

    /// Number of threads for parallel processing (0 = auto)
    pub threads: usize,

    /// Dry run mode - match and report without writing
    pub dry_run: bool,

    /// Verbose output
    pub verbose: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            history_file: PathBuf::from("Records.json"),
            photo_dir: PathBuf::from("."),
            tolerance_hours: 1.0,
            time_offset_hours: 0.0,
            capture_clock: CaptureClock::default(),
            include_raw: false,
            recursive: false,
            skip_existing_gps: false,
            preserve_mtime: true,
            threads: 0, // Auto-detect
            dry_run: false,
            verbose: false,
        }
    }
}

impl Config {
    /// Extensions selected by this configuration
    pub fn extensions(&self) -> Vec<&'static str> {
        let mut extensions = PHOTO_EXTENSIONS.to_vec();
        if self.include_raw {
            extensions.extend_from_slice(RAW_EXTENSIONS);
        }
        extensions
    }

    /// Check if a file extension is selected (case variants are listed explicitly)
    pub fn is_supported(&self, ext: &str) -> bool {
        PHOTO_EXTENSIONS.contains(&ext) || (self.include_raw && RAW_EXTENSIONS.contains(&ext))
    }

    /// Reject values the matcher cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.tolerance_hours.is_finite() || self.tolerance_hours <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "tolerance_hours",
                message: format!("must be a positive number, got {}", self.tolerance_hours),
            });
        }
        if !self.time_offset_hours.is_finite() {
            return Err(ConfigError::InvalidValue {
                field: "time_offset_hours",
                message: format!("must be a finite number, got {}", self.time_offset_hours),
            });
        }
        Ok(())
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
                path: path.to_path_buf(),
                source: e,
            })?;
        }

        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::SerializeError {
            source: e,
        })?;

        fs::write(path, content).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(())
    }

    /// Generate a sample configuration file content
    pub fn sample_config() -> String {
        r#"# History Geotagger Configuration File
# This file uses TOML format (https://toml.io)

# Location history export (JSON)
# Either {"locations": [...]} records or a timeline array with "timelinePath" points
history_file = "D:/Takeout/Records.json"

# Directory with the photos to geotag
photo_dir = "D:/Photos/2023-Trip"

# Maximum time between capture and the nearest location sample, in hours
# A gap exactly equal to the tolerance is rejected
tolerance_hours = 1.0

# Hours added to each capture time before matching
# Example: -2 for a camera clock two hours ahead of the history's clock
time_offset_hours = 0.0

# How the camera's wall-clock time is read: "utc" or "local"
# "utc" reads it as UTC and relies on time_offset_hours for the zone;
# "local" converts it with this machine's time zone instead
capture_clock = "utc"

# Also geotag Sony RAW files (.arw / .ARW)
include_raw = false

# Scan sub-directories of photo_dir
recursive = false

# Leave photos that already have a GPS position untouched
skip_existing_gps = false

# Keep the original modification time of rewritten photos
preserve_mtime = true

# Number of threads for parallel processing (0 = auto-detect)
threads = 0

# Dry run mode - report matches without writing anything
dry_run = false

# Verbose output - show detailed processing information
verbose = false
"#
        .to_string()
    }
}

/// Errors that can occur when loading, saving or validating configuration
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read configuration file
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to parse configuration file
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
    /// Failed to write configuration file
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to serialize configuration
    SerializeError {
        source: toml::ser::Error,
    },
    /// A setting is out of range
    InvalidValue {
        field: &'static str,
        message: String,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError { path, source } => {
                write!(f, "Failed to read config file '{}': {}", path.display(), source)
            }
            ConfigError::ParseError { path, source } => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), source)
            }
            ConfigError::WriteError { path, source } => {
                write!(f, "Failed to write config file '{}': {}", path.display(), source)
            }
            ConfigError::SerializeError { source } => {
                write!(f, "Failed to serialize config: {}", source)
            }
            ConfigError::InvalidValue { field, message } => {
                write!(f, "Invalid value for '{}': {}", field, message)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::ReadError { source, .. } => Some(source),
            ConfigError::ParseError { source, .. } => Some(source),
            ConfigError::WriteError { source, .. } => Some(source),
            ConfigError::SerializeError { source } => Some(source),
            ConfigError::InvalidValue { .. } => None,
        }
    }
}
