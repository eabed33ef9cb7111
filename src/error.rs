//! Error types for the geotagger

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for geotagger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the geotagger
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to open location history {path}: {source}")]
    HistoryOpen {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse location history {path}: {source}")]
    HistoryParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Unrecognized location history layout in {path}: expected an object with \"locations\" or a top-level array")]
    UnrecognizedHistory { path: PathBuf },

    #[error("Failed to parse timestamp from {source_info}: {message}")]
    TimestampParse { source_info: String, message: String },

    #[error("Location history {path} contains no usable locations")]
    EmptyHistory { path: PathBuf },

    #[error("Nearest-timestamp query against an empty index")]
    EmptyIndex,

    #[error("Failed to open photo directory {path}: {message}")]
    PhotoDirOpen { path: PathBuf, message: String },

    #[error("No photos with a supported extension found in {path}")]
    NoPhotos { path: PathBuf },

    #[error("Failed to read EXIF data from {path}: {message}")]
    ExifRead { path: PathBuf, message: String },

    #[error("Failed to write GPS data to {path}: {message}")]
    ExifWrite { path: PathBuf, message: String },

    #[error("Value {value} cannot be stored as an EXIF rational")]
    GpsEncoding { value: f64 },
}
