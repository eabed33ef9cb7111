//! History Geotagger - geotag photos from an exported location history
//!
//! This library matches each photo's capture time to the closest sample of
//! a location history and writes that position into the photo's EXIF data:
//! - Flat `locations` records and timeline-path exports
//! - Binary search over a time-sorted index with a strict tolerance
//! - Timezone correction of capture times
//! - Atomic EXIF GPS writes
//! - Parallel per-photo processing with Rayon

pub mod cli;
pub mod config;
pub mod error;
pub mod gps;
pub mod history;
pub mod index;
pub mod matching;
pub mod process;
pub mod report;
pub mod time;
pub mod writer;

pub use cli::Cli;
pub use config::{CaptureClock, Config, ConfigError};
pub use error::{Error, Result};
pub use history::{HistoryFormat, LocationRecord, ParsedHistory, load_history};
pub use index::{MatchResult, TemporalIndex};
pub use matching::{MatchDecision, MatchPolicy};
pub use process::{GeotagStats, GeotagStatus, Geotagger, PhotoResult};
pub use report::{ConsoleStyle, PlainStyle, ReportStyle, format_elapsed, render_result};
