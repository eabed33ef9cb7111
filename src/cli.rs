//! CLI argument parsing with clap

use crate::config::{CaptureClock, Config};
use clap::Parser;
use std::path::PathBuf;

/// History Geotagger - tag photos with positions from a location history
///
/// Finds the location sample closest in time to each photo's capture time
/// and writes it into the photo's EXIF GPS tags when the gap is within the
/// tolerance.
#[derive(Parser, Debug)]
#[command(name = "history-geotagger")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to configuration file (TOML format)
    ///
    /// When specified, settings from the config file are used as defaults.
    /// CLI arguments will override config file settings.
    #[arg(short = 'C', long)]
    pub config: Option<PathBuf>,

    /// The JSON file containing your location history
    #[arg(short, long = "json", value_name = "FILE")]
    pub json: Option<PathBuf>,

    /// Images folder
    #[arg(short, long, value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Hours of tolerance between capture time and location sample
    #[arg(short = 't', long = "time", value_name = "HOURS")]
    pub tolerance: Option<f64>,

    /// Hours added to each capture time before matching (timezone correction)
    #[arg(short = 'z', long, value_name = "HOURS", allow_hyphen_values = true)]
    pub timezone: Option<f64>,

    /// Clock the camera was set to
    #[arg(long, value_enum)]
    pub capture_clock: Option<CaptureClock>,

    /// Also geotag Sony RAW (.arw/.ARW) files
    #[arg(long)]
    pub include_raw: bool,

    /// Scan sub-directories of the images folder
    #[arg(short, long)]
    pub recursive: bool,

    /// Leave photos that already have a GPS position untouched
    #[arg(long)]
    pub skip_existing_gps: bool,

    /// Do not restore the modification time of rewritten photos
    #[arg(long)]
    pub no_preserve_mtime: bool,

    /// Number of threads for parallel processing (0 = auto)
    #[arg(long)]
    pub threads: Option<usize>,

    /// Dry run mode - report matches without writing
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Save the effective configuration to this file and exit
    #[arg(long, value_name = "FILE")]
    pub write_config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Output log format as JSON
    #[arg(long)]
    pub json_log: bool,
}

impl Cli {
    /// Get config file name (without extension) for log naming
    pub fn config_name(&self) -> Option<String> {
        self.config.as_ref().and_then(|p| {
            p.file_stem()
                .and_then(|s| s.to_str())
                .map(|s| s.to_string())
        })
    }

    /// Merge CLI arguments with config from file
    /// CLI arguments take precedence over config file settings
    pub fn merge_with_config(&self, mut config: Config) -> Config {
        if let Some(ref json) = self.json {
            config.history_file = json.clone();
        }
        if let Some(ref dir) = self.dir {
            config.photo_dir = dir.clone();
        }
        if let Some(tolerance) = self.tolerance {
            config.tolerance_hours = tolerance;
        }
        if let Some(timezone) = self.timezone {
            config.time_offset_hours = timezone;
        }
        if let Some(clock) = self.capture_clock {
            config.capture_clock = clock;
        }
        if self.include_raw {
            config.include_raw = true;
        }
        if self.recursive {
            config.recursive = true;
        }
        if self.skip_existing_gps {
            config.skip_existing_gps = true;
        }
        if self.no_preserve_mtime {
            config.preserve_mtime = false;
        }
        if let Some(threads) = self.threads {
            config.threads = threads;
        }
        if self.dry_run {
            config.dry_run = true;
        }
        if self.verbose {
            config.verbose = true;
        }

        config
    }

    /// Convert CLI arguments to Config (when no config file is used)
    pub fn to_config(&self) -> Config {
        self.merge_with_config(Config::default())
    }

    /// Both inputs must come from the command line when no config file is given
    pub fn missing_inputs(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.config.is_none() {
            if self.json.is_none() {
                missing.push("--json");
            }
            if self.dir.is_none() {
                missing.push("--dir");
            }
        }
        missing
    }
}
