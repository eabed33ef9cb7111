//! History Geotagger - tag photos with positions from a location history
//!
//! Matches each photo's EXIF capture time to the closest sample of a
//! location history export and writes that position into the photo.

use anyhow::Result;
use chrono::Local;
use clap::Parser;
use history_geotagger::{Cli, Config, ConsoleStyle, GeotagStatus, Geotagger, render_result};
use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;
use tracing::{Level, error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

// CLI Output Module
mod cli_output {
    //! Console styling for summary output

    use crossterm::{
        ExecutableCommand,
        style::{Color, Print, Stylize, style},
    };
    use history_geotagger::ConsoleStyle;
    use std::io::stdout;

    /// Print a separator line
    pub fn print_separator() {
        let _ = stdout().execute(Print(&format!("{}\n", "─".repeat(60))));
    }

    /// Print a centered title
    pub fn print_title(title: &str) {
        let width = 60;
        let padding = (width - title.len()) / 2;
        let left_pad = " ".repeat(padding.saturating_sub(1));

        let _ = stdout().execute(Print(&format!("{}{}\n", left_pad, title.bold())));
    }

    /// Print a warning message
    pub fn print_warning(msg: &str) {
        let _ = stdout().execute(Print(style("⚠ ").with(ConsoleStyle::WARNING).bold()));
        let _ = stdout().execute(Print(format!("{}\n", msg)));
    }

    /// Print an error message
    pub fn print_error(msg: &str) {
        let _ = stdout().execute(Print(style("✗ ").with(ConsoleStyle::ERROR).bold()));
        let _ = stdout().execute(Print(format!("{}\n", msg)));
    }

    /// Print a hint message
    pub fn print_hint(msg: &str) {
        let _ = stdout().execute(Print(style("→ ").with(ConsoleStyle::HINT)));
        let _ = stdout().execute(Print(format!("{}\n", msg)));
    }

    /// Print a key/value pair
    pub fn print_key_value(key: &str, value: &str, value_color: Option<Color>) {
        let key_styled = style(key).with(ConsoleStyle::HINT);
        let value_styled = match value_color {
            Some(color) => style(value).with(color),
            None => style(value).bold(),
        };
        let _ = stdout().execute(Print("  "));
        let _ = stdout().execute(Print(key_styled));
        let _ = stdout().execute(Print(": "));
        let _ = stdout().execute(Print(value_styled));
        let _ = stdout().execute(Print("\n"));
    }

    /// Print a statistic
    pub fn print_stat(key: &str, value: usize, color: Color) {
        let key_styled = style(key).with(ConsoleStyle::HINT);
        let value_styled = style(value.to_string()).with(color).bold();
        let _ = stdout().execute(Print("  "));
        let _ = stdout().execute(Print(key_styled));
        let _ = stdout().execute(Print(": "));
        let _ = stdout().execute(Print(value_styled));
        let _ = stdout().execute(Print("\n"));
    }

    /// Print the log file path
    pub fn print_log_path(path: &str) {
        let _ = stdout().execute(Print("\n"));
        let _ = stdout().execute(Print(style("  Log file: ").with(ConsoleStyle::HINT)));
        let _ = stdout().execute(Print(format!("{}\n", path)));
    }

    /// Print a blank line
    pub fn print_blank() {
        let _ = stdout().execute(Print("\n"));
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let missing = cli.missing_inputs();
    if !missing.is_empty() {
        anyhow::bail!("Missing required argument(s): {}", missing.join(", "));
    }

    // Get the executable directory for Config and Log directories
    let exe_dir = get_executable_dir()?;

    // Determine log file path based on config file or timestamp
    let log_path = get_log_path(&exe_dir, &cli);

    let guard = setup_logging(&cli, &log_path)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "History Geotagger starting"
    );

    let config = load_config(&cli, &exe_dir)?;

    if cli.verbose {
        info!(?config, "Configuration loaded");
    }

    info!(log_file = %log_path.display(), "Log file location");

    config.validate()?;

    if let Some(ref path) = cli.write_config {
        config.save_to_file(path)?;
        info!(config_file = %path.display(), "Configuration saved");
        cli_output::print_hint(&format!("Configuration saved to {}", path.display()));
        return Ok(());
    }

    let dry_run = config.dry_run;
    let geotagger = Geotagger::new(config);

    match geotagger.run() {
        Ok(results) => {
            use cli_output::*;

            for result in &results {
                println!("{}", render_result(&ConsoleStyle, result));
            }

            print_blank();
            print_separator();
            print_title("Geotagging complete");
            print_separator();

            let stats = geotagger.stats();
            print_blank();
            print_stat("Geotagged", stats.geotagged.load(Ordering::Relaxed), ConsoleStyle::SUCCESS);
            print_stat(
                "Not geotagged",
                stats.not_geotagged.load(Ordering::Relaxed),
                ConsoleStyle::ACCENT,
            );
            print_stat("Skipped", stats.skipped.load(Ordering::Relaxed), ConsoleStyle::WARNING);
            print_stat("Failed", stats.failed.load(Ordering::Relaxed), ConsoleStyle::ERROR);
            print_blank();

            let failed_items: Vec<_> = results
                .iter()
                .filter(|r| r.status == GeotagStatus::Failed)
                .collect();

            if !failed_items.is_empty() {
                print_separator();
                print_error(&format!("Failed to geotag {} files", failed_items.len()));
                print_blank();
                for result in &failed_items {
                    let error_msg = result.error.as_deref().unwrap_or("unknown error");
                    print_key_value(
                        &result.source.display().to_string(),
                        error_msg,
                        Some(ConsoleStyle::ERROR),
                    );
                }
            }

            if dry_run {
                print_separator();
                print_warning("Dry run: no photo was modified");
            }

            print_separator();
            print_log_path(&log_path.display().to_string());

            info!(log_file = %log_path.display(), "Processing complete. Log saved to");

            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Geotagging failed");
            // process::exit skips destructors; flush the file log first
            drop(guard);
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Get the directory where the executable is located
fn get_executable_dir() -> Result<PathBuf> {
    let exe_path = std::env::current_exe()?;
    Ok(exe_path
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".")))
}

/// Determine the log file path based on config file or timestamp
fn get_log_path(exe_dir: &Path, cli: &Cli) -> PathBuf {
    let log_dir = exe_dir.join("Log");
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");

    if let Some(config_name) = cli.config_name() {
        let config_log_dir = log_dir.join(&config_name);
        let log_filename = format!("{}_{}.log", config_name, timestamp);
        config_log_dir.join(log_filename)
    } else {
        let log_filename = format!("CLIRun_{}.log", timestamp);
        log_dir.join(log_filename)
    }
}

/// Resolve config path - supports shorthand syntax
fn resolve_config_path(exe_dir: &Path, config_path: &Path) -> PathBuf {
    if config_path.exists() {
        return config_path.to_path_buf();
    }

    let with_extension = if config_path.extension().is_none() {
        config_path.with_extension("toml")
    } else {
        config_path.to_path_buf()
    };

    if with_extension.exists() {
        return with_extension;
    }

    let config_dir = exe_dir.join("Config");
    let filename = config_path.file_name().unwrap_or(config_path.as_os_str());

    let mut in_config_dir = config_dir.join(filename);
    if in_config_dir.extension().is_none() {
        in_config_dir = in_config_dir.with_extension("toml");
    }

    if in_config_dir.exists() {
        return in_config_dir;
    }

    config_path.to_path_buf()
}

/// Load configuration from file or CLI arguments
fn load_config(cli: &Cli, exe_dir: &Path) -> Result<Config> {
    let config = if let Some(ref config_path) = cli.config {
        let resolved_path = resolve_config_path(exe_dir, config_path);
        info!(config_file = %resolved_path.display(), "Loading configuration from file");
        let file_config = Config::load_from_file(&resolved_path)?;
        cli.merge_with_config(file_config)
    } else {
        cli.to_config()
    };

    Ok(config)
}

/// Setup logging (file + console)
fn setup_logging(cli: &Cli, log_path: &Path) -> Result<Option<WorkerGuard>> {
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let env_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(log_path)?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    let subscriber = tracing_subscriber::registry().with(env_filter);

    if cli.json_log {
        subscriber
            .with(
                fmt::layer()
                    .json()
                    .with_ansi(false)
                    .with_writer(non_blocking),
            )
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    } else {
        subscriber
            .with(fmt::layer().with_ansi(false).with_writer(non_blocking))
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    Ok(Some(guard))
}
