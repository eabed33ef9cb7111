//! Per-photo report lines
//!
//! Colors are supplied by a [`ReportStyle`] so the same lines can be
//! rendered for a terminal or as plain text.

use crate::process::{GeotagStatus, PhotoResult};
use crossterm::style::{Color, Stylize};

/// Semantic color of a report fragment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Success,
    Warning,
    Error,
    Hint,
    Accent,
}

/// Decorates report fragments
pub trait ReportStyle {
    fn paint(&self, text: &str, tone: Tone) -> String;
}

/// No decoration
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainStyle;

impl ReportStyle for PlainStyle {
    fn paint(&self, text: &str, _tone: Tone) -> String {
        text.to_string()
    }
}

/// ANSI colors via crossterm
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleStyle;

impl ConsoleStyle {
    pub const SUCCESS: Color = Color::Green;
    pub const WARNING: Color = Color::Yellow;
    pub const ERROR: Color = Color::Red;
    pub const HINT: Color = Color::DarkGrey;
    pub const ACCENT: Color = Color::Cyan;
}

impl ReportStyle for ConsoleStyle {
    fn paint(&self, text: &str, tone: Tone) -> String {
        let styled = match tone {
            Tone::Success => text.with(Self::SUCCESS).bold(),
            Tone::Warning => text.with(Self::WARNING).bold(),
            Tone::Error => text.with(Self::ERROR).bold(),
            Tone::Hint => text.with(Self::HINT),
            Tone::Accent => text.with(Self::ACCENT),
        };
        styled.to_string()
    }
}

/// Human-readable distance in time to the matched sample
pub fn format_elapsed(delta_seconds: f64) -> String {
    if delta_seconds >= 3600.0 {
        format!("{:.2} hours away", delta_seconds / 3600.0)
    } else if delta_seconds >= 120.0 {
        format!("{:.1} min away", delta_seconds / 60.0)
    } else {
        format!("{:.0} sec away", delta_seconds)
    }
}

/// One line describing the outcome for a photo
pub fn render_result<S: ReportStyle + ?Sized>(style: &S, result: &PhotoResult) -> String {
    let name = result
        .source
        .file_name()
        .unwrap_or(result.source.as_os_str())
        .to_string_lossy();
    let elapsed = result
        .delta_seconds
        .map(|d| format!(" ({})", format_elapsed(d)))
        .unwrap_or_default();
    let position = result
        .position
        .map(|(lat, lon)| format!("     {}", style.paint(&format!("{}, {}", lat, lon), Tone::Accent)))
        .unwrap_or_default();
    let reason = result.error.as_deref().unwrap_or("unknown error");

    match result.status {
        GeotagStatus::Geotagged => format!(
            "{}  {}{}{}",
            style.paint("Geotagged:", Tone::Success),
            name,
            elapsed,
            position
        ),
        GeotagStatus::DryRun => format!(
            "{}  {}{}{}",
            style.paint("Would geotag:", Tone::Accent),
            name,
            elapsed,
            position
        ),
        GeotagStatus::NotGeotagged => format!(
            "{} {}{}",
            style.paint("Not geotagged.", Tone::Error),
            name,
            elapsed
        ),
        GeotagStatus::Skipped => format!(
            "{} {} {}",
            style.paint("Skipped:", Tone::Warning),
            name,
            style.paint(&format!("({})", reason), Tone::Hint)
        ),
        GeotagStatus::Failed => format!(
            "{} {}{} {}",
            style.paint("Failed:", Tone::Error),
            name,
            elapsed,
            style.paint(reason, Tone::Hint)
        ),
    }
}
