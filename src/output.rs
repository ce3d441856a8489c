//! Simple Output and Reporting
//!
//! This module renders command results for stdout, either for humans or as JSON.

use std::path::Path;
use std::time::Duration;

use serde::Serialize;

use crate::catalog::TagCatalog;
use crate::cli::{OutputFormat, VerbosityLevel};
use crate::validator::ValidationResult;

#[derive(Serialize)]
struct ValidationReport<'a> {
    file: &'a Path,
    #[serde(flatten)]
    result: &'a ValidationResult,
    duration_ms: u128,
}

#[derive(Serialize)]
struct CompletionReport<'a> {
    prefix: &'a str,
    matches: &'a [String],
}

#[derive(Serialize)]
struct SaveReport<'a> {
    saved: &'a Path,
}

/// Output formatter for command results
pub struct Output {
    verbosity: VerbosityLevel,
    format: OutputFormat,
    show_colors: bool,
}

impl Output {
    pub fn new(verbosity: VerbosityLevel, format: OutputFormat) -> Self {
        Self {
            verbosity,
            format,
            show_colors: atty::is(atty::Stream::Stdout),
        }
    }

    /// Formatter with colors forced on or off
    pub fn with_colors(verbosity: VerbosityLevel, format: OutputFormat, show_colors: bool) -> Self {
        Self {
            verbosity,
            format,
            show_colors,
        }
    }

    fn colorize(&self, text: &str, color: &str) -> String {
        if self.show_colors {
            format!("\x1b[{}m{}\x1b[0m", color, text)
        } else {
            text.to_string()
        }
    }

    pub fn format_validation(
        &self,
        file: &Path,
        result: &ValidationResult,
        duration: Duration,
    ) -> String {
        if self.format == OutputFormat::Json {
            return to_json(&ValidationReport {
                file,
                result,
                duration_ms: duration.as_millis(),
            });
        }

        if result.is_valid {
            if self.verbosity == VerbosityLevel::Quiet {
                return String::new();
            }
            let mut output = format!("{}  {}", self.colorize("✓ VALID", "32"), file.display());
            if self.verbosity >= VerbosityLevel::Verbose {
                output.push_str(&format!(" ({})", format_duration(duration)));
            }
            return output;
        }

        let location = match result.error_position {
            Some(position) => format!(":{}:{}", position.line, position.column),
            None => String::new(),
        };
        let mut output = format!(
            "{}  {}{} - {}",
            self.colorize("✗ INVALID", "31"),
            file.display(),
            location,
            result.error_message
        );
        if self.verbosity >= VerbosityLevel::Verbose {
            output.push_str(&format!(" ({})", format_duration(duration)));
        }
        output
    }

    /// One match per line, or a JSON object with the prefix and matches
    pub fn format_completions(&self, prefix: &str, matches: &[String]) -> String {
        match self.format {
            OutputFormat::Json => to_json(&CompletionReport { prefix, matches }),
            OutputFormat::Human => matches.join("\n"),
        }
    }

    pub fn format_tags(&self, catalog: &TagCatalog) -> String {
        match self.format {
            OutputFormat::Json => to_json(&catalog.entries()),
            OutputFormat::Human => catalog.entries().join("\n"),
        }
    }

    pub fn format_saved(&self, path: &Path) -> String {
        match self.format {
            OutputFormat::Json => to_json(&SaveReport { saved: path }),
            OutputFormat::Human if self.verbosity == VerbosityLevel::Quiet => String::new(),
            OutputFormat::Human => {
                format!("{}  {}", self.colorize("✓ SAVED", "32"), path.display())
            }
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value)
        .unwrap_or_else(|err| format!("{{\"error\": \"{}\"}}", err))
}

fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs_f64();
    if total_secs < 1.0 {
        format!("{:.0}ms", duration.as_millis())
    } else {
        format!("{:.2}s", total_secs)
    }
}
