use crate::cli::VerbosityLevel;
use crate::config::ConfigError;
use crate::error::EditorError;

/// Error reporter with configurable verbosity
pub struct ErrorReporter {
    verbosity: VerbosityLevel,
    show_timestamps: bool,
}

impl ErrorReporter {
    /// Create a new error reporter with specified verbosity
    pub fn new(verbosity: VerbosityLevel) -> Self {
        Self {
            verbosity,
            show_timestamps: false,
        }
    }

    /// Create a new error reporter with additional options
    pub fn with_options(verbosity: VerbosityLevel, show_timestamps: bool) -> Self {
        Self {
            verbosity,
            show_timestamps,
        }
    }

    /// Report an editor error with appropriate verbosity
    pub fn report_editor_error(&self, error: &EditorError) {
        if let Some(message) = self.format_editor_error(error) {
            eprintln!("{}", message);
        }
    }

    /// Report a configuration error
    pub fn report_config_error(&self, error: &ConfigError) {
        eprintln!("{}", self.format_config_error(error));
    }

    /// Render an editor error, or `None` when quiet mode suppresses it
    pub fn format_editor_error(&self, error: &EditorError) -> Option<String> {
        match self.verbosity {
            VerbosityLevel::Quiet => self
                .is_critical_error(error)
                .then(|| self.format_error_brief(error)),
            VerbosityLevel::Normal => Some(self.format_error_normal(error)),
            VerbosityLevel::Verbose => Some(self.format_error_verbose(error)),
            VerbosityLevel::Debug => Some(self.format_error_debug(error)),
        }
    }

    pub fn format_config_error(&self, error: &ConfigError) -> String {
        match self.verbosity {
            VerbosityLevel::Quiet => format!("Config error: {}", error),
            VerbosityLevel::Normal | VerbosityLevel::Verbose => {
                format!(
                    "Configuration Error: {}\n{}",
                    error,
                    self.get_config_help(error)
                )
            }
            VerbosityLevel::Debug => {
                format!(
                    "Configuration Error: {}\nDebug: {:?}\n{}",
                    error,
                    error,
                    self.get_config_help(error)
                )
            }
        }
    }

    /// Check if an error is considered critical
    fn is_critical_error(&self, error: &EditorError) -> bool {
        matches!(
            error,
            EditorError::Config(_) | EditorError::Io(_) | EditorError::Save { .. }
        )
    }

    /// Format error for brief output (quiet mode)
    fn format_error_brief(&self, error: &EditorError) -> String {
        match error {
            EditorError::Save { path, .. } => format!("SAVE FAILED: {}", path.display()),
            _ => format!("ERROR: {}", error),
        }
    }

    /// Format error for normal output
    fn format_error_normal(&self, error: &EditorError) -> String {
        let timestamp = if self.show_timestamps {
            format!("[{}] ", chrono::Utc::now().format("%H:%M:%S"))
        } else {
            String::new()
        };

        format!("{}{}", timestamp, error)
    }

    /// Format error for verbose output
    fn format_error_verbose(&self, error: &EditorError) -> String {
        let mut output = self.format_error_normal(error);

        match error {
            EditorError::Parse(_) => {
                output.push_str("\nSuggestion: Fix the markup at the reported position; nothing was written");
            }
            EditorError::Open { path, .. } => {
                output.push_str(&format!(
                    "\nSuggestion: Check that {} exists and is UTF-8 or UTF-16 with a byte-order mark",
                    path.display()
                ));
            }
            EditorError::Save { path, .. } => {
                output.push_str(&format!(
                    "\nSuggestion: Check that the directory of {} exists and is writable",
                    path.display()
                ));
            }
            _ => {}
        }

        output
    }

    /// Format error for debug output
    fn format_error_debug(&self, error: &EditorError) -> String {
        let mut output = self.format_error_verbose(error);
        output.push_str(&format!("\nDebug Info: {:?}", error));

        output.push_str("\nError Chain:");
        let mut current_error: &dyn std::error::Error = error;
        let mut level = 0;
        while let Some(source) = current_error.source() {
            output.push_str(&format!("\n  {}: {}", level + 1, source));
            current_error = source;
            level += 1;
        }

        output
    }

    /// Get helpful suggestions for configuration errors
    fn get_config_help(&self, error: &ConfigError) -> String {
        match error {
            ConfigError::Io(_) => "Check that the configuration file exists and is readable".to_string(),
            ConfigError::TomlParsing(_) | ConfigError::JsonParsing(_) => {
                "Check the configuration file syntax (TOML/JSON format expected)".to_string()
            }
            ConfigError::UnsupportedFormat(_) => {
                "Use a .toml or .json configuration file".to_string()
            }
            ConfigError::Environment(_) => {
                "Fix or unset the XMLEDIT_* environment variable".to_string()
            }
            ConfigError::Validation(_) => {
                "Indent must be spaces or tabs, and tags must not be blank".to_string()
            }
        }
    }
}
