use crate::catalog::{DEFAULT_TAGS, TagCatalog};
use crate::cli::{Cli, OutputFormat, VerbosityLevel};
use crate::document_io::{FsDocumentIo, NewlineStyle};
use crate::editor::SaveOptions;
use crate::pretty::DEFAULT_INDENT;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Trait for abstracting environment variable access
pub trait EnvProvider {
    fn get(&self, key: &str) -> Option<String>;
}

/// System environment variable provider for production use
pub struct SystemEnvProvider;

impl EnvProvider for SystemEnvProvider {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParsing(#[from] toml::de::Error),

    #[error("JSON parsing error: {0}")]
    JsonParsing(#[from] serde_json::Error),

    #[error("Configuration validation error: {0}")]
    Validation(String),

    #[error("Environment variable error: {0}")]
    Environment(String),

    #[error("Unsupported configuration file format: {0}")]
    UnsupportedFormat(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub editor: EditorConfig,
    pub completion: CompletionConfig,
    pub output: OutputConfig,
}

/// Save pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EditorConfig {
    /// Indent string per nesting level (spaces and tabs only)
    pub indent: String,
    /// Pretty-print the document when saving
    pub format_on_save: bool,
    /// Line ending written to disk
    pub newline: NewlineStyle,
    /// Write to a temporary file and rename it over the target
    pub atomic_writes: bool,
}

/// Completion configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CompletionConfig {
    /// Catalog entries, in suggestion order
    pub tags: Vec<String>,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct OutputConfig {
    /// Output format
    pub format: OutputFormat,
    /// Verbose output
    pub verbose: bool,
    /// Quiet mode (errors only)
    pub quiet: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            indent: DEFAULT_INDENT.to_string(),
            format_on_save: true,
            newline: NewlineStyle::Lf,
            atomic_writes: true,
        }
    }
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            tags: DEFAULT_TAGS.iter().map(|tag| tag.to_string()).collect(),
        }
    }
}

impl Config {
    pub fn catalog(&self) -> TagCatalog {
        self.completion.tags.iter().cloned().collect()
    }

    pub fn document_io(&self) -> FsDocumentIo {
        FsDocumentIo::new(self.editor.newline, self.editor.atomic_writes)
    }

    pub fn save_options(&self) -> SaveOptions {
        SaveOptions {
            indent: self.editor.indent.clone(),
            format_on_save: self.editor.format_on_save,
        }
    }

    pub fn verbosity(&self) -> VerbosityLevel {
        if self.output.quiet {
            VerbosityLevel::Quiet
        } else if self.output.verbose {
            VerbosityLevel::Verbose
        } else {
            VerbosityLevel::Normal
        }
    }
}

/// Configuration manager for loading and merging configurations
pub struct ConfigManager;

impl ConfigManager {
    /// Load configuration with precedence: file -> environment -> CLI
    pub fn load_config(cli: &Cli) -> Result<Config> {
        Self::load_config_with(&SystemEnvProvider, cli)
    }

    /// Same as [`ConfigManager::load_config`] with a custom environment provider
    pub fn load_config_with(env: &impl EnvProvider, cli: &Cli) -> Result<Config> {
        let mut config = Config::default();

        if let Some(config_path) = &cli.config {
            let file_config = Self::load_from_file(config_path)?;
            config = Self::merge_configs(config, file_config);
        } else if let Some(found_config) = Self::find_config_file()? {
            config = Self::merge_configs(config, found_config);
        }

        config = Self::apply_environment_overrides_with(env, config)?;
        config = Self::merge_with_cli(config, cli);

        Self::validate_config(&config)?;
        tracing::debug!(?config, "configuration loaded");

        Ok(config)
    }

    /// Load configuration from a file (TOML or JSON)
    pub fn load_from_file(path: &Path) -> Result<Config> {
        let content = std::fs::read_to_string(path)?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(toml::from_str(&content)?),
            Some("json") => Ok(serde_json::from_str(&content)?),
            Some(ext) => Err(ConfigError::UnsupportedFormat(ext.to_string())),
            None => {
                // Try to parse as TOML first, then JSON
                if let Ok(config) = toml::from_str::<Config>(&content) {
                    Ok(config)
                } else {
                    Ok(serde_json::from_str(&content)?)
                }
            }
        }
    }

    /// Find configuration file in standard locations
    pub fn find_config_file() -> Result<Option<Config>> {
        let config_names = [
            "xmledit.toml",
            "xmledit.json",
            ".xmledit.toml",
            ".xmledit.json",
        ];

        for name in &config_names {
            let path = PathBuf::from(name);
            if path.exists() {
                return Ok(Some(Self::load_from_file(&path)?));
            }
        }

        if let Some(config_dir) = dirs::config_dir() {
            let app_config_dir = config_dir.join("xmledit");
            for name in &config_names {
                let path = app_config_dir.join(name);
                if path.exists() {
                    return Ok(Some(Self::load_from_file(&path)?));
                }
            }
        }

        Ok(None)
    }

    /// Apply environment variable overrides using the system environment
    pub fn apply_environment_overrides(config: Config) -> Result<Config> {
        Self::apply_environment_overrides_with(&SystemEnvProvider, config)
    }

    /// Apply environment variable overrides with a custom environment provider
    pub fn apply_environment_overrides_with(
        env: &impl EnvProvider,
        mut config: Config,
    ) -> Result<Config> {
        if let Some(indent) = env.get("XMLEDIT_INDENT") {
            config.editor.indent = parse_indent(&indent).ok_or_else(|| {
                ConfigError::Environment(format!("Invalid XMLEDIT_INDENT value: {}", indent))
            })?;
        }

        if let Some(format_on_save) = env.get("XMLEDIT_FORMAT_ON_SAVE") {
            config.editor.format_on_save = format_on_save.parse().map_err(|_| {
                ConfigError::Environment(format!(
                    "Invalid XMLEDIT_FORMAT_ON_SAVE value: {}",
                    format_on_save
                ))
            })?;
        }

        if let Some(newline) = env.get("XMLEDIT_NEWLINE") {
            config.editor.newline = match newline.to_lowercase().as_str() {
                "lf" => NewlineStyle::Lf,
                "crlf" => NewlineStyle::CrLf,
                _ => {
                    return Err(ConfigError::Environment(format!(
                        "Invalid XMLEDIT_NEWLINE value: {}",
                        newline
                    )));
                }
            };
        }

        if let Some(atomic) = env.get("XMLEDIT_ATOMIC_WRITES") {
            config.editor.atomic_writes = atomic.parse().map_err(|_| {
                ConfigError::Environment(format!("Invalid XMLEDIT_ATOMIC_WRITES value: {}", atomic))
            })?;
        }

        if let Some(tags) = env.get("XMLEDIT_TAGS") {
            config.completion.tags = tags
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        if let Some(format) = env.get("XMLEDIT_FORMAT") {
            config.output.format = match format.to_lowercase().as_str() {
                "human" => OutputFormat::Human,
                "json" => OutputFormat::Json,
                _ => {
                    return Err(ConfigError::Environment(format!(
                        "Invalid XMLEDIT_FORMAT value: {}",
                        format
                    )));
                }
            };
        }

        if let Some(verbose) = env.get("XMLEDIT_VERBOSE") {
            config.output.verbose = verbose.parse().map_err(|_| {
                ConfigError::Environment(format!("Invalid XMLEDIT_VERBOSE value: {}", verbose))
            })?;
        }

        if let Some(quiet) = env.get("XMLEDIT_QUIET") {
            config.output.quiet = quiet.parse().map_err(|_| {
                ConfigError::Environment(format!("Invalid XMLEDIT_QUIET value: {}", quiet))
            })?;
        }

        Ok(config)
    }

    /// Merge CLI arguments with configuration (CLI takes precedence)
    pub fn merge_with_cli(mut config: Config, cli: &Cli) -> Config {
        if let Some(indent) = cli.indent_override() {
            config.editor.indent = indent;
        }
        if let crate::cli::Command::Format(args) = &cli.command
            && args.crlf
        {
            config.editor.newline = NewlineStyle::CrLf;
        }

        if let Some(format) = cli.output_format {
            config.output.format = format;
        }
        if cli.verbose > 0 {
            config.output.verbose = true;
            config.output.quiet = false;
        }
        if cli.quiet {
            config.output.quiet = true;
            config.output.verbose = false;
        }

        config
    }

    /// Merge two configurations (second takes precedence)
    pub fn merge_configs(mut base: Config, override_config: Config) -> Config {
        base.editor = override_config.editor;

        if !override_config.completion.tags.is_empty() {
            base.completion.tags = override_config.completion.tags;
        }

        base.output = override_config.output;

        base
    }

    /// Validate configuration values
    pub fn validate_config(config: &Config) -> Result<()> {
        if !config.editor.indent.chars().all(|c| c == ' ' || c == '\t') {
            return Err(ConfigError::Validation(
                "Indent may only contain spaces and tabs".to_string(),
            ));
        }

        if config.completion.tags.iter().any(|tag| tag.trim().is_empty()) {
            return Err(ConfigError::Validation(
                "Completion tags must not be empty".to_string(),
            ));
        }

        if config.output.verbose && config.output.quiet {
            return Err(ConfigError::Validation(
                "Cannot enable both verbose and quiet modes".to_string(),
            ));
        }

        Ok(())
    }
}

/// Parse an indent setting: a number of spaces, `tab`, or a literal whitespace string
fn parse_indent(value: &str) -> Option<String> {
    if let Ok(width) = value.trim().parse::<usize>() {
        return (width <= 16).then(|| " ".repeat(width));
    }
    if value.eq_ignore_ascii_case("tab") {
        return Some("\t".to_string());
    }
    value
        .chars()
        .all(|c| c == ' ' || c == '\t')
        .then(|| value.to_string())
}
