use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Verbosity levels for output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum VerbosityLevel {
    /// Only show critical errors
    Quiet,
    /// Show standard information
    #[default]
    Normal,
    /// Show detailed information
    Verbose,
    /// Show all available debugging information
    Debug,
}

/// How results are rendered on stdout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Human,
    Json,
}

/// XML editing toolkit: well-formedness checks, pretty-printing and tag completion
#[derive(Parser, Debug, Clone)]
#[command(name = "xmledit")]
#[command(about = "Validate, pretty-print and complete XML documents")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file (TOML or JSON)
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output (repeat for debug output)
    #[arg(short = 'v', long = "verbose", global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Enable quiet mode (errors only)
    #[arg(
        short = 'q',
        long = "quiet",
        global = true,
        help = "Quiet mode",
        conflicts_with = "verbose"
    )]
    pub quiet: bool,

    /// Output format
    #[arg(long = "format", value_enum, global = true)]
    pub output_format: Option<OutputFormat>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Check that a file is well-formed XML
    Validate {
        /// File to check
        file: PathBuf,
    },

    /// Validate and pretty-print a file
    Format(FormatArgs),

    /// List catalog entries matching a prefix
    Complete {
        /// Prefix typed so far, e.g. "<it"
        prefix: String,
    },

    /// Print the active completion catalog
    Tags,
}

#[derive(Args, Debug, Clone)]
pub struct FormatArgs {
    /// File to format
    pub file: PathBuf,

    /// Write the result to this file instead of stdout (".xml" is appended if missing)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Overwrite the input file
    #[arg(short = 'i', long = "in-place", conflicts_with = "output")]
    pub in_place: bool,

    /// Number of spaces per indent level
    #[arg(long = "indent", conflicts_with = "tabs")]
    pub indent: Option<usize>,

    /// Indent with tabs
    #[arg(long = "tabs")]
    pub tabs: bool,

    /// Write CRLF line endings
    #[arg(long = "crlf")]
    pub crlf: bool,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn validate(&self) -> Result<(), String> {
        match &self.command {
            Command::Validate { file } => require_file(file),
            Command::Format(args) => {
                require_file(&args.file)?;
                if let Some(width) = args.indent
                    && width > 16
                {
                    return Err("Indent width must be at most 16".to_string());
                }
                Ok(())
            }
            Command::Complete { .. } | Command::Tags => Ok(()),
        }
    }

    /// Verbosity requested by flags alone; `-vv` selects debug output
    pub fn verbosity(&self) -> VerbosityLevel {
        match (self.quiet, self.verbose) {
            (true, _) => VerbosityLevel::Quiet,
            (false, 0) => VerbosityLevel::Normal,
            (false, 1) => VerbosityLevel::Verbose,
            (false, _) => VerbosityLevel::Debug,
        }
    }

    /// Indent string requested on the command line, if any
    pub fn indent_override(&self) -> Option<String> {
        match &self.command {
            Command::Format(args) if args.tabs => Some("\t".to_string()),
            Command::Format(args) => args.indent.map(|width| " ".repeat(width)),
            _ => None,
        }
    }
}

fn require_file(path: &Path) -> Result<(), String> {
    if !path.exists() {
        return Err(format!("File does not exist: {}", path.display()));
    }
    if path.is_dir() {
        return Err(format!("Expected a file, found a directory: {}", path.display()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_basic_cli_parsing() {
        let cli = Cli::try_parse_from(["xmledit", "validate", "/tmp/doc.xml"]).unwrap();
        match cli.command {
            Command::Validate { ref file } => assert_eq!(*file, PathBuf::from("/tmp/doc.xml")),
            ref other => panic!("Expected validate command, got {:?}", other),
        }
        assert_eq!(cli.verbose, 0);
        assert_eq!(cli.verbosity(), VerbosityLevel::Normal);
        assert_eq!(cli.output_format, None);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["xmledit", "complete", "<it", "--format", "json", "-v"])
            .unwrap();
        assert_eq!(cli.verbosity(), VerbosityLevel::Verbose);
        assert_eq!(cli.output_format, Some(OutputFormat::Json));

        let cli = Cli::try_parse_from(["xmledit", "-vv", "tags"]).unwrap();
        assert_eq!(cli.verbosity(), VerbosityLevel::Debug);
    }

    #[test]
    fn test_verbose_and_quiet_conflict() {
        assert!(Cli::try_parse_from(["xmledit", "-v", "-q", "tags"]).is_err());
    }

    #[test]
    fn test_format_indent_options() {
        let cli = Cli::try_parse_from(["xmledit", "format", "a.xml", "--indent", "2"]).unwrap();
        assert_eq!(cli.indent_override(), Some("  ".to_string()));

        let cli = Cli::try_parse_from(["xmledit", "format", "a.xml", "--tabs"]).unwrap();
        assert_eq!(cli.indent_override(), Some("\t".to_string()));

        assert!(
            Cli::try_parse_from(["xmledit", "format", "a.xml", "--tabs", "--indent", "2"]).is_err()
        );
    }

    #[test]
    fn test_format_in_place_excludes_output() {
        let cli = Cli::try_parse_from(["xmledit", "format", "a.xml", "-i"]).unwrap();
        let Command::Format(args) = cli.command else {
            panic!("Expected format command");
        };
        assert!(args.in_place);
        assert_eq!(args.output, None);

        assert!(Cli::try_parse_from(["xmledit", "format", "a.xml", "-i", "-o", "b.xml"]).is_err());
    }

    #[test]
    fn test_validate_missing_file() {
        let cli = Cli::try_parse_from(["xmledit", "validate", "/nonexistent/doc.xml"]).unwrap();
        let err = cli.validate().unwrap_err();
        assert!(err.contains("File does not exist"));
    }
}
