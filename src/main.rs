use std::process::ExitCode;
use std::time::Instant;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use xmledit::{
    Cli, Command, Config, ConfigManager, DocumentIo, EditorError, EditorEvent, EditorSession,
    ErrorReporter, EventOutcome, Output, PrefixCompleter, SaveOptions, VerbosityLevel,
    XmlValidator, prettify,
};

fn main() -> ExitCode {
    let cli = Cli::parse_args();

    if let Err(message) = cli.validate() {
        eprintln!("Error: {}", message);
        return ExitCode::from(2);
    }

    let config = match ConfigManager::load_config(&cli) {
        Ok(config) => config,
        Err(err) => {
            ErrorReporter::new(cli.verbosity()).report_config_error(&err);
            return ExitCode::from(2);
        }
    };

    let verbosity = match cli.verbosity() {
        VerbosityLevel::Debug => VerbosityLevel::Debug,
        _ => config.verbosity(),
    };
    init_logging(verbosity);

    match run(&cli, &config, verbosity) {
        Ok(code) => code,
        Err(err) => {
            match err.downcast_ref::<EditorError>() {
                Some(editor_err) => ErrorReporter::new(verbosity).report_editor_error(editor_err),
                None => eprintln!("Error: {:#}", err),
            }
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbosity: VerbosityLevel) {
    let default_level = match verbosity {
        VerbosityLevel::Quiet => "error",
        VerbosityLevel::Normal => "warn",
        VerbosityLevel::Verbose => "info",
        VerbosityLevel::Debug => "debug",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: &Cli, config: &Config, verbosity: VerbosityLevel) -> anyhow::Result<ExitCode> {
    let output = Output::new(verbosity, config.output.format);

    match &cli.command {
        Command::Validate { file } => {
            let start = Instant::now();
            let text = config
                .document_io()
                .read(file)
                .map_err(|source| EditorError::Open {
                    path: file.clone(),
                    source,
                })?;

            let result = XmlValidator::new().validate(&text);
            print_nonempty(&output.format_validation(file, &result, start.elapsed()));

            Ok(if result.is_valid {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(1)
            })
        }

        Command::Format(args) => {
            // The format command always prettifies, whatever the editor setting
            let options = SaveOptions {
                format_on_save: true,
                ..config.save_options()
            };
            let mut session = EditorSession::new(
                config.document_io(),
                PrefixCompleter::new(config.catalog()),
                options,
            );
            session.handle(EditorEvent::OpenRequested {
                path: args.file.clone(),
            })?;

            if !args.in_place && args.output.is_none() {
                let result = XmlValidator::new().validate(session.document());
                if let Some(error) = result.to_error() {
                    return Err(EditorError::Parse(error).into());
                }
                let formatted = prettify(session.document(), &config.editor.indent)
                    .context("Failed to format document")?;
                let newline = config.editor.newline;
                print!("{}{}", newline.apply(&formatted), newline.as_str());
                return Ok(ExitCode::SUCCESS);
            }

            let outcome = session.handle(EditorEvent::SaveRequested {
                path: args.output.clone(),
            })?;
            if let EventOutcome::Saved { path } = outcome {
                print_nonempty(&output.format_saved(&path));
            }
            Ok(ExitCode::SUCCESS)
        }

        Command::Complete { prefix } => {
            let matches = PrefixCompleter::new(config.catalog()).complete(prefix);
            print_nonempty(&output.format_completions(prefix, &matches));
            Ok(ExitCode::SUCCESS)
        }

        Command::Tags => {
            print_nonempty(&output.format_tags(&config.catalog()));
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn print_nonempty(text: &str) {
    if !text.is_empty() {
        println!("{}", text);
    }
}
