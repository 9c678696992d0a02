mod args;
mod commands;
mod error;
mod form_file;

use std::fs::File;
use std::process::ExitCode;

use clap::Parser;
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode, WriteLogger};

use crate::args::Cli;
use crate::error::{CliError, CliResult};

/// Exit status for files that cannot be loaded and other failures.
const EXIT_FAILURE: u8 = 2;

fn init_logging(cli: &Cli) -> CliResult<()> {
    match &cli.log_file {
        Some(path) => {
            let file = File::create(path)
                .map_err(|e| CliError::Logger(format!("{}: {}", path.display(), e)))?;
            WriteLogger::init(cli.log_level, Config::default(), file)
        }
        None => TermLogger::init(
            cli.log_level,
            Config::default(),
            TerminalMode::Stderr,
            ColorChoice::Auto,
        ),
    }
    .map_err(|e| CliError::Logger(e.to_string()))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(&cli) {
        eprintln!("Error: {}", e);
        return ExitCode::from(EXIT_FAILURE);
    }

    match commands::run(&cli).await {
        Ok(outcome) => ExitCode::from(outcome.exit_code()),
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(EXIT_FAILURE)
        }
    }
}
