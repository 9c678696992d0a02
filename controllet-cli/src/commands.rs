//! Command execution.

use std::io::{self, Write};

use controllet::FormError;
use controllet::adapter::RecordingRenderer;
use serde::Serialize;

use crate::args::{Cli, Command};
use crate::error::CliResult;
use crate::form_file::FormFile;

/// Whether the validated form or field had errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Valid,
    Invalid,
}

impl Outcome {
    fn from_valid(valid: bool) -> Self {
        if valid { Self::Valid } else { Self::Invalid }
    }

    pub fn exit_code(self) -> u8 {
        match self {
            Self::Valid => 0,
            Self::Invalid => 1,
        }
    }
}

pub async fn run(cli: &Cli) -> CliResult<Outcome> {
    let file = FormFile::load(cli.command.form())?;
    let (form, renderer) = file.into_form(cli.command.locale());

    let outcome = match &cli.command {
        Command::Submit { .. } => {
            let result = form.submit().await;
            print_json(&result)?;
            Outcome::from_valid(result.status)
        }
        Command::Field { name, .. } => {
            let verdict = form
                .validate_field(name)
                .await
                .ok_or_else(|| FormError::missing(name))?;
            print_json(&verdict)?;
            Outcome::from_valid(!verdict.has_errors())
        }
    };

    if cli.verbose {
        print_render_log(&renderer)?;
    }

    form.detach();
    Ok(outcome)
}

fn print_json<T: Serialize>(value: &T) -> CliResult<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}

fn print_render_log(renderer: &RecordingRenderer) -> CliResult<()> {
    let mut stderr = io::stderr().lock();
    for call in renderer.calls() {
        serde_json::to_writer(&mut stderr, &call)?;
        writeln!(stderr)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(Outcome::from_valid(true).exit_code(), 0);
        assert_eq!(Outcome::from_valid(false).exit_code(), 1);
    }
}
