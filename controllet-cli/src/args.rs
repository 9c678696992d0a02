//! Command line arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use controllet::catalog::Locale;
use log::LevelFilter;

/// Validate HTML-style forms described as JSON
#[derive(Parser, Debug)]
#[command(name = "controllet")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Print every render call to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Minimum level of log records
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: LevelFilter,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Validate every field and print the form result
    Submit {
        /// Path to the form description
        form: PathBuf,

        /// Message locale, overriding the form file
        #[arg(long)]
        locale: Option<Locale>,
    },

    /// Validate one field and print its verdict
    Field {
        /// Path to the form description
        form: PathBuf,

        /// Field name
        name: String,

        /// Message locale, overriding the form file
        #[arg(long)]
        locale: Option<Locale>,
    },
}

impl Command {
    pub fn form(&self) -> &PathBuf {
        match self {
            Self::Submit { form, .. } | Self::Field { form, .. } => form,
        }
    }

    pub fn locale(&self) -> Option<Locale> {
        match self {
            Self::Submit { locale, .. } | Self::Field { locale, .. } => *locale,
        }
    }
}
