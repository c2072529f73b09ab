// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! docval CLI - validate the examples in documentation.

mod commands;
mod logging;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use docval_doctest::Equivalence;

#[derive(Debug, Parser)]
#[command(name = "docval", version, about = "Run and check the examples embedded in documentation")]
struct Cli {
    /// Log progress to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run every example in the given files and directories
    Validate(ValidateArgs),
    /// Check docstring style with the configured external checker
    Style(StyleArgs),
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Configuration file (default: ./docval.toml if present)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ValidateArgs {
    /// Files or directories to validate
    #[arg(required = true, value_name = "PATH")]
    paths: Vec<PathBuf>,

    #[command(flatten)]
    config: ConfigArgs,

    /// Per-example timeout in milliseconds
    #[arg(long, value_name = "MS")]
    timeout_ms: Option<u64>,

    /// How output is compared: exact, normalize-whitespace or wildcard
    #[arg(long, value_name = "MODE")]
    equivalence: Option<Equivalence>,

    /// Token matching any text in wildcard mode
    #[arg(long, value_name = "TOKEN")]
    wildcard: Option<String>,

    /// Files validated in parallel (0 = one per core)
    #[arg(short, long, value_name = "N")]
    jobs: Option<usize>,

    /// Report format
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,
}

#[derive(Debug, Args)]
pub struct StyleArgs {
    /// Files or directories to check
    #[arg(required = true, value_name = "PATH")]
    paths: Vec<PathBuf>,

    #[command(flatten)]
    config: ConfigArgs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Text,
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    output::init();
    if let Err(e) = logging::init(cli.verbose) {
        eprintln!("{}: {}", output::warning_label(), e);
    }

    let result = match cli.command {
        Command::Validate(args) => commands::validate::run(args),
        Command::Style(args) => commands::style::run(args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("{}: {:#}", output::error_label(), e);
            ExitCode::from(commands::EXIT_ENVIRONMENT)
        }
    }
}
