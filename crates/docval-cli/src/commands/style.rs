// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! `docval style`: hand files to the external style checker.

use docval_doctest::style::{CommandStyleChecker, StyleChecker};
use docval_doctest::EnvironmentError;

use super::{input_files, EXIT_ENVIRONMENT};
use crate::output;
use crate::StyleArgs;

pub fn run(args: StyleArgs) -> anyhow::Result<u8> {
    let config = args.config.load()?;
    let files = input_files(&args.paths, &config)?;
    if files.is_empty() {
        eprintln!("{}: no input files found", output::error_label());
        return Ok(EXIT_ENVIRONMENT);
    }

    let checker = CommandStyleChecker::from_config(&config.style);
    match checker.check_files(&files) {
        Ok(code) => Ok(u8::try_from(code).unwrap_or(1)),
        Err(EnvironmentError::NotFound { program }) => {
            eprintln!(
                "{}: style checker '{}' is not installed (set [style] command in docval.toml)",
                output::error_label(),
                program
            );
            Ok(EXIT_ENVIRONMENT)
        }
        Err(e) => Err(e.into()),
    }
}
