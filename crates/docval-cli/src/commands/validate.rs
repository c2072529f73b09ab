// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! `docval validate`: run every example and report.

use docval_doctest::report::{render_json, render_text};
use docval_doctest::{default_registry, run_units, CancelToken, Config, RunOptions};

use super::{input_files, EXIT_ENVIRONMENT};
use crate::output;
use crate::{Format, ValidateArgs};

pub fn run(args: ValidateArgs) -> anyhow::Result<u8> {
    let mut config = args.config.load()?;
    apply_overrides(&mut config, &args);
    config.validate()?;

    let files = input_files(&args.paths, &config)?;
    if files.is_empty() {
        eprintln!("{}: no input files found", output::error_label());
        return Ok(EXIT_ENVIRONMENT);
    }

    let cancel = CancelToken::new();
    install_interrupt_handler(&cancel);

    let registry = default_registry(&config.shell);
    let summary = run_units(&files, &RunOptions::from(&config), &registry, &cancel)?;

    match args.format {
        Format::Text => print!("{}", render_text(&summary)),
        Format::Json => println!("{}", render_json(&summary)?),
    }
    if summary.cancelled {
        eprintln!("{}: interrupted", output::warning_label());
    }
    Ok(summary.exit_code() as u8)
}

fn apply_overrides(config: &mut Config, args: &ValidateArgs) {
    if let Some(ms) = args.timeout_ms {
        config.timeout_ms = ms;
    }
    if let Some(mode) = args.equivalence {
        config.equivalence = mode;
    }
    if let Some(token) = &args.wildcard {
        config.wildcard = token.clone();
    }
    if let Some(jobs) = args.jobs {
        config.concurrency = jobs;
    }
}

/// First Ctrl-C cancels the run, a second one exits immediately.
#[cfg(unix)]
fn install_interrupt_handler(cancel: &CancelToken) {
    use signal_hook::consts::SIGINT;

    let flag = cancel.flag();
    let registered = signal_hook::flag::register_conditional_shutdown(SIGINT, 130, flag.clone())
        .and_then(|_| signal_hook::flag::register(SIGINT, flag));
    if let Err(e) = registered {
        tracing::warn!(error = %e, "cannot install SIGINT handler");
    }
}

#[cfg(not(unix))]
fn install_interrupt_handler(_cancel: &CancelToken) {}
