// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Diagnostic logging to stderr.

use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber. `RUST_LOG` takes precedence over
/// `verbose`.
pub fn init(verbose: bool) -> anyhow::Result<()> {
    let default = if verbose { "docval=debug" } else { "docval=warn" };
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(verbose)
                .without_time()
                .compact(),
        )
        .try_init()?;
    Ok(())
}
