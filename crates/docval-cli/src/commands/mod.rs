// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Subcommands.

pub mod style;
pub mod validate;

use std::path::PathBuf;

use docval_doctest::discover::{discover, Filter};
use docval_doctest::Config;

use crate::ConfigArgs;

/// Configuration, environment or input problem.
pub const EXIT_ENVIRONMENT: u8 = 2;

impl ConfigArgs {
    pub(crate) fn load(&self) -> anyhow::Result<Config> {
        Ok(Config::load(self.config.as_deref())?)
    }
}

/// Expand the command-line paths with the configured filter.
pub(crate) fn input_files(paths: &[PathBuf], config: &Config) -> anyhow::Result<Vec<PathBuf>> {
    let filter = Filter::new(config.extension_list(), config.exclude_set()?);
    Ok(discover(paths, &filter))
}
