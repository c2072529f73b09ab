// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Docstring style checking, delegated to an external tool.

use std::io;
use std::path::PathBuf;
use std::process::Command;

use crate::config::StyleConfig;
use crate::error::EnvironmentError;

/// Checks documentation style for a set of files.
pub trait StyleChecker {
    /// Check `paths` and return the checker's exit code.
    fn check_files(&self, paths: &[PathBuf]) -> Result<i32, EnvironmentError>;
}

/// Runs a configured command with the paths appended to its arguments.
/// Output goes straight to the terminal.
#[derive(Debug, Clone)]
pub struct CommandStyleChecker {
    command: String,
    args: Vec<String>,
}

impl CommandStyleChecker {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self { command: command.into(), args }
    }

    pub fn from_config(config: &StyleConfig) -> Self {
        Self::new(config.command.clone(), config.args.clone())
    }
}

impl StyleChecker for CommandStyleChecker {
    fn check_files(&self, paths: &[PathBuf]) -> Result<i32, EnvironmentError> {
        tracing::debug!(command = %self.command, files = paths.len(), "running style checker");
        let status = Command::new(&self.command)
            .args(&self.args)
            .args(paths)
            .status()
            .map_err(|source| match source.kind() {
                io::ErrorKind::NotFound => EnvironmentError::NotFound { program: self.command.clone() },
                _ => EnvironmentError::Spawn { program: self.command.clone(), source },
            })?;
        // Killed by a signal: no code to forward.
        Ok(status.code().unwrap_or(1))
    }
}
