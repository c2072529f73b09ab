// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! `docval.toml` configuration.

use std::fs;
use std::path::Path;
use std::time::Duration;

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::Deserialize;

use crate::compare::{Equivalence, Policy, DEFAULT_WILDCARD};
use crate::error::ConfigError;
use crate::example::DEFAULT_ERROR_HEADER;
use crate::shell::DEFAULT_SHELL;

/// Config file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "docval.toml";

/// Default per-example timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Run configuration. Every key is optional.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub timeout_ms: u64,
    pub equivalence: Equivalence,
    pub wildcard: String,
    /// Worker threads; 0 means one per available core.
    pub concurrency: usize,
    pub error_header: String,
    pub shell: String,
    /// File extensions picked up when expanding directories.
    pub extensions: Vec<String>,
    /// Glob patterns of paths to leave out.
    pub exclude: Vec<String>,
    pub style: StyleConfig,
}

/// External docstring style checker.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StyleConfig {
    pub command: String,
    pub args: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            equivalence: Equivalence::Exact,
            wildcard: DEFAULT_WILDCARD.to_string(),
            concurrency: 0,
            error_header: DEFAULT_ERROR_HEADER.to_string(),
            shell: DEFAULT_SHELL.to_string(),
            extensions: ["md", "markdown", "txt", "rst", "rs", "py"].iter().map(|s| s.to_string()).collect(),
            exclude: Vec::new(),
            style: StyleConfig::default(),
        }
    }
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self { command: "docstyle".to_string(), args: Vec::new() }
    }
}

impl Config {
    /// Load `explicit` if given, else `./docval.toml` if it exists, else
    /// the defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Config, ConfigError> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let local = Path::new(CONFIG_FILE_NAME);
                if local.is_file() {
                    Self::from_file(local)
                } else {
                    Ok(Config::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Config, ConfigError> {
        let text = fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        let config = Self::parse(&text)
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn parse(text: &str) -> Result<Config, toml::de::Error> {
        toml::from_str(text)
    }

    /// Reject values that parse but cannot be used.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_ms == 0 {
            return Err(ConfigError::Invalid("timeout_ms must be greater than zero".to_string()));
        }
        if self.equivalence == Equivalence::Wildcard && self.wildcard.is_empty() {
            return Err(ConfigError::Invalid("wildcard token must not be empty".to_string()));
        }
        if self.error_header.trim().is_empty() {
            return Err(ConfigError::Invalid("error_header must not be empty".to_string()));
        }
        self.exclude_set()?;
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn policy(&self) -> Policy {
        Policy { equivalence: self.equivalence, wildcard: self.wildcard.clone() }
    }

    /// Worker count with 0 resolved to the number of cores.
    pub fn workers(&self) -> usize {
        if self.concurrency > 0 {
            return self.concurrency;
        }
        std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
    }

    pub fn exclude_set(&self) -> Result<GlobSet, ConfigError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &self.exclude {
            let glob = Glob::new(pattern)
                .map_err(|source| ConfigError::Glob { pattern: pattern.clone(), source })?;
            builder.add(glob);
        }
        builder
            .build()
            .map_err(|source| ConfigError::Glob { pattern: self.exclude.join(", "), source })
    }

    /// `extensions` lowercased, without leading dots.
    pub fn extension_list(&self) -> Vec<String> {
        self.extensions
            .iter()
            .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
            .collect()
    }
}
