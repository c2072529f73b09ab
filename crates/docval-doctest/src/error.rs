// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Error types.

use std::path::PathBuf;

/// The execution environment could not be set up. Fatal for the whole run.
#[derive(Debug, thiserror::Error)]
pub enum EnvironmentError {
    #[error("cannot start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{program}' is not installed or not on PATH")]
    NotFound { program: String },

    #[error("{0}")]
    Other(String),
}

/// Invalid configuration file or option.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("reading {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid exclude pattern '{pattern}': {source}")]
    Glob {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("{0}")]
    Invalid(String),
}

/// An extracted block that does not form a valid example.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExampleParseError {
    #[error("block has no statements")]
    NoStatements,

    #[error("continuation line {line} has no preceding prompt")]
    OrphanContinuation { line: usize },
}
