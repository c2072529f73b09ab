// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Validate the examples embedded in documentation.
//!
//! A documentation file is scanned for examples written as interactive
//! sessions (`>>> ` prompts) or in fences tagged `run`. Each file gets one
//! [`Session`]: examples run in source order against a persistent context,
//! and what they print is compared with what the documentation shows.

pub mod cancel;
pub mod compare;
pub mod config;
pub mod discover;
pub mod error;
pub mod example;
pub mod executor;
pub mod extract;
pub mod language;
pub mod report;
pub mod runner;
pub mod script;
pub mod session;
pub mod shell;
pub mod source;
pub mod style;

use std::sync::Arc;

pub use cancel::CancelToken;
pub use compare::{compare, ComparisonResult, Equivalence, Policy};
pub use config::Config;
pub use error::{ConfigError, EnvironmentError, ExampleParseError};
pub use example::{parse_block, Example, Expected};
pub use executor::{Budget, ExecutionContext, ExecutionOutcome, Executor, ExecutorRegistry, Interrupted};
pub use extract::{extract, ExampleBlock, Extracted};
pub use language::Language;
pub use report::{FileReport, RunSummary};
pub use runner::{run_units, RunOptions};
pub use session::{Session, SessionOptions};
pub use source::{SourceKind, SourceUnit};

/// Registry with the built-in script executor and a shell executor running
/// `shell_program`.
pub fn default_registry(shell_program: &str) -> ExecutorRegistry {
    let mut registry = ExecutorRegistry::new();
    registry.register(Language::Script, Arc::new(script::ScriptExecutor::default()));
    registry.register(Language::Shell, Arc::new(shell::ShellExecutor::new(shell_program)));
    registry
}
