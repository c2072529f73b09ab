// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! The boundary between sessions and the backends that run statements.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::cancel::CancelToken;
use crate::error::EnvironmentError;
use crate::language::Language;
use crate::source::SourceUnit;

/// What running an example's statements produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionOutcome {
    /// Everything written, verbatim.
    pub actual_output: String,
    /// Text of the error that stopped the example, if any.
    pub raised_error: Option<String>,
}

/// Deadline and cancellation for one example.
#[derive(Debug, Clone)]
pub struct Budget {
    pub deadline: Instant,
    pub cancel: CancelToken,
}

impl Budget {
    pub fn new(timeout: Duration, cancel: CancelToken) -> Self {
        Self { deadline: Instant::now() + timeout, cancel }
    }

    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    pub fn expired(&self) -> bool {
        Instant::now() >= self.deadline
    }
}

/// Execution stopped before the example finished.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Interrupted {
    #[error("timeout")]
    Timeout,

    #[error("cancelled")]
    Cancelled,

    /// The backend broke, e.g. the shell process died.
    #[error("{0}")]
    Backend(String),
}

/// A backend able to open execution contexts for one language.
pub trait Executor: Send + Sync {
    fn name(&self) -> &str;

    /// Open a fresh context for `unit`. Failure means the environment is
    /// unusable and stops the whole run.
    fn open(&self, unit: &SourceUnit) -> Result<Box<dyn ExecutionContext>, EnvironmentError>;
}

/// Persistent interpreter state for one unit. Bindings made by one call to
/// `execute` are visible to the next.
pub trait ExecutionContext {
    /// Run statements in order, stopping at the first raised error. Mutations
    /// made before the error are kept.
    fn execute(&mut self, statements: &[String], budget: &Budget) -> Result<ExecutionOutcome, Interrupted>;
}

/// Executors by language name.
#[derive(Clone, Default)]
pub struct ExecutorRegistry {
    executors: HashMap<String, Arc<dyn Executor>>,
}

impl ExecutorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `executor` for `language`, replacing any previous one.
    pub fn register(&mut self, language: Language, executor: Arc<dyn Executor>) {
        self.executors.insert(language.name().to_string(), executor);
    }

    pub fn get(&self, language: &Language) -> Option<&Arc<dyn Executor>> {
        self.executors.get(language.name())
    }

    pub fn languages(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.executors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl std::fmt::Debug for ExecutorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutorRegistry").field("languages", &self.languages()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::ScriptExecutor;

    #[test]
    fn registry_lookup_by_language() {
        let mut registry = ExecutorRegistry::new();
        registry.register(Language::Script, Arc::new(ScriptExecutor::default()));
        assert!(registry.get(&Language::Script).is_some());
        assert!(registry.get(&Language::Shell).is_none());
        assert!(registry.get(&Language::Other("ruby".into())).is_none());
        assert_eq!(registry.languages(), vec!["script"]);
    }

    #[test]
    fn budget_expiry() {
        let budget = Budget::new(Duration::from_millis(0), CancelToken::new());
        assert!(budget.expired());
        assert_eq!(budget.remaining(), Duration::ZERO);
        let budget = Budget::new(Duration::from_secs(60), CancelToken::new());
        assert!(!budget.expired());
    }
}
