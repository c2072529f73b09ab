// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! One interactive session per documentation unit.

use std::collections::hash_map::{Entry, HashMap};
use std::time::Duration;

use crate::cancel::CancelToken;
use crate::compare::{compare, ComparisonResult, Policy};
use crate::error::EnvironmentError;
use crate::example::Example;
use crate::executor::{Budget, ExecutionContext, ExecutorRegistry, Interrupted};
use crate::source::SourceUnit;

/// Settings shared by every example of a session.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub policy: Policy,
    pub timeout: Duration,
    pub cancel: CancelToken,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Active,
    /// A timeout or backend failure; nothing else runs in this unit.
    Aborted,
    Cancelled,
}

/// Executes a unit's examples in order, keeping one execution context per
/// language so bindings carry over between examples.
pub struct Session<'a> {
    unit: &'a SourceUnit,
    registry: &'a ExecutorRegistry,
    options: SessionOptions,
    contexts: HashMap<String, Box<dyn ExecutionContext>>,
    state: State,
}

impl<'a> Session<'a> {
    pub fn open(unit: &'a SourceUnit, registry: &'a ExecutorRegistry, options: SessionOptions) -> Self {
        tracing::debug!(path = %unit.path.display(), "session opened");
        Self { unit, registry, options, contexts: HashMap::new(), state: State::Active }
    }

    /// Run one example and judge it.
    ///
    /// Only an environment failure is an `Err`; everything the example does
    /// is reported through the returned result.
    pub fn run(&mut self, example: &Example) -> Result<ComparisonResult, EnvironmentError> {
        match self.state {
            State::Aborted => return Ok(ComparisonResult::skipped("session aborted")),
            State::Cancelled => return Ok(ComparisonResult::skipped("cancelled")),
            State::Active => {}
        }
        if example.block.skip || example.options.skip {
            return Ok(ComparisonResult::skipped("skip directive"));
        }
        if self.options.cancel.is_cancelled() {
            self.cancelled();
            return Ok(ComparisonResult::skipped("cancelled"));
        }

        let language = &example.block.language;
        let Some(executor) = self.registry.get(language) else {
            return Ok(ComparisonResult::skipped(format!("no executor for language '{}'", language)));
        };

        let context = match self.contexts.entry(language.name().to_string()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                tracing::debug!(path = %self.unit.path.display(), executor = executor.name(), "opening context");
                entry.insert(executor.open(self.unit)?)
            }
        };

        tracing::debug!(path = %self.unit.path.display(), line = example.line(), "running example");
        let budget = Budget::new(self.options.timeout, self.options.cancel.clone());
        match context.execute(&example.statements, &budget) {
            Ok(outcome) => {
                let policy = self.options.policy.with_override(example.options.equivalence);
                Ok(compare(&example.expected, &outcome, &policy))
            }
            Err(Interrupted::Timeout) => {
                tracing::warn!(
                    path = %self.unit.path.display(),
                    line = example.line(),
                    timeout_ms = self.options.timeout.as_millis() as u64,
                    "example timed out; aborting session"
                );
                self.abort();
                Ok(ComparisonResult::error("timeout"))
            }
            Err(Interrupted::Backend(message)) => {
                tracing::warn!(
                    path = %self.unit.path.display(),
                    line = example.line(),
                    error = %message,
                    "execution backend failed; aborting session"
                );
                self.abort();
                Ok(ComparisonResult::error(message))
            }
            Err(Interrupted::Cancelled) => {
                self.cancelled();
                Ok(ComparisonResult::skipped("cancelled"))
            }
        }
    }

    /// Discard every execution context.
    pub fn close(mut self) {
        self.contexts.clear();
        tracing::debug!(path = %self.unit.path.display(), "session closed");
    }

    fn abort(&mut self) {
        self.state = State::Aborted;
        self.contexts.clear();
    }

    fn cancelled(&mut self) {
        self.state = State::Cancelled;
        self.contexts.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::example::{parse_block, DEFAULT_ERROR_HEADER};
    use crate::extract::{extract, Extracted};
    use crate::language::Language;
    use crate::script::ScriptExecutor;
    use std::sync::Arc;

    fn registry() -> ExecutorRegistry {
        let mut registry = ExecutorRegistry::new();
        registry.register(Language::Script, Arc::new(ScriptExecutor::default()));
        registry
    }

    fn options(timeout_ms: u64) -> SessionOptions {
        SessionOptions {
            policy: Policy::default(),
            timeout: Duration::from_millis(timeout_ms),
            cancel: CancelToken::new(),
        }
    }

    fn examples(unit: &SourceUnit) -> Vec<Example> {
        extract(unit)
            .filter_map(|item| match item {
                Extracted::Block(block) => parse_block(&block, DEFAULT_ERROR_HEADER).ok(),
                Extracted::Malformed { .. } => None,
            })
            .collect()
    }

    fn run_all(text: &str, options: SessionOptions) -> Vec<ComparisonResult> {
        let unit = SourceUnit::new("doc.md", text);
        let registry = registry();
        let mut session = Session::open(&unit, &registry, options);
        let results = examples(&unit).iter().map(|ex| session.run(ex).unwrap()).collect();
        session.close();
        results
    }

    #[test]
    fn bindings_carry_between_examples() {
        let text = ">>> let x = 20\n\nSome prose.\n\n>>> x * 2 + 2\n42\n";
        assert_eq!(run_all(text, options(5000)), vec![ComparisonResult::Pass, ComparisonResult::Pass]);
    }

    #[test]
    fn mismatch_fails() {
        let results = run_all(">>> 1 + 1\n3\n", options(5000));
        assert!(matches!(results[0], ComparisonResult::Fail { .. }));
    }

    #[test]
    fn timeout_aborts_rest_of_unit() {
        let text = ">>> while true { }\n\n>>> 1\n1\n";
        assert_eq!(
            run_all(text, options(100)),
            vec![ComparisonResult::error("timeout"), ComparisonResult::skipped("session aborted")]
        );
    }

    #[test]
    fn cancellation_skips_everything_after() {
        let opts = options(5000);
        opts.cancel.cancel();
        let results = run_all(">>> 1\n1\n\n>>> 2\n2\n", opts);
        assert_eq!(results, vec![ComparisonResult::skipped("cancelled"); 2]);
    }

    #[test]
    fn skip_directive() {
        let text = ">>> 1  # docval: skip\n2\n\n```docval run skip\n>>> 3\n4\n```\n";
        assert_eq!(run_all(text, options(5000)), vec![ComparisonResult::skipped("skip directive"); 2]);
    }

    #[test]
    fn language_without_executor_is_skipped() {
        let text = "```shell run\n$ echo hi\nhi\n```\n";
        assert_eq!(
            run_all(text, options(5000)),
            vec![ComparisonResult::skipped("no executor for language 'shell'")]
        );
    }

    #[test]
    fn raised_error_keeps_earlier_mutations() {
        let text = ">>> let n = 1\n\n>>> n = 5\n>>> missing\n\n>>> n\n5\n";
        let results = run_all(text, options(5000));
        assert_eq!(results[1], ComparisonResult::Pass);
        assert_eq!(
            results[2],
            ComparisonResult::error("NameError: undefined variable 'missing'")
        );
        assert_eq!(results[3], ComparisonResult::Pass);
    }

    #[test]
    fn result_does_not_depend_on_unrelated_examples() {
        let example = ">>> let total = len([4, 5, 6])\n>>> print(total, total * 2)\n3 6\n";
        let alone = run_all(example, options(5000));
        let preceded = run_all(
            &format!(">>> let other = \"x\" * 3\n\n>>> other\n\"xxx\"\n\n>>> missing\n\n{}", example),
            options(5000),
        );
        assert_eq!(alone, vec![ComparisonResult::Pass, ComparisonResult::Pass]);
        assert_eq!(preceded[3..], alone[..]);

        let failing = ">>> print(1 + 1)\n3\n";
        let alone = run_all(failing, options(5000));
        let preceded = run_all(&format!(">>> let y = 1\n\n{}", failing), options(5000));
        assert!(matches!(alone[0], ComparisonResult::Fail { .. }));
        assert_eq!(preceded[1], alone[0]);
    }

    #[test]
    fn per_example_equivalence_override() {
        let text = ">>> print(\"id=\" + str(7))  # docval: wildcard\nid=***\n";
        assert_eq!(run_all(text, options(5000)), vec![ComparisonResult::Pass]);
    }

    #[cfg(unix)]
    #[test]
    fn environment_failure_is_fatal() {
        use crate::shell::ShellExecutor;

        let unit = SourceUnit::new("doc.md", "```sh run\n$ echo hi\nhi\n```\n");
        let mut registry = registry();
        registry.register(Language::Shell, Arc::new(ShellExecutor::new("docval-no-such-shell")));
        let mut session = Session::open(&unit, &registry, options(5000));
        let example = &examples(&unit)[0];
        assert!(matches!(session.run(example), Err(EnvironmentError::NotFound { .. })));
    }
}
