// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Executor for the built-in docval script language.

use docval_interp::{Interpreter, Interrupt, Limits};

use crate::error::EnvironmentError;
use crate::executor::{Budget, ExecutionContext, ExecutionOutcome, Executor, Interrupted};
use crate::source::SourceUnit;

/// Runs examples in an embedded interpreter, one per unit.
#[derive(Debug, Clone, Default)]
pub struct ScriptExecutor;

impl Executor for ScriptExecutor {
    fn name(&self) -> &str {
        "script"
    }

    fn open(&self, unit: &SourceUnit) -> Result<Box<dyn ExecutionContext>, EnvironmentError> {
        tracing::debug!(path = %unit.path.display(), "opening script context");
        Ok(Box::new(ScriptContext { interp: Interpreter::new() }))
    }
}

struct ScriptContext {
    interp: Interpreter,
}

impl ExecutionContext for ScriptContext {
    fn execute(&mut self, statements: &[String], budget: &Budget) -> Result<ExecutionOutcome, Interrupted> {
        let limits = Limits::new(Some(budget.deadline), Some(budget.cancel.flag()));
        let mut outcome = ExecutionOutcome::default();

        for statement in statements {
            let result = self.interp.execute(statement, &limits);
            outcome.actual_output.push_str(&self.interp.take_output());
            if let Err(err) = result {
                match err.interrupt() {
                    Some(Interrupt::Timeout) => return Err(Interrupted::Timeout),
                    Some(Interrupt::Cancelled) => return Err(Interrupted::Cancelled),
                    None => {
                        outcome.raised_error = Some(err.to_string());
                        break;
                    }
                }
            }
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::CancelToken;
    use std::time::Duration;

    fn context() -> Box<dyn ExecutionContext> {
        ScriptExecutor::default().open(&SourceUnit::new("doc.md", "")).unwrap()
    }

    fn budget() -> Budget {
        Budget::new(Duration::from_secs(5), CancelToken::new())
    }

    fn stmts(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bindings_persist_between_examples() {
        let mut ctx = context();
        let first = ctx.execute(&stmts(&["let total = 40"]), &budget()).unwrap();
        assert_eq!(first, ExecutionOutcome::default());
        let second = ctx.execute(&stmts(&["total = total + 2", "total"]), &budget()).unwrap();
        assert_eq!(second.actual_output, "42\n");
        assert_eq!(second.raised_error, None);
    }

    #[test]
    fn error_stops_remaining_statements() {
        let mut ctx = context();
        let out = ctx
            .execute(&stmts(&["print(\"one\")", "missing", "print(\"never\")"]), &budget())
            .unwrap();
        assert_eq!(out.actual_output, "one\n");
        assert_eq!(out.raised_error.as_deref(), Some("NameError: undefined variable 'missing'"));
    }

    #[test]
    fn timeout_is_an_interruption() {
        let mut ctx = context();
        let budget = Budget::new(Duration::from_millis(30), CancelToken::new());
        assert_eq!(ctx.execute(&stmts(&["while true { }"]), &budget), Err(Interrupted::Timeout));
    }

    #[test]
    fn cancellation_is_an_interruption() {
        let mut ctx = context();
        let cancel = CancelToken::new();
        cancel.cancel();
        let budget = Budget::new(Duration::from_secs(5), cancel);
        assert_eq!(ctx.execute(&stmts(&["1"]), &budget), Err(Interrupted::Cancelled));
    }

    #[test]
    fn syntax_error_is_raised_error() {
        let mut ctx = context();
        let out = ctx.execute(&stmts(&["let = 1"]), &budget()).unwrap();
        assert!(out.raised_error.unwrap().starts_with("SyntaxError:"));
    }
}
