// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! The interpreter core.

mod call;
mod eval_expr;
mod exec_stmt;
pub(crate) mod operators;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use docval_ast::stmt::StmtKind;
use docval_ast::LineMap;

use crate::env::Environment;
use crate::value::Value;

/// Default limit on nested function calls.
const DEFAULT_MAX_CALL_DEPTH: usize = 200;

/// Limit on nested statement and expression evaluation, calls included.
const MAX_NESTING_DEPTH: usize = 2000;

/// Stack a thread needs to evaluate up to the nesting limit.
pub const MIN_STACK_SIZE: usize = 64 * 1024 * 1024;

/// Steps between deadline and cancellation checks.
const CHECK_INTERVAL: u64 = 256;

/// External stop conditions for one execution.
#[derive(Debug, Clone, Default)]
pub struct Limits {
    pub deadline: Option<Instant>,
    pub cancel: Option<Arc<AtomicBool>>,
}

impl Limits {
    pub fn new(deadline: Option<Instant>, cancel: Option<Arc<AtomicBool>>) -> Self {
        Self { deadline, cancel }
    }

    fn check(&self) -> Result<(), Interrupt> {
        if self.cancel.as_ref().is_some_and(|c| c.load(Ordering::Relaxed)) {
            return Err(Interrupt::Cancelled);
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(Interrupt::Timeout);
        }
        Ok(())
    }
}

/// Why an execution was stopped from outside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupt {
    Timeout,
    Cancelled,
}

/// The tree-walk interpreter.
///
/// One interpreter is one interactive session: globals persist across calls
/// to [`Interpreter::execute`].
pub struct Interpreter {
    env: Environment,
    output: String,
    limits: Limits,
    steps: u64,
    call_depth: usize,
    max_call_depth: usize,
    depth: usize,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Self {
            env: Environment::new(),
            output: String::new(),
            limits: Limits::default(),
            steps: 0,
            call_depth: 0,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            depth: 0,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    /// Parse and run `source` as top-level statements.
    ///
    /// Top-level expression statements whose value is not nil have their
    /// `repr` written to the output. On error, bindings made before the
    /// failing statement are kept.
    pub fn execute(&mut self, source: &str, limits: &Limits) -> Result<(), RuntimeError> {
        let parsed = docval_parser::parse_source(source);
        if let Some(err) = parsed.errors.into_iter().next() {
            let lines = LineMap::new(source);
            if lines.line_count() > 1 {
                let (line, _) = lines.offset_to_line_col(err.span.start);
                return Err(RuntimeError::Syntax(format!("{} (line {})", err.message, line)));
            }
            return Err(RuntimeError::Syntax(err.message));
        }

        self.limits = limits.clone();
        self.steps = 0;
        self.call_depth = 0;
        self.depth = 0;
        // An interrupt may already be pending before any step is counted.
        self.limits.check().map_err(RuntimeError::Interrupted)?;

        let result = self.run_top_level(&parsed.stmts);
        if result.is_err() {
            self.env.reset_to_globals();
        }
        result
    }

    fn run_top_level(&mut self, stmts: &[docval_ast::stmt::Stmt]) -> Result<(), RuntimeError> {
        for stmt in stmts {
            let outcome = match &stmt.kind {
                StmtKind::Expr(expr) => self.eval_expr(expr).map(|value| {
                    if !value.is_nil() {
                        self.write(&value.repr());
                        self.write("\n");
                    }
                }),
                _ => self.exec_stmt(stmt),
            };
            outcome.map_err(|e| match e {
                RuntimeError::Break | RuntimeError::Continue => {
                    RuntimeError::Syntax(format!("'{}' outside loop", e))
                }
                RuntimeError::Return(_) => RuntimeError::Syntax("'return' outside function".to_string()),
                other => other,
            })?;
        }
        Ok(())
    }

    /// Take everything written since the last call.
    pub fn take_output(&mut self) -> String {
        std::mem::take(&mut self.output)
    }

    fn write(&mut self, text: &str) {
        self.output.push_str(text);
    }

    fn enter(&mut self) -> Result<(), RuntimeError> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(RuntimeError::NestingLimit(MAX_NESTING_DEPTH));
        }
        self.depth += 1;
        Ok(())
    }

    /// Count one unit of work, checking limits periodically.
    fn tick(&mut self) -> Result<(), RuntimeError> {
        self.steps += 1;
        if self.steps % CHECK_INTERVAL == 0 {
            self.limits.check().map_err(RuntimeError::Interrupted)?;
        }
        Ok(())
    }
}

/// Runtime errors. The display text is what an example's expected-error
/// annotation is compared against.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("NameError: undefined variable '{0}'")]
    UndefinedVariable(String),

    #[error("TypeError: {0}")]
    TypeError(String),

    #[error("ValueError: {0}")]
    ValueError(String),

    #[error("ZeroDivisionError: division by zero")]
    DivisionByZero,

    #[error("OverflowError: integer overflow")]
    Overflow,

    #[error("IndexError: {0}")]
    IndexError(String),

    #[error("RecursionError: maximum call depth of {0} exceeded")]
    RecursionLimit(usize),

    #[error("RecursionError: maximum nesting depth of {0} exceeded")]
    NestingLimit(usize),

    #[error("SyntaxError: {0}")]
    Syntax(String),

    /// Raised by a `raise` statement.
    #[error("Error: {0}")]
    Raised(String),

    #[error("interrupted: {0:?}")]
    Interrupted(Interrupt),

    // Control flow (not actual errors)
    #[error("return")]
    Return(Value),

    #[error("break")]
    Break,

    #[error("continue")]
    Continue,
}

impl RuntimeError {
    pub fn type_error(msg: impl Into<String>) -> Self {
        RuntimeError::TypeError(msg.into())
    }

    /// The interrupt behind this error, if it was stopped from outside.
    pub fn interrupt(&self) -> Option<Interrupt> {
        match self {
            RuntimeError::Interrupted(i) => Some(*i),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn run(src: &str) -> (String, Option<String>) {
        let mut interp = Interpreter::new();
        let result = interp.execute(src, &Limits::default());
        (interp.take_output(), result.err().map(|e| e.to_string()))
    }

    #[test]
    fn prints_and_displays_expression_values() {
        let (out, err) = run("print(\"hello\", 1 + 2)\n\"shown\"\nnil");
        assert_eq!(err, None);
        assert_eq!(out, "hello 3\n\"shown\"\n");
    }

    #[test]
    fn bindings_persist_across_executions() {
        let mut interp = Interpreter::new();
        interp.execute("let x = 41", &Limits::default()).unwrap();
        interp.execute("x + 1", &Limits::default()).unwrap();
        assert_eq!(interp.take_output(), "42\n");
    }

    #[test]
    fn error_keeps_earlier_mutations() {
        let mut interp = Interpreter::new();
        let err = interp.execute("let a = 1\nb = a / 0\nlet c = 3", &Limits::default()).unwrap_err();
        assert_eq!(err.to_string(), "ZeroDivisionError: division by zero");
        interp.execute("a", &Limits::default()).unwrap();
        assert_eq!(interp.take_output(), "1\n");
        let err = interp.execute("c", &Limits::default()).unwrap_err();
        assert_eq!(err.to_string(), "NameError: undefined variable 'c'");
    }

    #[test]
    fn syntax_error_text() {
        let (_, err) = run("let = 3");
        assert_eq!(err.as_deref(), Some("SyntaxError: expected a name, found '='"));
    }

    #[test]
    fn syntax_error_in_continued_statement_names_line() {
        let (_, err) = run("fn f() {\n    let = 1\n}");
        assert_eq!(err.as_deref(), Some("SyntaxError: expected a name, found '=' (line 2)"));
    }

    #[test]
    fn break_outside_loop() {
        let (_, err) = run("break");
        assert_eq!(err.as_deref(), Some("SyntaxError: 'break' outside loop"));
    }

    #[test]
    fn raise_statement() {
        let (out, err) = run("print(\"before\")\nraise \"bad input\"\nprint(\"after\")");
        assert_eq!(out, "before\n");
        assert_eq!(err.as_deref(), Some("Error: bad input"));
    }

    #[test]
    fn infinite_loop_hits_deadline() {
        let mut interp = Interpreter::new();
        let limits = Limits::new(Some(Instant::now() + Duration::from_millis(50)), None);
        let err = interp.execute("loop { }", &limits).unwrap_err();
        assert_eq!(err.interrupt(), Some(Interrupt::Timeout));
    }

    #[test]
    fn cancellation_flag_stops_execution() {
        let flag = Arc::new(AtomicBool::new(true));
        let mut interp = Interpreter::new();
        let err = interp.execute("while true { }", &Limits::new(None, Some(flag))).unwrap_err();
        assert_eq!(err.interrupt(), Some(Interrupt::Cancelled));
    }

    #[test]
    fn string_doubling_hits_length_limit() {
        let (_, err) = run("let s = \"ab\"\nwhile true { s = s + s }");
        assert_eq!(err.as_deref(), Some("ValueError: concatenation result is too large"));
    }

    #[test]
    fn unbounded_recursion_hits_nesting_limit() {
        let handle = std::thread::Builder::new()
            .stack_size(MIN_STACK_SIZE)
            .spawn(|| {
                let mut interp = Interpreter::new().with_max_call_depth(usize::MAX);
                interp
                    .execute("fn f(n) { return f(n + 1) }\nf(0)", &Limits::default())
                    .unwrap_err()
                    .to_string()
            })
            .unwrap();
        assert_eq!(handle.join().unwrap(), "RecursionError: maximum nesting depth of 2000 exceeded");
    }

    #[test]
    fn recursion_limit() {
        let mut interp = Interpreter::new().with_max_call_depth(10);
        let err = interp.execute("fn f(n) { return f(n + 1) }\nf(0)", &Limits::default()).unwrap_err();
        assert_eq!(err.to_string(), "RecursionError: maximum call depth of 10 exceeded");
    }
}
