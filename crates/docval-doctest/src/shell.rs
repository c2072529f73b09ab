// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Executor backed by a persistent POSIX shell.
//!
//! Every statement is followed by a `printf` of a sentinel line carrying the
//! statement's exit status. A reader thread forwards stdout lines over a
//! channel so the deadline can be enforced with `recv_timeout`.

use std::io::{self, BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

use crate::error::EnvironmentError;
use crate::executor::{Budget, ExecutionContext, ExecutionOutcome, Executor, Interrupted};
use crate::source::SourceUnit;

/// Default shell program.
pub const DEFAULT_SHELL: &str = "sh";

/// Longest wait between cancellation checks.
const POLL_SLICE: Duration = Duration::from_millis(50);

static NEXT_SESSION: AtomicU64 = AtomicU64::new(0);

/// Runs examples in a shell subprocess, one per unit.
#[derive(Debug, Clone)]
pub struct ShellExecutor {
    program: String,
}

impl Default for ShellExecutor {
    fn default() -> Self {
        Self::new(DEFAULT_SHELL)
    }
}

impl ShellExecutor {
    pub fn new(program: impl Into<String>) -> Self {
        Self { program: program.into() }
    }
}

impl Executor for ShellExecutor {
    fn name(&self) -> &str {
        "shell"
    }

    fn open(&self, unit: &SourceUnit) -> Result<Box<dyn ExecutionContext>, EnvironmentError> {
        tracing::debug!(path = %unit.path.display(), program = %self.program, "starting shell");
        let context = ShellContext::spawn(&self.program).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => EnvironmentError::NotFound { program: self.program.clone() },
            _ => EnvironmentError::Spawn { program: self.program.clone(), source },
        })?;
        Ok(Box::new(context))
    }
}

struct ShellContext {
    child: Child,
    stdin: ChildStdin,
    lines: Receiver<String>,
    sentinel: String,
}

impl ShellContext {
    fn spawn(program: &str) -> io::Result<Self> {
        let mut child = Command::new(program)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;

        let (Some(mut stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            let _ = child.kill();
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "shell pipes unavailable"));
        };

        // Merge stderr into the captured stream for everything that follows.
        stdin.write_all(b"exec 2>&1\n")?;
        stdin.flush()?;

        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            let mut reader = BufReader::new(stdout);
            let mut buf = Vec::new();
            loop {
                buf.clear();
                match reader.read_until(b'\n', &mut buf) {
                    Ok(0) | Err(_) => break,
                    Ok(_) => {
                        if buf.last() == Some(&b'\n') {
                            buf.pop();
                        }
                        if tx.send(String::from_utf8_lossy(&buf).into_owned()).is_err() {
                            break;
                        }
                    }
                }
            }
        });

        let sentinel = format!(
            "__docval_done_{}_{}__",
            std::process::id(),
            NEXT_SESSION.fetch_add(1, Ordering::Relaxed)
        );
        Ok(Self { child, stdin, lines: rx, sentinel })
    }

    fn send(&mut self, statement: &str) -> io::Result<()> {
        writeln!(self.stdin, "{}", statement)?;
        writeln!(self.stdin, "printf '\\n%s %d\\n' '{}' \"$?\"", self.sentinel)?;
        self.stdin.flush()
    }

    /// Collect output up to the sentinel line; returns the output and the
    /// statement's exit status.
    fn collect(&mut self, budget: &Budget) -> Result<(String, i32), Interrupted> {
        let mut output = String::new();
        loop {
            if budget.cancel.is_cancelled() {
                self.kill();
                return Err(Interrupted::Cancelled);
            }
            if budget.expired() {
                self.kill();
                return Err(Interrupted::Timeout);
            }

            match self.lines.recv_timeout(budget.remaining().min(POLL_SLICE)) {
                Ok(line) => {
                    if let Some(status) = self.parse_sentinel(&line) {
                        // Drop the newline the sentinel printf emitted.
                        output.pop();
                        return Ok((output, status));
                    }
                    output.push_str(&line);
                    output.push('\n');
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(Interrupted::Backend("shell exited".to_string()));
                }
            }
        }
    }

    fn parse_sentinel(&self, line: &str) -> Option<i32> {
        let rest = line.strip_prefix(self.sentinel.as_str())?.strip_prefix(' ')?;
        rest.trim().parse().ok()
    }

    fn kill(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

impl ExecutionContext for ShellContext {
    fn execute(&mut self, statements: &[String], budget: &Budget) -> Result<ExecutionOutcome, Interrupted> {
        let mut outcome = ExecutionOutcome::default();
        for statement in statements {
            if self.send(statement).is_err() {
                return Err(Interrupted::Backend("shell exited".to_string()));
            }
            let (output, status) = self.collect(budget)?;
            outcome.actual_output.push_str(&output);
            if status != 0 {
                outcome.raised_error = Some(format!("exit status {}", status));
                break;
            }
        }
        Ok(outcome)
    }
}

impl Drop for ShellContext {
    fn drop(&mut self) {
        self.kill();
    }
}
