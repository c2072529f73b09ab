// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Run every unit of an invocation on a pool of worker threads.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use docval_interp::MIN_STACK_SIZE;

use crate::cancel::CancelToken;
use crate::compare::{ComparisonResult, Policy};
use crate::error::EnvironmentError;
use crate::example::{parse_block, DEFAULT_ERROR_HEADER};
use crate::executor::ExecutorRegistry;
use crate::extract::{extract, Extracted};
use crate::report::{FileReport, RunSummary};
use crate::session::{Session, SessionOptions};
use crate::source::SourceUnit;

/// Settings for one invocation.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub policy: Policy,
    pub timeout: Duration,
    pub error_header: String,
    /// Worker threads, at least one.
    pub workers: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            policy: Policy::default(),
            timeout: Duration::from_millis(crate::config::DEFAULT_TIMEOUT_MS),
            error_header: DEFAULT_ERROR_HEADER.to_string(),
            workers: 1,
        }
    }
}

impl From<&crate::config::Config> for RunOptions {
    fn from(config: &crate::config::Config) -> Self {
        Self {
            policy: config.policy(),
            timeout: config.timeout(),
            error_header: config.error_header.clone(),
            workers: config.workers(),
        }
    }
}

/// Validate `paths`, one session per file, and aggregate the results in
/// input order.
///
/// Only an environment failure aborts the run.
pub fn run_units(
    paths: &[PathBuf],
    options: &RunOptions,
    registry: &ExecutorRegistry,
    cancel: &CancelToken,
) -> Result<RunSummary, EnvironmentError> {
    let workers = options.workers.clamp(1, paths.len().max(1));
    let next = &AtomicUsize::new(0);
    let fatal = &AtomicBool::new(false);

    tracing::debug!(files = paths.len(), workers, "starting run");

    let mut collected: Vec<(usize, Result<FileReport, EnvironmentError>)> = thread::scope(|s| {
        let mut handles = Vec::with_capacity(workers);
        for id in 0..workers {
            let spawned = thread::Builder::new()
                .name(format!("docval-worker-{}", id))
                .stack_size(MIN_STACK_SIZE)
                .spawn_scoped(s, move || {
                    let mut done = Vec::new();
                    while !fatal.load(Ordering::Acquire) {
                        let index = next.fetch_add(1, Ordering::Relaxed);
                        let Some(path) = paths.get(index) else {
                            break;
                        };
                        let result = if cancel.is_cancelled() {
                            Ok(cancelled_unit(path))
                        } else {
                            run_unit(path, options, registry, cancel)
                        };
                        if result.is_err() {
                            fatal.store(true, Ordering::Release);
                        }
                        done.push((index, result));
                    }
                    done
                });
            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    fatal.store(true, Ordering::Release);
                    return Err(EnvironmentError::Other(format!("cannot start worker thread: {}", e)));
                }
            }
        }

        Ok(handles
            .into_iter()
            .flat_map(|h| match h.join() {
                Ok(done) => done,
                Err(panic) => std::panic::resume_unwind(panic),
            })
            .collect())
    })?;

    collected.sort_by_key(|(index, _)| *index);

    let mut reports = Vec::with_capacity(collected.len());
    for (_, result) in collected {
        reports.push(result?);
    }

    let summary = RunSummary::from_reports(reports, cancel.is_cancelled());
    tracing::info!(
        examples = summary.total_examples,
        passed = summary.total_passed,
        failed = summary.total_failed,
        errored = summary.total_errored,
        skipped = summary.total_skipped,
        "run finished"
    );
    Ok(summary)
}

/// Validate a single file.
pub fn run_unit(
    path: &Path,
    options: &RunOptions,
    registry: &ExecutorRegistry,
    cancel: &CancelToken,
) -> Result<FileReport, EnvironmentError> {
    let unit = match SourceUnit::load(path) {
        Ok(unit) => unit,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "cannot read file");
            return Ok(FileReport::new(path));
        }
    };
    tracing::debug!(path = %path.display(), "unit started");

    let mut report = FileReport::new(path);
    let mut session = Session::open(
        &unit,
        registry,
        SessionOptions { policy: options.policy.clone(), timeout: options.timeout, cancel: cancel.clone() },
    );

    for item in extract(&unit) {
        let line = item.start_line();
        let result = match item {
            Extracted::Malformed { reason, .. } => {
                tracing::debug!(path = %path.display(), line, reason = %reason, "malformed example");
                ComparisonResult::skipped("unparseable")
            }
            Extracted::Block(block) if block.skip => ComparisonResult::skipped("skip directive"),
            Extracted::Block(block) if registry.get(&block.language).is_none() => {
                ComparisonResult::skipped(format!("no executor for language '{}'", block.language))
            }
            Extracted::Block(block) => match parse_block(&block, &options.error_header) {
                Ok(example) => session.run(&example)?,
                Err(e) => {
                    tracing::debug!(path = %path.display(), line, error = %e, "unparseable example");
                    ComparisonResult::skipped("unparseable")
                }
            },
        };
        report.push(line, result);
    }

    session.close();
    tracing::debug!(path = %path.display(), examples = report.results.len(), "unit finished");
    Ok(report)
}

/// Report for a unit never started: every example skipped.
fn cancelled_unit(path: &Path) -> FileReport {
    let mut report = FileReport::new(path);
    if let Ok(unit) = SourceUnit::load(path) {
        for item in extract(&unit) {
            report.push(item.start_line(), ComparisonResult::skipped("cancelled"));
        }
    }
    report
}
