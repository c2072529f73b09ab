// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Aggregated results and their text and JSON renderings.

use std::fmt::Write as _;
use std::path::PathBuf;

use colored::{ColoredString, Colorize};
use serde::Serialize;

use crate::compare::ComparisonResult;

/// Result of one example, located by its first line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExampleResult {
    pub line: usize,
    #[serde(flatten)]
    pub result: ComparisonResult,
}

/// Results of one unit in source order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    pub results: Vec<ExampleResult>,
}

impl FileReport {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), results: Vec::new() }
    }

    pub fn push(&mut self, line: usize, result: ComparisonResult) {
        self.results.push(ExampleResult { line, result });
    }
}

/// Totals over a whole run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub file_reports: Vec<FileReport>,
    pub total_examples: usize,
    pub total_passed: usize,
    pub total_failed: usize,
    pub total_errored: usize,
    pub total_skipped: usize,
    /// The run was interrupted before every example ran.
    pub cancelled: bool,
}

impl RunSummary {
    pub fn from_reports(file_reports: Vec<FileReport>, cancelled: bool) -> Self {
        let mut summary = RunSummary { cancelled, ..RunSummary::default() };
        for result in file_reports.iter().flat_map(|r| &r.results) {
            summary.total_examples += 1;
            match result.result {
                ComparisonResult::Pass => summary.total_passed += 1,
                ComparisonResult::Fail { .. } => summary.total_failed += 1,
                ComparisonResult::Error { .. } => summary.total_errored += 1,
                ComparisonResult::Skipped { .. } => summary.total_skipped += 1,
            }
        }
        summary.file_reports = file_reports;
        summary
    }

    pub fn is_success(&self) -> bool {
        self.total_failed == 0 && self.total_errored == 0
    }

    /// 0 on success, 1 when any example failed or errored.
    pub fn exit_code(&self) -> i32 {
        if self.is_success() {
            0
        } else {
            1
        }
    }
}

/// Human-readable report.
pub fn render_text(summary: &RunSummary) -> String {
    let mut out = String::new();

    for report in &summary.file_reports {
        if report.results.is_empty() {
            continue;
        }
        let _ = writeln!(out, "{}", report.path.display().to_string().underline());
        for r in &report.results {
            let line = format!("line {}", r.line).dimmed();
            let _ = match &r.result {
                ComparisonResult::Pass => writeln!(out, "  {} {}", "✓".green(), line),
                ComparisonResult::Fail { .. } => writeln!(out, "  {} {} - output mismatch", "✗".red(), line),
                ComparisonResult::Error { description } => {
                    writeln!(out, "  {} {} - {}", "✗".red(), line, description)
                }
                ComparisonResult::Skipped { reason } => {
                    writeln!(out, "  {} {} - skipped: {}", "-".yellow(), line, reason)
                }
            };
        }
        out.push('\n');
    }

    let failures: Vec<(&FileReport, &ExampleResult)> = summary
        .file_reports
        .iter()
        .flat_map(|report| report.results.iter().map(move |r| (report, r)))
        .filter(|(_, r)| matches!(r.result, ComparisonResult::Fail { .. } | ComparisonResult::Error { .. }))
        .collect();

    if !failures.is_empty() {
        let _ = writeln!(out, "{}", "Failures:".red().bold());
        for (report, r) in failures {
            let _ = writeln!(out, "  {} {}:{}", "✗".red(), report.path.display(), r.line);
            match &r.result {
                ComparisonResult::Fail { expected, actual, diff } => {
                    section(&mut out, "expected", expected);
                    section(&mut out, "actual", actual);
                    let _ = writeln!(out, "    {}", "diff:".cyan());
                    for line in diff.lines() {
                        let _ = writeln!(out, "      {}", diff_line(line));
                    }
                }
                ComparisonResult::Error { description } => {
                    let _ = writeln!(out, "    {} {}", "error:".red().bold(), description);
                }
                _ => {}
            }
        }
        out.push('\n');
    }

    let _ = writeln!(out, "{}", "─".repeat(50).dimmed());
    let mut counts = vec![
        format!("{} files", summary.file_reports.len()),
        format!("{} examples", summary.total_examples),
        format!("{} passed", summary.total_passed).green().to_string(),
        count_colored(summary.total_failed, "failed"),
        count_colored(summary.total_errored, "errored"),
    ];
    if summary.total_skipped > 0 {
        counts.push(format!("{} skipped", summary.total_skipped).yellow().to_string());
    }
    let _ = writeln!(out, "{}", counts.join(", "));
    if summary.cancelled {
        let _ = writeln!(out, "{}", "run cancelled; remaining examples were skipped".yellow());
    }
    out
}

/// Machine-readable report.
pub fn render_json(summary: &RunSummary) -> serde_json::Result<String> {
    serde_json::to_string_pretty(summary)
}

fn count_colored(n: usize, label: &str) -> String {
    let text = format!("{} {}", n, label);
    if n > 0 {
        text.red().to_string()
    } else {
        text
    }
}

fn section(out: &mut String, title: &str, body: &str) {
    let _ = writeln!(out, "    {}", format!("{}:", title).cyan());
    if body.is_empty() {
        let _ = writeln!(out, "      {}", "(nothing)".dimmed());
    }
    for line in body.lines() {
        let _ = writeln!(out, "      {}", line);
    }
}

fn diff_line(line: &str) -> ColoredString {
    if line.starts_with("+++") || line.starts_with("---") {
        line.bold()
    } else if line.starts_with('+') {
        line.green()
    } else if line.starts_with('-') {
        line.red()
    } else if line.starts_with("@@") {
        line.cyan()
    } else {
        line.normal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> RunSummary {
        let mut a = FileReport::new("a.md");
        a.push(1, ComparisonResult::Pass);
        a.push(4, ComparisonResult::Fail {
            expected: "1".to_string(),
            actual: "2\n".to_string(),
            diff: "--- expected\n+++ actual\n@@ -1 +1 @@\n-1\n+2\n".to_string(),
        });
        let mut b = FileReport::new("b.md");
        b.push(2, ComparisonResult::error("timeout"));
        b.push(9, ComparisonResult::skipped("session aborted"));
        RunSummary::from_reports(vec![a, b], false)
    }

    #[test]
    fn totals() {
        let s = summary();
        assert_eq!(s.total_examples, 4);
        assert_eq!(s.total_passed, 1);
        assert_eq!(s.total_failed, 1);
        assert_eq!(s.total_errored, 1);
        assert_eq!(s.total_skipped, 1);
        assert_eq!(s.exit_code(), 1);
    }

    #[test]
    fn all_pass_or_skip_exits_zero() {
        let mut a = FileReport::new("a.md");
        a.push(1, ComparisonResult::Pass);
        a.push(3, ComparisonResult::skipped("unparseable"));
        assert_eq!(RunSummary::from_reports(vec![a], false).exit_code(), 0);
        assert_eq!(RunSummary::default().exit_code(), 0);
    }

    #[test]
    fn text_report_lists_failures() {
        colored::control::set_override(false);
        let text = render_text(&summary());
        assert!(text.contains("a.md:4"));
        assert!(text.contains("    expected:\n      1\n"));
        assert!(text.contains("    actual:\n      2\n"));
        assert!(text.contains("-1\n"));
        assert!(text.contains("b.md:2"));
        assert!(text.contains("error: timeout"));
        assert!(text.contains("skipped: session aborted"));
        assert!(text.contains("2 files, 4 examples, 1 passed, 1 failed, 1 errored, 1 skipped"));
    }

    #[test]
    fn json_report_shape() {
        let json: serde_json::Value = serde_json::from_str(&render_json(&summary()).unwrap()).unwrap();
        assert_eq!(json["total_examples"], 4);
        assert_eq!(json["cancelled"], false);
        let first = &json["file_reports"][0];
        assert_eq!(first["path"], "a.md");
        assert_eq!(first["results"][0]["line"], 1);
        assert_eq!(first["results"][0]["status"], "pass");
        assert_eq!(first["results"][1]["status"], "fail");
        assert_eq!(first["results"][1]["expected"], "1");
        assert_eq!(json["file_reports"][1]["results"][0]["description"], "timeout");
        assert_eq!(json["file_reports"][1]["results"][1]["reason"], "session aborted");
    }
}
