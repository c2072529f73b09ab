// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Compare what an example produced against what it documents.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use similar::TextDiff;

use crate::example::Expected;
use crate::executor::ExecutionOutcome;

/// Default wildcard token.
pub const DEFAULT_WILDCARD: &str = "***";

/// How expected and actual text are judged equal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Equivalence {
    /// Equal after dropping trailing newlines on both sides.
    #[default]
    Exact,
    /// Every whitespace run collapsed to one space, ends trimmed.
    NormalizeWhitespace,
    /// The wildcard token matches any run of characters, including none.
    Wildcard,
}

impl Equivalence {
    pub fn as_str(self) -> &'static str {
        match self {
            Equivalence::Exact => "exact",
            Equivalence::NormalizeWhitespace => "normalize-whitespace",
            Equivalence::Wildcard => "wildcard",
        }
    }
}

impl fmt::Display for Equivalence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Equivalence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exact" => Ok(Equivalence::Exact),
            "normalize-whitespace" => Ok(Equivalence::NormalizeWhitespace),
            "wildcard" => Ok(Equivalence::Wildcard),
            other => Err(format!(
                "unknown equivalence '{}' (expected exact, normalize-whitespace or wildcard)",
                other
            )),
        }
    }
}

/// Equivalence mode plus the wildcard token it may use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy {
    pub equivalence: Equivalence,
    pub wildcard: String,
}

impl Default for Policy {
    fn default() -> Self {
        Self { equivalence: Equivalence::Exact, wildcard: DEFAULT_WILDCARD.to_string() }
    }
}

impl Policy {
    /// The same policy with a per-example mode override applied.
    pub fn with_override(&self, equivalence: Option<Equivalence>) -> Policy {
        Policy {
            equivalence: equivalence.unwrap_or(self.equivalence),
            wildcard: self.wildcard.clone(),
        }
    }

    pub fn matches(&self, expected: &str, actual: &str) -> bool {
        match self.equivalence {
            Equivalence::Exact => trim_newlines(expected) == trim_newlines(actual),
            Equivalence::NormalizeWhitespace => collapse_whitespace(expected) == collapse_whitespace(actual),
            Equivalence::Wildcard => wildcard_match(trim_newlines(expected), trim_newlines(actual), &self.wildcard),
        }
    }
}

/// Verdict for one example.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ComparisonResult {
    Pass,
    Fail { expected: String, actual: String, diff: String },
    Error { description: String },
    Skipped { reason: String },
}

impl ComparisonResult {
    pub fn error(description: impl Into<String>) -> Self {
        ComparisonResult::Error { description: description.into() }
    }

    pub fn skipped(reason: impl Into<String>) -> Self {
        ComparisonResult::Skipped { reason: reason.into() }
    }

    fn fail(expected: &str, actual: &str) -> Self {
        ComparisonResult::Fail {
            expected: expected.to_string(),
            actual: actual.to_string(),
            diff: unified_diff(expected, actual),
        }
    }
}

/// Judge an outcome against the expectation.
pub fn compare(expected: &Expected, outcome: &ExecutionOutcome, policy: &Policy) -> ComparisonResult {
    match (&outcome.raised_error, expected) {
        (Some(raised), Expected::Error(want)) => {
            if policy.matches(want, raised) {
                ComparisonResult::Pass
            } else {
                ComparisonResult::fail(want, raised)
            }
        }
        (Some(raised), _) => ComparisonResult::error(raised.clone()),
        (None, Expected::Error(want)) => ComparisonResult::fail(want, &outcome.actual_output),
        (None, Expected::Output(want)) => {
            if policy.matches(want, &outcome.actual_output) {
                ComparisonResult::Pass
            } else {
                ComparisonResult::fail(want, &outcome.actual_output)
            }
        }
        (None, Expected::Absent) => ComparisonResult::Pass,
    }
}

/// Line-level unified diff from expected to actual.
pub fn unified_diff(expected: &str, actual: &str) -> String {
    let expected = with_final_newline(expected);
    let actual = with_final_newline(actual);
    TextDiff::from_lines(expected.as_str(), actual.as_str())
        .unified_diff()
        .context_radius(3)
        .header("expected", "actual")
        .to_string()
}

fn with_final_newline(text: &str) -> String {
    let mut s = trim_newlines(text).to_string();
    s.push('\n');
    s
}

fn trim_newlines(text: &str) -> &str {
    text.trim_end_matches(['\n', '\r'])
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Glob-style match where `token` stands for any run of characters.
fn wildcard_match(pattern: &str, text: &str, token: &str) -> bool {
    if token.is_empty() || !pattern.contains(token) {
        return pattern == text;
    }

    let parts: Vec<&str> = pattern.split(token).collect();
    let (first, last) = (parts[0], parts[parts.len() - 1]);
    if !text.starts_with(first) || !text.ends_with(last) || text.len() < first.len() + last.len() {
        return false;
    }

    // Leftmost matching of the middle parts is sufficient for `*` globs.
    let mut rest = &text[first.len()..text.len() - last.len()];
    for part in &parts[1..parts.len() - 1] {
        match rest.find(part) {
            Some(at) => rest = &rest[at + part.len()..],
            None => return false,
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(output: &str, error: Option<&str>) -> ExecutionOutcome {
        ExecutionOutcome { actual_output: output.to_string(), raised_error: error.map(String::from) }
    }

    fn policy(equivalence: Equivalence) -> Policy {
        Policy { equivalence, ..Policy::default() }
    }

    #[test]
    fn absent_expectation_passes_without_error() {
        let result = compare(&Expected::Absent, &outcome("anything\n", None), &Policy::default());
        assert_eq!(result, ComparisonResult::Pass);
    }

    #[test]
    fn raised_error_without_expectation_is_error() {
        let result = compare(&Expected::Absent, &outcome("", Some("Error: boom")), &Policy::default());
        assert_eq!(result, ComparisonResult::error("Error: boom"));
        let result = compare(&Expected::Output("1".into()), &outcome("", Some("Error: boom")), &Policy::default());
        assert_eq!(result, ComparisonResult::error("Error: boom"));
    }

    #[test]
    fn expected_error_matches_raised_error() {
        let expected = Expected::Error("ZeroDivisionError: division by zero".into());
        let pass = compare(&expected, &outcome("", Some("ZeroDivisionError: division by zero")), &Policy::default());
        assert_eq!(pass, ComparisonResult::Pass);
        let fail = compare(&expected, &outcome("", Some("TypeError: nope")), &Policy::default());
        assert!(matches!(fail, ComparisonResult::Fail { .. }));
    }

    #[test]
    fn expected_error_not_raised_fails() {
        let expected = Expected::Error("Error: x".into());
        match compare(&expected, &outcome("fine\n", None), &Policy::default()) {
            ComparisonResult::Fail { expected, actual, .. } => {
                assert_eq!(expected, "Error: x");
                assert_eq!(actual, "fine\n");
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn exact_ignores_trailing_newlines_only() {
        let p = policy(Equivalence::Exact);
        assert!(p.matches("42", "42\n"));
        assert!(!p.matches("42", " 42\n"));
        assert!(!p.matches("a\nb", "a\n\nb\n"));
    }

    #[test]
    fn normalize_whitespace() {
        let p = policy(Equivalence::NormalizeWhitespace);
        assert!(p.matches("[1, 2,\n 3]", "[1,   2, 3]\n"));
        assert!(!p.matches("[1,2]", "[1, 2]"));
    }

    #[test]
    fn wildcard_matching() {
        let p = policy(Equivalence::Wildcard);
        assert!(p.matches("id=***", "id=abc123\n"));
        assert!(p.matches("id=***", "id="));
        assert!(!p.matches("id=***", "name=abc123"));
        assert!(p.matches("<fn ***> at ***!", "<fn f> at 0x1!"));
        assert!(!p.matches("a***a", "a"));
        assert!(p.matches("a***a", "aa"));
        assert!(p.matches("***", ""));
    }

    #[test]
    fn wildcard_token_is_configurable() {
        let p = Policy { equivalence: Equivalence::Wildcard, wildcard: "...".to_string() };
        assert!(p.matches("took ... ms", "took 12 ms"));
        assert!(!p.matches("took *** ms", "took 12 ms"));
    }

    #[test]
    fn per_example_override() {
        let base = Policy::default();
        assert_eq!(base.with_override(Some(Equivalence::Wildcard)).equivalence, Equivalence::Wildcard);
        assert_eq!(base.with_override(None).equivalence, Equivalence::Exact);
    }

    #[test]
    fn failure_carries_unified_diff() {
        let result = compare(&Expected::Output("a\nb".into()), &outcome("a\nc\n", None), &Policy::default());
        let ComparisonResult::Fail { diff, .. } = result else {
            panic!("expected failure");
        };
        assert!(diff.contains("--- expected"));
        assert!(diff.contains("+++ actual"));
        assert!(diff.contains("-b"));
        assert!(diff.contains("+c"));
    }

    #[test]
    fn parse_equivalence_names() {
        assert_eq!("normalize-whitespace".parse::<Equivalence>(), Ok(Equivalence::NormalizeWhitespace));
        assert!("fuzzy".parse::<Equivalence>().is_err());
        assert_eq!(Equivalence::Wildcard.to_string(), "wildcard");
    }
}
