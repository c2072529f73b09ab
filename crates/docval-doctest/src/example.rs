// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Split an example block into statements and an expectation.

use crate::compare::Equivalence;
use crate::error::ExampleParseError;
use crate::extract::ExampleBlock;
use crate::language::Prompts;

/// Header line that starts an expected-error annotation by default.
pub const DEFAULT_ERROR_HEADER: &str = "Traceback (most recent call last):";

/// Marker of an inline directive comment.
const DIRECTIVE_MARKER: &str = "# docval:";

/// What an example says should happen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expected {
    /// No output written after the inputs; anything goes unless an error is
    /// raised.
    Absent,
    Output(String),
    /// The example must raise an error with this text.
    Error(String),
}

/// Per-example directives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExampleOptions {
    pub skip: bool,
    pub equivalence: Option<Equivalence>,
}

/// One executable example.
#[derive(Debug, Clone)]
pub struct Example {
    pub block: ExampleBlock,
    /// Input statements in order; continuation lines are joined with `\n`.
    pub statements: Vec<String>,
    pub expected: Expected,
    pub options: ExampleOptions,
}

impl Example {
    pub fn line(&self) -> usize {
        self.block.start_line
    }
}

/// Parse a block into an [`Example`].
///
/// `error_header` is the first expected line that marks an expected error.
pub fn parse_block(block: &ExampleBlock, error_header: &str) -> Result<Example, ExampleParseError> {
    let prompts = block.language.prompts().unwrap_or(Prompts::SCRIPT);
    let mut statements: Vec<String> = Vec::new();
    let mut output: Vec<&str> = Vec::new();

    for (offset, line) in block.content.iter().enumerate() {
        let trimmed = line.trim_start();
        if output.is_empty() {
            if let Some(input) = prompts.strip_primary(trimmed) {
                statements.push(input.to_string());
                continue;
            }
            if let Some(input) = prompts.strip_continuation(trimmed) {
                let Some(last) = statements.last_mut() else {
                    return Err(ExampleParseError::OrphanContinuation { line: block.start_line + offset });
                };
                last.push('\n');
                last.push_str(input);
                continue;
            }
            if statements.is_empty() {
                continue;
            }
        }
        output.push(line);
    }

    if statements.is_empty() {
        return Err(ExampleParseError::NoStatements);
    }

    let options = parse_options(&statements);
    let expected = expectation(&output, error_header);
    Ok(Example { block: block.clone(), statements, expected, options })
}

fn expectation(output: &[&str], error_header: &str) -> Expected {
    let Some((first, rest)) = output.split_first() else {
        return Expected::Absent;
    };
    if first.trim() == error_header.trim() {
        // Indented lines are the traceback body; what remains is the error.
        let text: Vec<&str> = rest
            .iter()
            .copied()
            .filter(|l| !l.starts_with([' ', '\t']))
            .collect();
        return Expected::Error(text.join("\n"));
    }
    Expected::Output(output.join("\n"))
}

/// Collect `# docval: opt, opt` directives from every statement line.
fn parse_options(statements: &[String]) -> ExampleOptions {
    let mut options = ExampleOptions::default();
    for line in statements.iter().flat_map(|s| s.lines()) {
        let Some(at) = line.find(DIRECTIVE_MARKER) else {
            continue;
        };
        for word in line[at + DIRECTIVE_MARKER.len()..].split(',').map(str::trim) {
            match word {
                "" => {}
                "skip" => options.skip = true,
                other => match other.parse::<Equivalence>() {
                    Ok(mode) => options.equivalence = Some(mode),
                    Err(_) => tracing::warn!(directive = other, "unknown docval directive ignored"),
                },
            }
        }
    }
    options
}
