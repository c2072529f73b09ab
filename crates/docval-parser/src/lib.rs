// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Parser for the docval example script language.
//!
//! Transforms a token stream into a list of statements.

mod hints;
mod parser;

pub use parser::{ParseError, ParseResult, Parser};

/// Lex and parse `source` in one step.
///
/// Lexer errors are reported as parse errors so callers deal with a single
/// error type.
pub fn parse_source(source: &str) -> ParseResult {
    let lexed = docval_lexer::Lexer::new(source).tokenize();
    if !lexed.is_ok() {
        return ParseResult {
            stmts: Vec::new(),
            errors: lexed.errors.into_iter().map(ParseError::from).collect(),
        };
    }
    Parser::new(lexed.tokens).parse()
}
