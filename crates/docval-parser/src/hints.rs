// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Error hints - suggestions for fixing common mistakes.

use docval_ast::token::TokenKind;

/// Get a hint for an "expected X" error based on context.
pub fn for_expected(expected: &str, found: &TokenKind) -> Option<&'static str> {
    match (expected, found) {
        ("'{'", _) => Some("blocks start with '{'"),
        ("'}'", TokenKind::Eof) => Some("every '{' needs a matching '}'"),
        ("'}'", _) => None,

        ("')'", TokenKind::Eof) => Some("add ')' to close the parenthesis"),
        ("']'", TokenKind::Eof) => Some("add ']' to close the bracket"),

        ("'='", TokenKind::EqEq) => Some("use '=' to bind a value, '==' to compare"),

        ("expression", TokenKind::Eq) => Some("use '==' for comparison"),
        ("expression", TokenKind::Newline) | ("expression", TokenKind::Semi) => {
            Some("statement is incomplete")
        }
        ("expression", TokenKind::Eof) => Some("statement is incomplete"),
        ("expression", _) => Some("try a value, variable, or function call"),

        ("a name", TokenKind::Int(_)) => Some("names can't start with a number"),
        ("a name", _) => Some("names start with a letter or '_'"),

        ("newline or ';'", _) => Some("put each statement on its own line or separate them with ';'"),

        _ => None,
    }
}
