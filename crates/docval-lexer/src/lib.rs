// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Lexer for the docval example script language.
//!
//! Tokenizes one example statement (possibly spanning continuation lines)
//! into a stream of tokens for the parser.

mod lexer;

pub use lexer::{LexError, LexResult, Lexer};
