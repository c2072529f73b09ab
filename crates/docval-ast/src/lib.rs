// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Syntax tree types for the docval example script language.
//!
//! Shared between the lexer, the parser and the interpreter.

pub mod span;
pub mod token;
pub mod expr;
pub mod stmt;

pub use span::{LineMap, Span};
