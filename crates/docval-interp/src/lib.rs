// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Tree-walk interpreter for the docval example script language.
//!
//! Executes the AST directly. Output is captured into a buffer, and every
//! loop iteration and call is metered so a runaway example can be stopped by
//! a deadline or a cancellation flag.

mod builtins;
mod env;
mod interp;
mod value;

pub use interp::{Interpreter, Interrupt, Limits, RuntimeError, MIN_STACK_SIZE};
pub use value::Value;
