// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Terminal colours.
//!
//! Respects NO_COLOR and FORCE_COLOR. Colours are off when stdout is piped.

use colored::{ColoredString, Colorize};

/// Set the colour override from the environment. Call once at startup.
pub fn init() {
    if std::env::var_os("NO_COLOR").is_some() {
        colored::control::set_override(false);
    } else if std::env::var_os("FORCE_COLOR").is_some() {
        colored::control::set_override(true);
    }
}

pub fn error_label() -> ColoredString {
    "error".red().bold()
}

pub fn warning_label() -> ColoredString {
    "warning".yellow().bold()
}
