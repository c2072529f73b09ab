// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Example languages and their interactive prompts.

use std::fmt;

/// Language of an example, resolved from a fence info string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Language {
    /// The built-in docval script language.
    Script,
    /// POSIX shell sessions.
    Shell,
    /// Anything else, kept as written.
    Other(String),
}

impl Language {
    /// Resolve a fence language word, honouring aliases.
    pub fn from_info(word: &str) -> Self {
        match word.to_ascii_lowercase().as_str() {
            "docval" | "dv" | "script" => Language::Script,
            "sh" | "shell" | "console" => Language::Shell,
            _ => Language::Other(word.to_string()),
        }
    }

    /// Name executors are registered under.
    pub fn name(&self) -> &str {
        match self {
            Language::Script => "script",
            Language::Shell => "shell",
            Language::Other(name) => name,
        }
    }

    /// Prompts for languages that have an interactive form.
    pub fn prompts(&self) -> Option<Prompts> {
        match self {
            Language::Script => Some(Prompts::SCRIPT),
            Language::Shell => Some(Prompts::SHELL),
            Language::Other(_) => None,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Primary and continuation prompt of an interactive language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prompts {
    pub primary: &'static str,
    pub continuation: &'static str,
}

impl Prompts {
    pub const SCRIPT: Prompts = Prompts { primary: ">>> ", continuation: "... " };
    pub const SHELL: Prompts = Prompts { primary: "$ ", continuation: "> " };

    /// Input after a primary prompt. `line` must already have its
    /// indentation removed. A bare prompt yields an empty input.
    pub fn strip_primary<'a>(&self, line: &'a str) -> Option<&'a str> {
        strip_prompt(line, self.primary)
    }

    pub fn strip_continuation<'a>(&self, line: &'a str) -> Option<&'a str> {
        strip_prompt(line, self.continuation)
    }
}

fn strip_prompt<'a>(line: &'a str, prompt: &str) -> Option<&'a str> {
    if line.trim_end() == prompt.trim_end() {
        return Some("");
    }
    line.strip_prefix(prompt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases() {
        assert_eq!(Language::from_info("DocVal"), Language::Script);
        assert_eq!(Language::from_info("dv"), Language::Script);
        assert_eq!(Language::from_info("console"), Language::Shell);
        assert_eq!(Language::from_info("python"), Language::Other("python".to_string()));
        assert_eq!(Language::from_info("python").name(), "python");
    }

    #[test]
    fn prompt_stripping() {
        let p = Prompts::SCRIPT;
        assert_eq!(p.strip_primary(">>> x = 1"), Some("x = 1"));
        assert_eq!(p.strip_primary(">>>"), Some(""));
        assert_eq!(p.strip_primary(">>>x"), None);
        assert_eq!(p.strip_continuation("...     y"), Some("    y"));
        assert_eq!(p.strip_continuation("...y"), None);
        assert_eq!(p.strip_continuation("... }"), Some("}"));
        assert_eq!(Prompts::SHELL.strip_primary("$ echo hi"), Some("echo hi"));
    }
}
