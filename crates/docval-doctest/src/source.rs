// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Documentation sources.

use std::fs;
use std::io;
use std::ops::Range;
use std::path::{Path, PathBuf};

/// How examples are embedded in a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Markdown page; examples in fences or at top level.
    Markdown,
    /// Rust source; examples live in `///` and `//!` doc comments.
    RustSource,
    /// Python source; docstrings are scanned verbatim.
    PythonSource,
    PlainText,
}

impl SourceKind {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()).map(|e| e.to_ascii_lowercase()).as_deref() {
            Some("md") | Some("markdown") => SourceKind::Markdown,
            Some("rs") => SourceKind::RustSource,
            Some("py") => SourceKind::PythonSource,
            _ => SourceKind::PlainText,
        }
    }
}

/// One documentation source. Immutable once loaded.
#[derive(Debug, Clone)]
pub struct SourceUnit {
    pub path: PathBuf,
    pub text: String,
    pub kind: SourceKind,
}

impl SourceUnit {
    pub fn new(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        let path = path.into();
        let kind = SourceKind::from_path(&path);
        Self { path, text: text.into(), kind }
    }

    pub fn load(path: &Path) -> io::Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(Self::new(path, text))
    }

    /// Byte range of every line, without its `\n` or `\r\n` terminator.
    /// Line `n` (1-based) is at index `n - 1`.
    pub fn line_spans(&self) -> Vec<Range<usize>> {
        let mut spans = Vec::new();
        let mut offset = 0;
        for line in self.text.split_inclusive('\n') {
            let body = match line.strip_suffix('\n') {
                Some(body) => body.strip_suffix('\r').unwrap_or(body),
                None => line,
            };
            spans.push(offset..offset + body.len());
            offset += line.len();
        }
        spans
    }

    /// Lines of the text; line `n` (1-based) is at index `n - 1`.
    pub fn lines(&self) -> Vec<&str> {
        self.line_spans().into_iter().map(|span| &self.text[span]).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_from_extension() {
        assert_eq!(SourceKind::from_path(Path::new("README.md")), SourceKind::Markdown);
        assert_eq!(SourceKind::from_path(Path::new("guide.MARKDOWN")), SourceKind::Markdown);
        assert_eq!(SourceKind::from_path(Path::new("src/lib.rs")), SourceKind::RustSource);
        assert_eq!(SourceKind::from_path(Path::new("mod.py")), SourceKind::PythonSource);
        assert_eq!(SourceKind::from_path(Path::new("notes.rst")), SourceKind::PlainText);
        assert_eq!(SourceKind::from_path(Path::new("LICENSE")), SourceKind::PlainText);
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.md");
        fs::write(&path, "one\ntwo\n").unwrap();
        let unit = SourceUnit::load(&path).unwrap();
        assert_eq!(unit.kind, SourceKind::Markdown);
        assert_eq!(unit.lines(), vec!["one", "two"]);
    }

    #[test]
    fn crlf_lines_exclude_terminators() {
        let unit = SourceUnit::new("a.md", "one\r\ntwo\n\r\nlast\r");
        assert_eq!(unit.lines(), vec!["one", "two", "", "last\r"]);
        assert_eq!(unit.line_spans(), vec![0..3, 5..8, 9..9, 11..16]);
    }
}
