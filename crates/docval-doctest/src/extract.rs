// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Extract example blocks from documentation sources.
//!
//! Two conventions are recognised:
//!
//! - Interactive prompts anywhere in the text:
//!   ```text
//!   >>> let x = 2
//!   >>> x * 21
//!   42
//!   ```
//! - Fenced blocks whose info string carries `run`, e.g. a fence opened
//!   with `` ```docval run `` or `~~~sh run`. Inside, content is split into
//!   prompt groups with the fence language's prompts.
//!
//! Every prompt group (input lines plus the output below them) becomes one
//! [`ExampleBlock`]. Unfenced prompts in Python docstrings are Python
//! doctests and are tagged as such rather than as docval script. Problems never stop the scan: they are reported as
//! [`Extracted::Malformed`] and scanning continues.

use std::collections::VecDeque;
use std::ops::Range;
use std::path::PathBuf;

use crate::language::{Language, Prompts};
use crate::source::{SourceKind, SourceUnit};

/// A contiguous region of a source holding one example.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExampleBlock {
    pub path: PathBuf,
    /// First line of the block (1-indexed)
    pub start_line: usize,
    /// Last line of the block (1-indexed, inclusive)
    pub end_line: usize,
    /// Source text of lines `start_line..=end_line`, terminators between
    /// them kept as written
    pub raw_text: String,
    /// The same lines without doc-comment markers and common indentation
    pub content: Vec<String>,
    pub language: Language,
    /// Set by a fence `skip` directive.
    pub skip: bool,
}

/// One item produced by the extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extracted {
    Block(ExampleBlock),
    Malformed {
        start_line: usize,
        end_line: usize,
        reason: String,
    },
}

impl Extracted {
    pub fn start_line(&self) -> usize {
        match self {
            Extracted::Block(block) => block.start_line,
            Extracted::Malformed { start_line, .. } => *start_line,
        }
    }
}

/// A line inside a scannable region, with any comment marker removed.
#[derive(Debug, Clone, Copy)]
struct RegionLine<'a> {
    number: usize,
    text: &'a str,
}

/// Lazy iterator over the examples of a unit, in source order.
///
/// Cloning an unstarted iterator, or calling [`extract`] again, scans the
/// same text and yields the same sequence.
#[derive(Debug, Clone)]
pub struct Blocks<'a> {
    path: &'a std::path::Path,
    text: &'a str,
    spans: Vec<Range<usize>>,
    /// Language of prompts outside fences.
    prompt_language: Language,
    regions: Vec<Vec<RegionLine<'a>>>,
    region: usize,
    pos: usize,
    pending: VecDeque<Extracted>,
}

/// Scan `unit` for examples.
pub fn extract(unit: &SourceUnit) -> Blocks<'_> {
    let spans = unit.line_spans();
    let lines: Vec<&str> = spans.iter().map(|span| &unit.text[span.clone()]).collect();
    let prompt_language = match unit.kind {
        SourceKind::PythonSource => Language::Other("python".to_string()),
        _ => Language::Script,
    };
    let regions = match unit.kind {
        SourceKind::RustSource => doc_comment_regions(&lines),
        SourceKind::PythonSource => docstring_regions(&lines),
        SourceKind::Markdown | SourceKind::PlainText => vec![lines
            .iter()
            .enumerate()
            .map(|(i, &text)| RegionLine { number: i + 1, text })
            .collect()],
    };
    Blocks {
        path: &unit.path,
        text: &unit.text,
        spans,
        prompt_language,
        regions,
        region: 0,
        pos: 0,
        pending: VecDeque::new(),
    }
}

impl Iterator for Blocks<'_> {
    type Item = Extracted;

    fn next(&mut self) -> Option<Extracted> {
        loop {
            if let Some(item) = self.pending.pop_front() {
                return Some(item);
            }
            let region = self.regions.get(self.region)?;
            if self.pos >= region.len() {
                self.region += 1;
                self.pos = 0;
                continue;
            }
            let scanner = Scanner {
                path: self.path,
                text: self.text,
                spans: &self.spans,
                prompt_language: &self.prompt_language,
            };
            self.pos = scanner.step(region, self.pos, &mut self.pending);
        }
    }
}

/// Runs of consecutive `///` or `//!` lines.
fn doc_comment_regions<'a>(lines: &[&'a str]) -> Vec<Vec<RegionLine<'a>>> {
    let mut regions = Vec::new();
    let mut current = Vec::new();

    for (i, &line) in lines.iter().enumerate() {
        let trimmed = line.trim_start();
        let doc = if trimmed.starts_with("////") {
            None
        } else {
            trimmed.strip_prefix("///").or_else(|| trimmed.strip_prefix("//!"))
        };
        match doc {
            Some(text) => current.push(RegionLine { number: i + 1, text }),
            None if !current.is_empty() => regions.push(std::mem::take(&mut current)),
            None => {}
        }
    }
    if !current.is_empty() {
        regions.push(current);
    }
    regions
}

/// Lines between triple-quote delimiters. The delimiter lines themselves
/// are not scanned.
fn docstring_regions<'a>(lines: &[&'a str]) -> Vec<Vec<RegionLine<'a>>> {
    let mut regions = Vec::new();
    let mut open: Option<(&str, Vec<RegionLine<'a>>)> = None;

    for (i, &line) in lines.iter().enumerate() {
        match open.take() {
            None => {
                let delim = ["\"\"\"", "'''"]
                    .into_iter()
                    .filter_map(|d| line.find(d).map(|at| (at, d)))
                    .min()
                    .map(|(_, d)| d);
                // A docstring that closes on its own line has no examples.
                if let Some(delim) = delim.filter(|d| line.matches(d).count() == 1) {
                    open = Some((delim, Vec::new()));
                }
            }
            Some((delim, body)) if line.contains(delim) => regions.push(body),
            Some((delim, mut body)) => {
                body.push(RegionLine { number: i + 1, text: line });
                open = Some((delim, body));
            }
        }
    }
    if let Some((_, body)) = open {
        regions.push(body);
    }
    regions
}

/// An opening code fence.
#[derive(Debug)]
struct Fence {
    ch: char,
    len: usize,
    language: String,
    run: bool,
    skip: bool,
}

impl Fence {
    /// Parse a fence opener from a line with indentation removed.
    fn open(line: &str) -> Option<Fence> {
        let ch = line.chars().next().filter(|c| *c == '`' || *c == '~')?;
        let len = line.chars().take_while(|c| *c == ch).count();
        if len < 3 {
            return None;
        }
        let info = line[len * ch.len_utf8()..].trim();
        let mut words = info
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|w| !w.is_empty());
        let language = words.next().unwrap_or("").to_string();
        let directives: Vec<&str> = words.collect();
        Some(Fence {
            ch,
            len,
            language,
            run: directives.contains(&"run"),
            skip: directives.contains(&"skip"),
        })
    }

    fn is_closed_by(&self, line: &str) -> bool {
        let line = line.trim();
        line.chars().count() >= self.len && line.chars().all(|c| c == self.ch)
    }
}

struct Scanner<'s> {
    path: &'s std::path::Path,
    text: &'s str,
    spans: &'s [Range<usize>],
    prompt_language: &'s Language,
}

impl Scanner<'_> {
    /// Scan from `pos`, pushing what was found. Returns the next position,
    /// always past `pos`.
    fn step(&self, region: &[RegionLine<'_>], pos: usize, out: &mut VecDeque<Extracted>) -> usize {
        let line = region[pos];
        let trimmed = line.text.trim_start();

        if let Some(fence) = Fence::open(trimmed) {
            return self.fence(region, pos, &fence, out);
        }

        let prompts = Prompts::SCRIPT;
        if prompts.strip_primary(trimmed).is_some() {
            let end = group_end(region, pos, prompts, true);
            out.push_back(Extracted::Block(self.block(&region[pos..=end], self.prompt_language.clone(), false)));
            return end + 1;
        }
        if prompts.strip_continuation(trimmed).is_some() {
            out.push_back(orphan(line.number));
        }
        pos + 1
    }

    fn fence(&self, region: &[RegionLine<'_>], pos: usize, fence: &Fence, out: &mut VecDeque<Extracted>) -> usize {
        let opener = region[pos];
        let close = region[pos + 1..]
            .iter()
            .position(|l| fence.is_closed_by(l.text))
            .map(|offset| pos + 1 + offset);

        if !fence.run {
            return close.map(|c| c + 1).unwrap_or(pos + 1);
        }

        let Some(close) = close else {
            let last = region.last().map(|l| l.number).unwrap_or(opener.number);
            tracing::debug!(path = %self.path.display(), line = opener.number, "unterminated fence");
            out.push_back(Extracted::Malformed {
                start_line: opener.number,
                end_line: last,
                reason: "unterminated fence".to_string(),
            });
            return pos + 1;
        };

        let body = &region[pos + 1..close];
        let language = Language::from_info(&fence.language);
        match language.prompts() {
            None => {
                let mut block = self.block(&region[pos..=close], language, fence.skip);
                block.content = dedent(body.iter().map(|l| l.text));
                out.push_back(Extracted::Block(block));
            }
            Some(prompts) => {
                let before = out.len();
                self.segment(body, prompts, &language, fence.skip, out);
                if out.len() == before {
                    out.push_back(Extracted::Malformed {
                        start_line: opener.number,
                        end_line: region[close].number,
                        reason: "executable fence contains no prompt".to_string(),
                    });
                }
            }
        }
        close + 1
    }

    /// Split a fence body into prompt groups.
    fn segment(
        &self,
        body: &[RegionLine<'_>],
        prompts: Prompts,
        language: &Language,
        skip: bool,
        out: &mut VecDeque<Extracted>,
    ) {
        let mut i = 0;
        while i < body.len() {
            let trimmed = body[i].text.trim_start();
            if prompts.strip_primary(trimmed).is_some() {
                let end = group_end(body, i, prompts, false);
                out.push_back(Extracted::Block(self.block(&body[i..=end], language.clone(), skip)));
                i = end + 1;
                continue;
            }
            if prompts.strip_continuation(trimmed).is_some() {
                out.push_back(orphan(body[i].number));
            }
            i += 1;
        }
    }

    fn block(&self, lines: &[RegionLine<'_>], language: Language, skip: bool) -> ExampleBlock {
        let start_line = lines.first().map(|l| l.number).unwrap_or(1);
        let end_line = lines.last().map(|l| l.number).unwrap_or(start_line);
        let raw_text = self.text[self.spans[start_line - 1].start..self.spans[end_line - 1].end].to_string();
        ExampleBlock {
            path: self.path.to_path_buf(),
            start_line,
            end_line,
            raw_text,
            content: dedent(lines.iter().map(|l| l.text)),
            language,
            skip,
        }
    }
}

fn orphan(line: usize) -> Extracted {
    Extracted::Malformed {
        start_line: line,
        end_line: line,
        reason: "continuation prompt without a preceding primary prompt".to_string(),
    }
}

/// Index of the last line of the prompt group starting at `start`.
///
/// Continuation lines may follow the inputs; output runs to a blank line,
/// the next primary prompt, or the end of `lines`.
fn group_end(lines: &[RegionLine<'_>], start: usize, prompts: Prompts, stop_at_fence: bool) -> usize {
    let mut end = start;
    let mut in_output = false;

    for (j, line) in lines.iter().enumerate().skip(start + 1) {
        let trimmed = line.text.trim_start();
        if trimmed.is_empty() || prompts.strip_primary(trimmed).is_some() {
            break;
        }
        if stop_at_fence && Fence::open(trimmed).is_some() {
            break;
        }
        if prompts.strip_continuation(trimmed).is_some() {
            if in_output {
                break;
            }
        } else {
            in_output = true;
        }
        end = j;
    }
    end
}

/// Remove the indentation shared by all non-blank lines.
fn dedent<'a>(lines: impl Iterator<Item = &'a str> + Clone) -> Vec<String> {
    let indent = lines
        .clone()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start_matches([' ', '\t']).len())
        .min()
        .unwrap_or(0);
    lines
        .map(|l| if l.trim().is_empty() { String::new() } else { l[indent..].to_string() })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blocks(path: &str, text: &str) -> Vec<Extracted> {
        let unit = SourceUnit::new(path, text);
        extract(&unit).collect()
    }

    fn only_blocks(items: &[Extracted]) -> Vec<&ExampleBlock> {
        items
            .iter()
            .filter_map(|item| match item {
                Extracted::Block(b) => Some(b),
                Extracted::Malformed { .. } => None,
            })
            .collect()
    }

    #[test]
    fn top_level_prompt_groups() {
        let text = "# Title\n\n>>> let x = 2\n>>> x * 21\n42\n\nProse.\n>>> x\n2\n";
        let items = blocks("guide.md", text);
        let found = only_blocks(&items);
        assert_eq!(found.len(), 3);
        assert_eq!((found[0].start_line, found[0].end_line), (3, 3));
        assert_eq!(found[0].content, vec![">>> let x = 2"]);
        assert_eq!(found[0].language, Language::Script);
        assert_eq!((found[1].start_line, found[1].end_line), (4, 5));
        assert_eq!(found[1].content, vec![">>> x * 21", "42"]);
        assert_eq!((found[2].start_line, found[2].end_line), (8, 9));
    }

    #[test]
    fn executable_fence_split_per_group() {
        let text = "```docval run\n>>> 1 + 1\n2\n>>> print(\"a\")\na\n```\n";
        let items = blocks("a.md", text);
        let found = only_blocks(&items);
        assert_eq!(found.len(), 2);
        assert_eq!((found[0].start_line, found[0].end_line), (2, 3));
        assert_eq!((found[1].start_line, found[1].end_line), (4, 5));
    }

    #[test]
    fn non_executable_fence_is_ignored() {
        let text = "```python\n>>> 1 + 1\n2\n```\n";
        assert!(blocks("a.md", text).is_empty());
    }

    #[test]
    fn unknown_language_fence_is_one_block() {
        let text = "~~~ruby run\nputs 1\n~~~\n";
        let items = blocks("a.md", text);
        let found = only_blocks(&items);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].language, Language::Other("ruby".to_string()));
        assert_eq!(found[0].content, vec!["puts 1"]);
        assert_eq!((found[0].start_line, found[0].end_line), (1, 3));
    }

    #[test]
    fn unterminated_fence_does_not_hide_later_examples() {
        let text = "```docval run\n>>> 1\n1\n\nmore text\n>>> 2\n2\n";
        let items = blocks("a.md", text);
        assert_eq!(
            items[0],
            Extracted::Malformed { start_line: 1, end_line: 7, reason: "unterminated fence".to_string() }
        );
        let found = only_blocks(&items);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].start_line, 2);
        assert_eq!(found[1].start_line, 6);
    }

    #[test]
    fn longer_closing_fence_and_tildes() {
        let text = "````sh run\n$ echo hi\nhi\n`````\n";
        let found_items = blocks("a.md", text);
        let found = only_blocks(&found_items);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].language, Language::Shell);
        assert_eq!(found[0].content, vec!["$ echo hi", "hi"]);
    }

    #[test]
    fn fence_without_prompt_is_malformed() {
        let text = "```docval run\nlet x = 1\n```\n";
        assert_eq!(
            blocks("a.md", text),
            vec![Extracted::Malformed {
                start_line: 1,
                end_line: 3,
                reason: "executable fence contains no prompt".to_string()
            }]
        );
    }

    #[test]
    fn orphan_continuation() {
        let items = blocks("a.txt", "text\n... dangling\n");
        assert!(matches!(items[0], Extracted::Malformed { start_line: 2, end_line: 2, .. }));
    }

    #[test]
    fn continuation_lines_stay_in_group() {
        let text = ">>> fn f(n) {\n...     return n\n... }\n>>> f(3)\n3\n";
        let items = blocks("a.md", text);
        let found = only_blocks(&items);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].end_line, 3);
    }

    #[test]
    fn rust_doc_comments() {
        let text = "/// Adds numbers.\n///\n/// ```docval run\n/// >>> 1 + 2\n/// 3\n/// ```\nfn add() {}\n//! >>> 4\n//! 4\n";
        let items = blocks("lib.rs", text);
        let found = only_blocks(&items);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].content, vec![">>> 1 + 2", "3"]);
        assert_eq!(found[0].raw_text, "/// >>> 1 + 2\n/// 3");
        assert_eq!((found[1].start_line, found[1].end_line), (8, 9));
    }

    #[test]
    fn rust_code_outside_doc_comments_is_not_scanned() {
        let text = "// >>> 1\nlet s = \">>> 2\";\n";
        assert!(blocks("lib.rs", text).is_empty());
    }

    #[test]
    fn python_docstring_indentation_removed() {
        let text = "def f():\n    \"\"\"\n    >>> 1 + 1\n    2\n    \"\"\"\n";
        let items = blocks("mod.py", text);
        let found = only_blocks(&items);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].content, vec![">>> 1 + 1", "2"]);
        assert_eq!(found[0].raw_text, "    >>> 1 + 1\n    2");
        assert_eq!(found[0].language, Language::Other("python".to_string()));
    }

    #[test]
    fn fenced_script_in_python_docstring_stays_script() {
        let text = "\"\"\"\n```docval run\n>>> 1\n1\n```\n\"\"\"\n";
        let items = blocks("mod.py", text);
        let found = only_blocks(&items);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].language, Language::Script);
    }

    #[test]
    fn python_code_outside_docstrings_is_not_scanned() {
        let text = "PROMPT = '>>> '\n\"\"\"One-line docstring.\"\"\"\n'''\n>>> 3\n3\n'''\n";
        let items = blocks("mod.py", text);
        let found = only_blocks(&items);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].start_line, 4);
    }

    #[test]
    fn skip_directive_marks_every_group() {
        let text = "```docval run, skip\n>>> 1\n>>> 2\n```\n";
        let items = blocks("a.md", text);
        let found = only_blocks(&items);
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|b| b.skip));
    }

    #[test]
    fn raw_text_round_trips() {
        for newline in ["\n", "\r\n"] {
            let text = ["intro", "  >>> let a = [1,", "  ...   2]", "  >>> a", "  [1, 2]", ""].join(newline);
            let unit = SourceUnit::new("a.md", text.as_str());
            let spans = unit.line_spans();
            let found: Vec<ExampleBlock> = extract(&unit)
                .filter_map(|item| match item {
                    Extracted::Block(b) => Some(b),
                    Extracted::Malformed { .. } => None,
                })
                .collect();
            assert_eq!(found.len(), 2);
            for b in &found {
                let original = &text[spans[b.start_line - 1].start..spans[b.end_line - 1].end];
                assert_eq!(b.raw_text, original);
                assert!(b.content.iter().all(|line| !line.ends_with('\r')));
            }
            assert_eq!(found[0].raw_text, format!("  >>> let a = [1,{}  ...   2]", newline));
            assert_eq!(found[1].content, vec![">>> a", "[1, 2]"]);
        }
    }

    #[test]
    fn rescanning_yields_same_sequence() {
        let text = ">>> 1\n1\n```docval run\n>>> 2\n```\n... x\n";
        let unit = SourceUnit::new("a.md", text);
        let fresh = extract(&unit);
        let replay = fresh.clone();
        let first: Vec<_> = fresh.collect();
        assert_eq!(first, replay.collect::<Vec<_>>());
        assert_eq!(first, extract(&unit).collect::<Vec<_>>());
        assert_eq!(first.len(), 3);
    }
}
