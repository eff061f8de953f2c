use crate::language::{BlockDelimiters, CommentRule, LineClass};
use crate::lines::SourceLines;
use crate::types::Excerpt;
use once_cell::unsync::OnceCell;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A changed function as reported by the diff source (1-indexed, end-inclusive)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionSpan {
    pub start_line: isize,
    pub end_line: isize,
    #[serde(default)]
    pub name: Option<String>,
}

impl FunctionSpan {
    #[must_use]
    pub const fn new(start_line: isize, end_line: isize) -> Self {
        Self {
            start_line,
            end_line,
            name: None,
        }
    }

    /// Builder: set the function name
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// What a lump was cut around
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeDescriptor {
    /// A changed function's declared boundaries
    Function(FunctionSpan),
    /// One or more changed lines (1-indexed); `end` defaults to `start`
    Lines { start: isize, end: Option<isize> },
    /// Nothing known; the lump covers the first line
    Unspecified,
}

impl ChangeDescriptor {
    #[must_use]
    pub const fn line(line: isize) -> Self {
        Self::Lines {
            start: line,
            end: None,
        }
    }

    #[must_use]
    pub const fn line_range(start: isize, end: isize) -> Self {
        Self::Lines {
            start,
            end: Some(end),
        }
    }
}

/// Where a lump's boundaries came from, for reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LumpSource {
    Function,
    LineChanged,
    Unspecified,
}

impl LumpSource {
    /// Human-readable label
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Function => "Function",
            Self::LineChanged => "Line Changed",
            Self::Unspecified => "Source Code",
        }
    }
}

impl fmt::Display for LumpSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A contiguous excerpt of one file chosen to show one change.
///
/// Bounds are 0-indexed and inclusive. `start`/`end` cover the change
/// itself (possibly grown by [`extend_over_text`](Self::extend_over_text));
/// `comment_start`, when set, is the first line of the comment block that
/// documents it.
#[derive(Debug, Clone)]
pub struct ChangeLump<'a> {
    lines: &'a SourceLines,
    rule: &'a CommentRule,
    start: usize,
    end: usize,
    comment_start: Option<usize>,
    source: LumpSource,
    function_name: Option<String>,
    // Symmetric-delimiter state before each line, built on first use
    open_before: OnceCell<Vec<bool>>,
}

impl<'a> ChangeLump<'a> {
    /// Cut a lump from `lines`, converting the descriptor's 1-indexed bounds
    /// and clamping them into the file.
    #[must_use]
    pub fn new(
        rule: &'a CommentRule,
        lines: &'a SourceLines,
        descriptor: ChangeDescriptor,
    ) -> Self {
        let (source, first, last, function_name) = match descriptor {
            ChangeDescriptor::Function(span) => {
                (LumpSource::Function, span.start_line, span.end_line, span.name)
            }
            ChangeDescriptor::Lines { start, end } => {
                (LumpSource::LineChanged, start, end.unwrap_or(start), None)
            }
            ChangeDescriptor::Unspecified => (LumpSource::Unspecified, 1, 1, None),
        };

        let (start, end) = if lines.is_empty() {
            (0, 0)
        } else {
            let last_index = lines.len() - 1;
            let start = to_index(first).min(last_index);
            let end = to_index(last).min(last_index).max(start);
            (start, end)
        };

        log::debug!(
            "lump {source}: start={start} end={end} lines={}",
            lines.len()
        );

        Self {
            lines,
            rule,
            start,
            end,
            comment_start: None,
            source,
            function_name,
            open_before: OnceCell::new(),
        }
    }

    /// Lump for a changed function
    #[must_use]
    pub fn function(rule: &'a CommentRule, lines: &'a SourceLines, span: FunctionSpan) -> Self {
        Self::new(rule, lines, ChangeDescriptor::Function(span))
    }

    /// Lump for a single changed line (1-indexed)
    #[must_use]
    pub fn line_changed(rule: &'a CommentRule, lines: &'a SourceLines, line: isize) -> Self {
        Self::new(rule, lines, ChangeDescriptor::line(line))
    }

    #[must_use]
    pub const fn start(&self) -> usize {
        self.start
    }

    #[must_use]
    pub const fn end(&self) -> usize {
        self.end
    }

    #[must_use]
    pub const fn comment_start(&self) -> Option<usize> {
        self.comment_start
    }

    /// First line that [`code`](Self::code) will emit
    #[must_use]
    pub fn effective_start(&self) -> usize {
        self.comment_start.unwrap_or(self.start)
    }

    #[must_use]
    pub const fn source(&self) -> LumpSource {
        self.source
    }

    #[must_use]
    pub fn function_name(&self) -> Option<&str> {
        self.function_name.as_deref()
    }

    #[must_use]
    pub const fn rule(&self) -> &CommentRule {
        self.rule
    }

    /// Number of lines [`code`](Self::code) will emit
    #[must_use]
    pub fn line_count(&self) -> usize {
        if self.lines.is_empty() {
            0
        } else {
            self.end - self.effective_start() + 1
        }
    }

    /// Whether 0-indexed line `index` lies inside `start..=end`
    #[must_use]
    pub const fn in_lump(&self, index: usize) -> bool {
        self.start <= index && index <= self.end
    }

    /// Grow the lump over the surrounding paragraph: every non-blank line
    /// directly above `start` and below `end`. A blank line stops each side.
    pub fn extend_over_text(&mut self) {
        if self.lines.is_empty() {
            return;
        }

        while self.start > 0 && !self.lines.is_blank(self.start - 1) {
            self.start -= 1;
        }

        let last_index = self.lines.len() - 1;
        while self.end < last_index && !self.lines.is_blank(self.end + 1) {
            self.end += 1;
        }

        log::debug!("extend_over_text: start={} end={}", self.start, self.end);
    }

    /// Prepend the comment blocks sitting directly above the lump.
    ///
    /// Walks upward one block at a time until the line above the current top
    /// is not the end of a comment block. Recomputed from `start` on every
    /// call, so calling it again gives the same answer.
    pub fn extend_over_comments(&mut self) -> Option<usize> {
        self.comment_start = None;
        if self.lines.is_empty() {
            return None;
        }

        let mut top = self.start;
        while top > 0 {
            match self.comment_start_at(top - 1) {
                Some(block_start) => {
                    self.comment_start = Some(block_start);
                    top = block_start;
                }
                None => break,
            }
        }

        log::debug!(
            "extend_over_comments: start={} comment_start={:?}",
            self.start,
            self.comment_start
        );
        self.comment_start
    }

    /// Find the first line of the comment block that contains line `index`.
    ///
    /// A self-contained comment line is its own block. Any other line is
    /// inside a block only if the nearest marker above it is an unterminated
    /// opener; a closer or a self-contained comment in between means it is
    /// not.
    #[must_use]
    pub fn comment_start_at(&self, index: usize) -> Option<usize> {
        if index >= self.lines.len() {
            return None;
        }

        if self.classify_line(index).is_self_contained() {
            return Some(index);
        }

        for above in (0..index).rev() {
            let class = self.classify_line(above);
            if class.is_self_contained() || class.only_ends() {
                return None;
            }
            if class.only_begins() {
                return Some(above);
            }
        }

        None
    }

    /// Whether line `index` opens and/or closes a comment
    #[must_use]
    pub fn classify_line(&self, index: usize) -> LineClass {
        let line = self.lines.trimmed(index);
        if line.is_empty() {
            return LineClass::NONE;
        }

        match self.rule.block() {
            Some(block) if block.is_symmetric() => {
                let markers = block.marker_count(line);
                if markers == 0 {
                    return if self.rule.single_matches(line) {
                        LineClass::SELF_CONTAINED
                    } else {
                        LineClass::NONE
                    };
                }
                let open = self.open_before(block)[index];
                let odd = markers % 2 == 1;
                match (open, odd) {
                    (false, false) => LineClass::SELF_CONTAINED,
                    (false, true) => LineClass::new(true, false),
                    (true, true) => LineClass::new(false, true),
                    // closes the open block and opens another
                    (true, false) => LineClass::NONE,
                }
            }
            _ => self.rule.classify(line),
        }
    }

    /// The excerpt: comment block (if any) through `end`, joined by `\n`
    #[must_use]
    pub fn code(&self) -> String {
        if self.lines.is_empty() {
            return String::new();
        }
        self.lines.join_range(self.effective_start(), self.end)
    }

    /// Snapshot for renderers, with 1-indexed line numbers
    #[must_use]
    pub fn to_excerpt(&self, path: impl Into<String>) -> Excerpt {
        let (start_line, end_line) = if self.lines.is_empty() {
            (0, 0)
        } else {
            (self.start + 1, self.end + 1)
        };
        Excerpt {
            path: path.into(),
            language: self.rule.markdown_name().to_string(),
            source: self.source,
            function_name: self.function_name.clone(),
            start_line,
            end_line,
            comment_start_line: self.comment_start.map(|line| line + 1),
            code: self.code(),
        }
    }

    fn open_before(&self, block: &BlockDelimiters) -> &[bool] {
        self.open_before.get_or_init(|| {
            let mut open = false;
            self.lines
                .iter()
                .map(|line| {
                    let before = open;
                    if block.marker_count(line.trim()) % 2 == 1 {
                        open = !open;
                    }
                    before
                })
                .collect()
        })
    }
}

fn to_index(line: isize) -> usize {
    usize::try_from(line.saturating_sub(1)).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::CommentSyntax;
    use pretty_assertions::assert_eq;

    fn python() -> CommentRule {
        CommentRule::new(
            "Python",
            "python",
            Some("Python".to_string()),
            &CommentSyntax {
                single: Some("^#".to_string()),
                begin: Some("\"\"\"|'''".to_string()),
                end: Some("\"\"\"|'''".to_string()),
            },
        )
    }

    fn c_like() -> CommentRule {
        CommentRule::new(
            "C",
            "c",
            Some("C".to_string()),
            &CommentSyntax {
                single: Some("^//".to_string()),
                begin: Some(r"/\*".to_string()),
                end: Some(r"\*/".to_string()),
            },
        )
    }

    fn sample() -> SourceLines {
        [
            "def calculate_sum(a, b):",
            "    \"\"\"Add two numbers together.\"\"\"",
            "    result = a + b",
            "    return result",
            "",
            "def multiply(x, y):",
            "    \"\"\"Multiply two numbers.\"\"\"",
            "    return x * y",
            "",
            "print('done')",
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_function_bounds() {
        let rule = python();
        let lines = sample();
        let span = FunctionSpan::new(1, 4).named("calculate_sum");
        let lump = ChangeLump::function(&rule, &lines, span);

        assert_eq!(lump.start(), 0);
        assert_eq!(lump.end(), 3);
        assert_eq!(lump.source(), LumpSource::Function);
        assert_eq!(lump.function_name(), Some("calculate_sum"));
        assert!(lump.code().contains("result = a + b"));
    }

    #[test]
    fn test_line_change_bounds() {
        let rule = python();
        let lines = sample();

        let single = ChangeLump::line_changed(&rule, &lines, 3);
        assert_eq!((single.start(), single.end()), (2, 2));
        assert_eq!(single.source(), LumpSource::LineChanged);

        let range = ChangeLump::new(&rule, &lines, ChangeDescriptor::line_range(2, 4));
        assert_eq!((range.start(), range.end()), (1, 3));
    }

    #[test]
    fn test_unspecified_spans_first_line() {
        let rule = python();
        let lines = sample();
        let lump = ChangeLump::new(&rule, &lines, ChangeDescriptor::Unspecified);
        assert_eq!((lump.start(), lump.end()), (0, 0));
        assert_eq!(lump.source().to_string(), "Source Code");
    }

    #[test]
    fn test_clamping() {
        let rule = python();
        let lines = sample();

        let negative = ChangeLump::line_changed(&rule, &lines, -5);
        assert_eq!(negative.start(), 0);

        let past_end = ChangeLump::new(&rule, &lines, ChangeDescriptor::line_range(40, 50));
        assert_eq!((past_end.start(), past_end.end()), (9, 9));

        let inverted = ChangeLump::new(&rule, &lines, ChangeDescriptor::line_range(6, 2));
        assert_eq!((inverted.start(), inverted.end()), (5, 5));
    }

    #[test]
    fn test_empty_lines() {
        let rule = python();
        let lines = SourceLines::default();
        let mut lump = ChangeLump::line_changed(&rule, &lines, 1);

        assert_eq!((lump.start(), lump.end()), (0, 0));
        lump.extend_over_text();
        assert_eq!(lump.extend_over_comments(), None);
        assert_eq!(lump.code(), "");
        assert_eq!(lump.line_count(), 0);
        assert_eq!(lump.comment_start_at(0), None);
    }

    #[test]
    fn test_extend_over_text_stops_at_blank_lines() {
        let rule = python();
        let lines = sample();
        let mut lump = ChangeLump::line_changed(&rule, &lines, 3);
        lump.extend_over_text();

        assert_eq!((lump.start(), lump.end()), (0, 3));

        let mut tail = ChangeLump::line_changed(&rule, &lines, 10);
        tail.extend_over_text();
        assert_eq!((tail.start(), tail.end()), (9, 9));
    }

    #[test]
    fn test_single_line_comments_are_prepended() {
        let rule = python();
        let lines: SourceLines = ["# doc1", "# doc2", "def f():", "    return 1"]
            .into_iter()
            .collect();
        let mut lump = ChangeLump::function(&rule, &lines, FunctionSpan::new(3, 4));

        assert_eq!(lump.extend_over_comments(), Some(0));
        assert_eq!(lump.code(), "# doc1\n# doc2\ndef f():\n    return 1");
        assert_eq!(lump.line_count(), 4);
    }

    #[test]
    fn test_blank_line_separates_comment_from_code() {
        let rule = python();
        let lines: SourceLines = ["# unrelated", "", "def f():", "    pass"]
            .into_iter()
            .collect();
        let mut lump = ChangeLump::function(&rule, &lines, FunctionSpan::new(3, 4));
        assert_eq!(lump.extend_over_comments(), None);
        assert_eq!(lump.code(), "def f():\n    pass");
    }

    #[test]
    fn test_symmetric_block_probe() {
        let rule = python();
        let lines: SourceLines = [
            "import os",
            "",
            "x = 1",
            "",
            "\"\"\"",
            "Explains g.",
            "\"\"\"",
            "def g():",
            "    return x",
        ]
        .into_iter()
        .collect();
        let lump = ChangeLump::function(&rule, &lines, FunctionSpan::new(8, 9));

        assert_eq!(lump.classify_line(4), LineClass::new(true, false));
        assert_eq!(lump.classify_line(5), LineClass::NONE);
        assert_eq!(lump.classify_line(6), LineClass::new(false, true));
        assert_eq!(lump.comment_start_at(7), None);
        assert_eq!(lump.comment_start_at(5), Some(4));
        assert_eq!(lump.comment_start_at(6), Some(4));
    }

    #[test]
    fn test_symmetric_block_is_prepended() {
        let rule = python();
        let lines: SourceLines = ["\"\"\"", "Explains g.", "\"\"\"", "def g():", "    pass"]
            .into_iter()
            .collect();
        let mut lump = ChangeLump::function(&rule, &lines, FunctionSpan::new(4, 5));
        assert_eq!(lump.extend_over_comments(), Some(0));
    }

    #[test]
    fn test_one_line_docstring_is_self_contained() {
        let rule = python();
        let lines = sample();
        let lump = ChangeLump::function(&rule, &lines, FunctionSpan::new(6, 8));
        assert_eq!(lump.classify_line(6), LineClass::SELF_CONTAINED);
    }

    #[test]
    fn test_asymmetric_block_interior_resolves_to_opener() {
        let rule = c_like();
        let lines: SourceLines = [
            "int a;",
            "/*",
            " * first",
            " * second",
            " */",
            "int main(void) {",
            "  return 0;",
            "}",
        ]
        .into_iter()
        .collect();
        let mut lump = ChangeLump::function(&rule, &lines, FunctionSpan::new(6, 8));

        for interior in 2..=4 {
            assert_eq!(lump.comment_start_at(interior), Some(1), "line {interior}");
        }
        assert_eq!(lump.comment_start_at(0), None);
        assert_eq!(lump.comment_start_at(5), None);

        assert_eq!(lump.extend_over_comments(), Some(1));
        assert_eq!(lump.effective_start(), 1);
        assert!(lump.code().starts_with("/*\n * first"));
    }

    #[test]
    fn test_stacked_comment_blocks() {
        let rule = c_like();
        let lines: SourceLines = [
            "// license",
            "/* about",
            "   the function */",
            "// and more",
            "void f() {}",
        ]
        .into_iter()
        .collect();
        let mut lump = ChangeLump::function(&rule, &lines, FunctionSpan::new(5, 5));
        assert_eq!(lump.extend_over_comments(), Some(0));
    }

    #[test]
    fn test_extend_over_comments_is_idempotent() {
        let rule = c_like();
        let lines: SourceLines = ["// a", "// b", "void f() {}"].into_iter().collect();
        let mut lump = ChangeLump::function(&rule, &lines, FunctionSpan::new(3, 3));
        let first = lump.extend_over_comments();
        let second = lump.extend_over_comments();
        assert_eq!(first, Some(0));
        assert_eq!(first, second);
    }

    #[test]
    fn test_plain_rule_never_extends_over_comments() {
        let rule = CommentRule::plain();
        let lines: SourceLines = ["# a", "// b", "/* c */", "body"].into_iter().collect();
        let mut lump = ChangeLump::line_changed(&rule, &lines, 4);

        for index in 0..lines.len() {
            assert_eq!(lump.classify_line(index), LineClass::NONE);
        }
        assert_eq!(lump.extend_over_comments(), None);
        assert_eq!(lump.code(), "body");
    }

    #[test]
    fn test_in_lump() {
        let rule = python();
        let lines = sample();
        let lump = ChangeLump::new(&rule, &lines, ChangeDescriptor::line_range(2, 4));

        assert!(!lump.in_lump(0));
        assert!(lump.in_lump(1));
        assert!(lump.in_lump(3));
        assert!(!lump.in_lump(4));
    }

    #[test]
    fn test_to_excerpt_uses_one_indexed_lines() {
        let rule = c_like();
        let lines: SourceLines = ["// doc", "void f() {}"].into_iter().collect();
        let span = FunctionSpan::new(2, 2).named("f");
        let mut lump = ChangeLump::function(&rule, &lines, span);
        lump.extend_over_comments();

        let excerpt = lump.to_excerpt("src/f.c");
        assert_eq!(excerpt.start_line, 2);
        assert_eq!(excerpt.end_line, 2);
        assert_eq!(excerpt.comment_start_line, Some(1));
        assert_eq!(excerpt.language, "c");
        assert_eq!(excerpt.function_name.as_deref(), Some("f"));
        assert_eq!(excerpt.code, "// doc\nvoid f() {}");
    }
}
