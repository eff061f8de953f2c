use std::ops::Index;

/// The lines of one file at one commit, 0-indexed.
///
/// There is no sentinel line: index 0 is the first line of the file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceLines {
    lines: Vec<String>,
}

impl SourceLines {
    /// Split source text into lines (`\n` and `\r\n` both terminate a line)
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        Self {
            lines: text.lines().map(str::to_owned).collect(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&str> {
        self.lines.get(index).map(String::as_str)
    }

    /// Line at `index` with surrounding whitespace removed; empty when out of range
    #[must_use]
    pub fn trimmed(&self, index: usize) -> &str {
        self.get(index).map_or("", str::trim)
    }

    /// Whether the line is absent or whitespace only
    #[must_use]
    pub fn is_blank(&self, index: usize) -> bool {
        self.trimmed(index).is_empty()
    }

    /// Join the inclusive range `start..=end` with `\n`
    #[must_use]
    pub fn join_range(&self, start: usize, end: usize) -> String {
        if self.lines.is_empty() || start > end {
            return String::new();
        }
        let end = end.min(self.lines.len() - 1);
        self.lines[start.min(end)..=end].join("\n")
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }
}

impl Index<usize> for SourceLines {
    type Output = str;

    fn index(&self, index: usize) -> &str {
        &self.lines[index]
    }
}

impl From<Vec<String>> for SourceLines {
    fn from(lines: Vec<String>) -> Self {
        Self { lines }
    }
}

impl<'a> From<&[&'a str]> for SourceLines {
    fn from(lines: &[&'a str]) -> Self {
        lines.iter().copied().collect()
    }
}

impl<S: Into<String>> FromIterator<S> for SourceLines {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            lines: iter.into_iter().map(Into::into).collect(),
        }
    }
}
