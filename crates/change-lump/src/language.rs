use regex::Regex;
use serde::{Deserialize, Serialize};

/// Raw comment syntax of one family, as written in the language table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentSyntax {
    /// Single-line comment marker pattern
    #[serde(default)]
    pub single: Option<String>,

    /// Block comment opener pattern
    #[serde(default)]
    pub begin: Option<String>,

    /// Block comment closer pattern
    #[serde(default)]
    pub end: Option<String>,
}

/// Compiled begin/end pattern pair of a block comment
#[derive(Debug, Clone)]
pub struct BlockDelimiters {
    begin: Regex,
    end: Regex,
    symmetric: bool,
}

impl BlockDelimiters {
    /// True when begin and end are the same marker (e.g. triple quotes)
    #[must_use]
    pub const fn is_symmetric(&self) -> bool {
        self.symmetric
    }

    /// Whether the opener occurs anywhere in `line`
    #[must_use]
    pub fn begins(&self, line: &str) -> bool {
        self.begin.is_match(line)
    }

    /// Whether the closer occurs anywhere in `line`
    #[must_use]
    pub fn ends(&self, line: &str) -> bool {
        self.end.is_match(line)
    }

    /// Number of non-overlapping marker occurrences in `line`
    #[must_use]
    pub fn marker_count(&self, line: &str) -> usize {
        self.begin.find_iter(line).count()
    }
}

/// How a single line relates to comment syntax
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineClass {
    /// The line opens a comment
    pub begins: bool,
    /// The line closes a comment
    pub ends: bool,
}

impl LineClass {
    pub const NONE: Self = Self {
        begins: false,
        ends: false,
    };

    pub const SELF_CONTAINED: Self = Self {
        begins: true,
        ends: true,
    };

    #[must_use]
    pub const fn new(begins: bool, ends: bool) -> Self {
        Self { begins, ends }
    }

    /// Both opens and closes on this line
    #[must_use]
    pub const fn is_self_contained(self) -> bool {
        self.begins && self.ends
    }

    /// Opens a block that stays open past this line
    #[must_use]
    pub const fn only_begins(self) -> bool {
        self.begins && !self.ends
    }

    /// Closes a block opened on an earlier line
    #[must_use]
    pub const fn only_ends(self) -> bool {
        self.ends && !self.begins
    }
}

/// Comment syntax of one language, ready for matching.
///
/// Rules are immutable once built and are shared between every lump cut
/// from files of that language.
#[derive(Debug, Clone)]
pub struct CommentRule {
    name: String,
    markdown_name: String,
    comment_family: Option<String>,
    single: Option<Regex>,
    block: Option<BlockDelimiters>,
}

impl CommentRule {
    /// Build a rule, compiling every pattern in `syntax`.
    ///
    /// Patterns that fail to compile are logged and dropped; a block pair
    /// with only one usable side is dropped entirely.
    pub fn new(
        name: impl Into<String>,
        markdown_name: impl Into<String>,
        comment_family: Option<String>,
        syntax: &CommentSyntax,
    ) -> Self {
        let name = name.into();

        let single = syntax
            .single
            .as_deref()
            .and_then(|pattern| compile_lenient(&name, "single", pattern));

        let block = match (syntax.begin.as_deref(), syntax.end.as_deref()) {
            (Some(begin), Some(end)) => {
                match (
                    compile_lenient(&name, "begin", begin),
                    compile_lenient(&name, "end", end),
                ) {
                    (Some(begin_re), Some(end_re)) => Some(BlockDelimiters {
                        begin: begin_re,
                        end: end_re,
                        symmetric: begin == end,
                    }),
                    _ => None,
                }
            }
            (None, None) => None,
            _ => {
                log::warn!("{name}: block comment needs both begin and end, ignoring block syntax");
                None
            }
        };

        Self {
            name,
            markdown_name: markdown_name.into(),
            comment_family,
            single,
            block,
        }
    }

    /// A rule that never matches anything, used for unknown file types
    #[must_use]
    pub fn plain() -> Self {
        Self {
            name: "Text".to_string(),
            markdown_name: String::new(),
            comment_family: None,
            single: None,
            block: None,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fence tag for markdown code blocks
    #[must_use]
    pub fn markdown_name(&self) -> &str {
        &self.markdown_name
    }

    #[must_use]
    pub fn comment_family(&self) -> Option<&str> {
        self.comment_family.as_deref()
    }

    #[must_use]
    pub const fn block(&self) -> Option<&BlockDelimiters> {
        self.block.as_ref()
    }

    #[must_use]
    pub const fn has_single(&self) -> bool {
        self.single.is_some()
    }

    /// Whether any comment syntax is configured at all
    #[must_use]
    pub const fn is_plain(&self) -> bool {
        self.single.is_none() && self.block.is_none()
    }

    /// Whether the single-line marker occurs in `line`
    #[must_use]
    pub fn single_matches(&self, line: &str) -> bool {
        self.single.as_ref().is_some_and(|re| re.is_match(line))
    }

    /// Stateless classification of a trimmed line.
    ///
    /// Symmetric block markers cannot be resolved without knowing what came
    /// before the line; [`crate::ChangeLump`] handles those with its own
    /// toggle state and only falls back here for the rest.
    #[must_use]
    pub fn classify(&self, line: &str) -> LineClass {
        if line.is_empty() {
            return LineClass::NONE;
        }

        if let Some(block) = &self.block {
            let class = LineClass::new(block.begins(line), block.ends(line));
            if class.begins || class.ends {
                return class;
            }
        }

        if self.single_matches(line) {
            return LineClass::SELF_CONTAINED;
        }

        LineClass::NONE
    }
}

fn compile_lenient(owner: &str, role: &str, pattern: &str) -> Option<Regex> {
    if pattern.is_empty() {
        return None;
    }
    match Regex::new(pattern) {
        Ok(re) => Some(re),
        Err(err) => {
            log::warn!("{owner}: dropping {role} comment pattern {pattern:?}: {err}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c_rule() -> CommentRule {
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

    #[test]
    fn test_block_takes_priority_over_single() {
        let rule = c_rule();
        assert_eq!(rule.classify("/* open"), LineClass::new(true, false));
        assert_eq!(rule.classify("close */"), LineClass::new(false, true));
        assert_eq!(rule.classify("/* both */"), LineClass::SELF_CONTAINED);
        assert_eq!(rule.classify("// single"), LineClass::SELF_CONTAINED);
        assert_eq!(rule.classify("int x = 1;"), LineClass::NONE);
        assert_eq!(rule.classify(""), LineClass::NONE);
    }

    #[test]
    fn test_plain_rule_never_matches() {
        let rule = CommentRule::plain();
        assert!(rule.is_plain());
        for line in ["# hash", "// slashes", "/* block */", "\"\"\""] {
            assert_eq!(rule.classify(line), LineClass::NONE, "{line}");
        }
    }

    #[test]
    fn test_invalid_pattern_is_dropped() {
        let rule = CommentRule::new(
            "Broken",
            "broken",
            None,
            &CommentSyntax {
                single: Some("([".to_string()),
                begin: Some(r"/\*".to_string()),
                end: Some("(".to_string()),
            },
        );
        assert!(!rule.has_single());
        assert!(rule.block().is_none());
        assert!(rule.is_plain());
    }

    #[test]
    fn test_half_block_pair_is_dropped() {
        let rule = CommentRule::new(
            "Half",
            "half",
            None,
            &CommentSyntax {
                single: Some("^#".to_string()),
                begin: Some("<!--".to_string()),
                end: None,
            },
        );
        assert!(rule.block().is_none());
        assert!(rule.has_single());
    }

    #[test]
    fn test_symmetric_detection() {
        let rule = CommentRule::new(
            "Python",
            "python",
            None,
            &CommentSyntax {
                single: Some("^#".to_string()),
                begin: Some("\"\"\"|'''".to_string()),
                end: Some("\"\"\"|'''".to_string()),
            },
        );
        let block = rule.block().expect("block syntax");
        assert!(block.is_symmetric());
        assert_eq!(block.marker_count("\"\"\"doc\"\"\""), 2);
        assert!(!c_rule().block().expect("block syntax").is_symmetric());
    }
}
