use crate::lump::LumpSource;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A finished excerpt, detached from the source it was cut from
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Excerpt {
    /// File path as reported by the diff source
    pub path: String,

    /// Markdown fence tag of the file's language (empty when unknown)
    pub language: String,

    /// How the lump was located
    pub source: LumpSource,

    /// Name of the changed function, for function lumps
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_name: Option<String>,

    /// First line of the change (1-indexed)
    pub start_line: usize,

    /// Last line of the change (1-indexed, inclusive)
    pub end_line: usize,

    /// First line of the leading comment block (1-indexed)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment_start_line: Option<usize>,

    /// The excerpt text
    pub code: String,
}

impl Excerpt {
    /// First line shown, including the comment block
    #[must_use]
    pub fn first_line(&self) -> usize {
        self.comment_start_line.unwrap_or(self.start_line)
    }
}

/// Kind of change a commit made to a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeType {
    Add,
    Copy,
    Rename,
    Delete,
    Modify,
    Unknown,
}

impl ChangeType {
    /// Past-tense verb for report headings
    #[must_use]
    pub const fn past_tense(self) -> &'static str {
        match self {
            Self::Add => "Added",
            Self::Copy => "Copied",
            Self::Rename => "Renamed",
            Self::Delete => "Removed",
            Self::Modify => "Modified",
            Self::Unknown => "Unknown",
        }
    }

    /// Whether the new snapshot of the file can be excerpted
    #[must_use]
    pub const fn has_snapshot(self) -> bool {
        matches!(self, Self::Add | Self::Modify)
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Add => "Add",
            Self::Copy => "Copy",
            Self::Rename => "Rename",
            Self::Delete => "Delete",
            Self::Modify => "Modify",
            Self::Unknown => "Unknown",
        };
        f.write_str(label)
    }
}
