//! # Lumpy Change Lumps
//!
//! Cuts readable excerpts ("lumps") out of changed files so a commit can be
//! explained to someone who does not read diffs.
//!
//! ## Architecture
//!
//! ```text
//! FileChange (path, snapshot, changed functions / added lines)
//!     │
//!     ├──> LanguageTable::lookup_path → CommentRule
//!     │
//!     ├──> ChangeLump per function, or per group of added lines
//!     │    ├─> extend_over_text     (grow over the enclosing paragraph)
//!     │    └─> extend_over_comments (pull in the comment block above)
//!     │
//!     └──> Excerpt[] for the report renderer
//! ```
//!
//! ## Example
//!
//! ```rust
//! use lumpy_change_lump::{default_table, ChangeLump, FunctionSpan, SourceLines};
//!
//! let rule = default_table().lookup_or_plain(".py");
//! let lines = SourceLines::from_text("# doc1\n# doc2\ndef f():\n    return 1\n");
//!
//! let mut lump = ChangeLump::function(&rule, &lines, FunctionSpan::new(3, 4));
//! lump.extend_over_comments();
//!
//! assert_eq!(lump.comment_start(), Some(0));
//! assert_eq!(lump.code(), "# doc1\n# doc2\ndef f():\n    return 1");
//! ```

mod config;
mod error;
mod extract;
mod language;
mod lines;
mod lump;
mod table;
mod types;

pub use config::{ExtractorConfig, CONFIG_FILE_NAME};
pub use error::{LumpError, Result};
pub use extract::{group_changed_lines, FileChange, FileFilter, LumpExtractor, IGNORE_FILE_NAME};
pub use language::{BlockDelimiters, CommentRule, CommentSyntax, LineClass};
pub use lines::SourceLines;
pub use lump::{ChangeDescriptor, ChangeLump, FunctionSpan, LumpSource};
pub use table::{default_table, LanguageTable};
pub use types::{ChangeType, Excerpt};
