use crate::error::{LumpError, Result};
use crate::language::{CommentRule, CommentSyntax};
use once_cell::sync::Lazy;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

const EMBEDDED_TABLE: &str = include_str!("../data/languages.toml");

static DEFAULT_TABLE: Lazy<LanguageTable> = Lazy::new(|| {
    LanguageTable::from_toml_str(EMBEDDED_TABLE).unwrap_or_else(|err| {
        log::error!("embedded language table is unusable: {err}");
        LanguageTable::default()
    })
});

static PLAIN_RULE: Lazy<Arc<CommentRule>> = Lazy::new(|| Arc::new(CommentRule::plain()));

/// The built-in language table
#[must_use]
pub fn default_table() -> &'static LanguageTable {
    &DEFAULT_TABLE
}

#[derive(Debug, Deserialize)]
struct TableDocument {
    #[serde(default)]
    families: HashMap<String, CommentSyntax>,
    #[serde(default)]
    languages: Vec<LanguageEntry>,
}

#[derive(Debug, Deserialize)]
struct LanguageEntry {
    name: String,
    #[serde(default)]
    markdown_name: Option<String>,
    #[serde(default)]
    comment_family: Option<String>,
    primary_extension: String,
    #[serde(default)]
    extensions: Vec<String>,
}

#[derive(Debug, Clone)]
struct TableRow {
    primary_extension: String,
    extensions: Vec<String>,
    rule: Arc<CommentRule>,
}

/// Extension-keyed table of comment rules.
///
/// Row order is the order of the source document and decides ties: the
/// first language claiming an extension wins.
#[derive(Debug, Clone, Default)]
pub struct LanguageTable {
    rows: Vec<TableRow>,
}

impl LanguageTable {
    /// Parse a table from its TOML form
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let document: TableDocument = toml::from_str(source)?;
        let mut rows = Vec::with_capacity(document.languages.len());

        for entry in document.languages {
            let syntax = match entry.comment_family.as_deref() {
                Some(family) => match document.families.get(family) {
                    Some(syntax) => syntax.clone(),
                    None => {
                        log::warn!(
                            "{}: unknown comment family {family:?}, comments disabled",
                            entry.name
                        );
                        CommentSyntax::default()
                    }
                },
                None => CommentSyntax::default(),
            };

            let markdown_name = entry
                .markdown_name
                .unwrap_or_else(|| entry.name.to_lowercase());
            let rule = CommentRule::new(
                entry.name,
                markdown_name,
                entry.comment_family,
                &syntax,
            );

            rows.push(TableRow {
                primary_extension: normalize_extension(&entry.primary_extension),
                extensions: entry
                    .extensions
                    .iter()
                    .map(|ext| normalize_extension(ext))
                    .collect(),
                rule: Arc::new(rule),
            });
        }

        Ok(Self { rows })
    }

    /// Load a table from a TOML file on disk
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
            .map_err(|err| LumpError::table(format!("{}: {err}", path.display())))
    }

    /// Find the rule for an extension (`".py"`, `"py"` and `".PY"` are equivalent).
    ///
    /// Primary extensions are checked before secondary ones.
    #[must_use]
    pub fn lookup(&self, extension: &str) -> Option<Arc<CommentRule>> {
        let ext = normalize_extension(extension);
        if ext == "." {
            return None;
        }

        self.rows
            .iter()
            .find(|row| row.primary_extension == ext)
            .or_else(|| {
                self.rows
                    .iter()
                    .find(|row| row.extensions.iter().any(|candidate| *candidate == ext))
            })
            .map(|row| Arc::clone(&row.rule))
    }

    /// Like [`lookup`](Self::lookup), but unknown extensions get a rule that
    /// never matches
    #[must_use]
    pub fn lookup_or_plain(&self, extension: &str) -> Arc<CommentRule> {
        self.lookup(extension).unwrap_or_else(|| {
            log::debug!("no language for extension {extension:?}, comments disabled");
            Arc::clone(&PLAIN_RULE)
        })
    }

    /// Resolve a rule from a file path's extension
    #[must_use]
    pub fn lookup_path(&self, path: impl AsRef<Path>) -> Arc<CommentRule> {
        let ext = path
            .as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("");
        self.lookup_or_plain(ext)
    }

    /// Names of all languages, in table order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|row| row.rule.name())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn normalize_extension(raw: &str) -> String {
    let trimmed = raw.trim().trim_start_matches('.');
    format!(".{}", trimmed.to_lowercase())
}
