use crate::config::ExtractorConfig;
use crate::error::{LumpError, Result};
use crate::language::CommentRule;
use crate::lines::SourceLines;
use crate::lump::{ChangeLump, FunctionSpan, LumpSource};
use crate::table::{default_table, LanguageTable};
use crate::types::{ChangeType, Excerpt};
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the per-repository ignore file
pub const IGNORE_FILE_NAME: &str = ".lumpyignore";

/// One file touched by a commit, as handed over by the diff source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    pub path: String,
    pub change_type: ChangeType,
    /// File contents after the commit
    #[serde(default)]
    pub source_code: Option<String>,
    /// Functions whose bodies changed
    #[serde(default)]
    pub changed_functions: Vec<FunctionSpan>,
    /// Added line numbers in the new file (1-indexed)
    #[serde(default)]
    pub added_lines: Vec<isize>,
}

impl FileChange {
    pub fn modified(path: impl Into<String>, source_code: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            change_type: ChangeType::Modify,
            source_code: Some(source_code.into()),
            changed_functions: Vec::new(),
            added_lines: Vec::new(),
        }
    }

    pub fn added(path: impl Into<String>, source_code: impl Into<String>) -> Self {
        Self {
            change_type: ChangeType::Add,
            ..Self::modified(path, source_code)
        }
    }

    /// Builder: add a changed function
    #[must_use]
    pub fn with_function(mut self, span: FunctionSpan) -> Self {
        self.changed_functions.push(span);
        self
    }

    /// Builder: set added line numbers
    #[must_use]
    pub fn with_added_lines(mut self, lines: impl IntoIterator<Item = isize>) -> Self {
        self.added_lines.extend(lines);
        self
    }
}

/// Group added line numbers into lumps.
///
/// Lines are visited in the given order. A line inside the most recent lump
/// is absorbed by it; any other line starts a new lump, which is grown over
/// its paragraph when `with_context` is set.
pub fn group_changed_lines<'a>(
    rule: &'a CommentRule,
    lines: &'a SourceLines,
    added: &[isize],
    with_context: bool,
) -> Vec<ChangeLump<'a>> {
    let mut lumps: Vec<ChangeLump<'a>> = Vec::new();

    for &line in added {
        let index = usize::try_from(line.saturating_sub(1))
            .unwrap_or(0)
            .min(lines.len().saturating_sub(1));
        if lumps.last().is_some_and(|lump| lump.in_lump(index)) {
            continue;
        }

        let mut lump = ChangeLump::line_changed(rule, lines, line);
        if with_context {
            lump.extend_over_text();
        }
        lumps.push(lump);
    }

    log::debug!(
        "grouped {} changed lines into {} lumps",
        added.len(),
        lumps.len()
    );
    lumps
}

/// Decides which changed files are worth excerpting
#[derive(Debug, Clone)]
pub struct FileFilter {
    root: PathBuf,
    ignore: Gitignore,
    skip_extensions: Vec<String>,
}

impl FileFilter {
    /// Build from the config's ignore globs and skipped extensions
    pub fn from_config(config: &ExtractorConfig) -> Result<Self> {
        Self::build(Path::new("."), config, None)
    }

    /// Like [`from_config`](Self::from_config), plus the gitignore-style
    /// patterns of an ignore file, matched relative to the file's directory.
    ///
    /// A missing ignore file leaves the config patterns alone; an unreadable
    /// or partly invalid one is logged and skipped.
    pub fn from_ignore_file(path: impl AsRef<Path>, config: &ExtractorConfig) -> Result<Self> {
        let path = path.as_ref();
        let root = path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let ignore_file = path.is_file().then_some(path);
        Self::build(root, config, ignore_file)
    }

    /// Filter for the repository at `dir`, honouring `dir/.lumpyignore`
    pub fn discover(dir: impl AsRef<Path>, config: &ExtractorConfig) -> Result<Self> {
        Self::from_ignore_file(dir.as_ref().join(IGNORE_FILE_NAME), config)
    }

    fn build(root: &Path, config: &ExtractorConfig, ignore_file: Option<&Path>) -> Result<Self> {
        let mut builder = GitignoreBuilder::new(root);
        for pattern in &config.ignore_patterns {
            builder
                .add_line(None, pattern)
                .map_err(|err| LumpError::invalid_pattern(pattern.as_str(), err.to_string()))?;
        }

        if let Some(file) = ignore_file {
            log::debug!("loading ignore rules from {}", file.display());
            if let Some(err) = builder.add(file) {
                log::warn!("{}: {err}", file.display());
            }
        }

        let ignore = builder
            .build()
            .map_err(|err| LumpError::invalid_pattern("ignore set", err.to_string()))?;

        Ok(Self {
            root: root.to_path_buf(),
            ignore,
            skip_extensions: config
                .skip_extensions
                .iter()
                .map(|ext| format!(".{}", ext.trim().trim_start_matches('.').to_lowercase()))
                .collect(),
        })
    }

    /// Whether `path` should be left out of reports.
    ///
    /// Paths are taken relative to the filter's root; a directory pattern
    /// covers every file below it and a later `!` pattern re-includes.
    #[must_use]
    pub fn is_ignored(&self, path: &str) -> bool {
        let normalized = path.replace('\\', "/");
        let file_name = normalized.rsplit('/').next().unwrap_or(&normalized);

        let candidate = Path::new(&normalized);
        let relative = match candidate.strip_prefix(&self.root) {
            Ok(rest) => rest,
            Err(_) if candidate.has_root() => Path::new(file_name),
            Err(_) => candidate,
        };
        if !relative.as_os_str().is_empty()
            && self
                .ignore
                .matched_path_or_any_parents(relative, false)
                .is_ignore()
        {
            return true;
        }

        let lower = file_name.to_lowercase();
        self.skip_extensions.iter().any(|ext| lower.ends_with(ext.as_str()))
    }
}

/// Turns file changes into excerpts
#[derive(Debug, Clone)]
pub struct LumpExtractor {
    config: ExtractorConfig,
    table: LanguageTable,
    filter: FileFilter,
}

impl LumpExtractor {
    /// Create an extractor; loads the configured language table if any
    pub fn new(config: ExtractorConfig) -> Result<Self> {
        let table = match &config.language_table {
            Some(path) => LanguageTable::from_path(path)?,
            None => default_table().clone(),
        };
        Self::with_table(config, table)
    }

    /// Create an extractor with an explicit language table
    pub fn with_table(config: ExtractorConfig, table: LanguageTable) -> Result<Self> {
        config.validate()?;
        let filter = FileFilter::from_config(&config)?;
        Ok(Self {
            config,
            table,
            filter,
        })
    }

    /// Create an extractor for the repository at `dir`; its `.lumpyignore`
    /// is added to the config's ignore patterns
    pub fn for_directory(config: ExtractorConfig, dir: impl AsRef<Path>) -> Result<Self> {
        let filter = FileFilter::discover(dir, &config)?;
        Ok(Self::new(config)?.with_filter(filter))
    }

    /// Builder: replace the file filter
    #[must_use]
    pub fn with_filter(mut self, filter: FileFilter) -> Self {
        self.filter = filter;
        self
    }

    #[must_use]
    pub const fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    #[must_use]
    pub const fn table(&self) -> &LanguageTable {
        &self.table
    }

    #[must_use]
    pub const fn filter(&self) -> &FileFilter {
        &self.filter
    }

    /// Whether the filter leaves `path` out
    #[must_use]
    pub fn is_ignored(&self, path: &str) -> bool {
        let ignored = self.filter.is_ignored(path);
        if ignored {
            log::debug!("ignoring {path}");
        }
        ignored
    }

    /// Excerpts for one changed file, in source order of the change report
    #[must_use]
    pub fn extract(&self, change: &FileChange) -> Vec<Excerpt> {
        if self.is_ignored(&change.path) {
            return Vec::new();
        }

        if !change.change_type.has_snapshot() {
            log::debug!("{}: nothing to excerpt for {}", change.path, change.change_type);
            return Vec::new();
        }

        let Some(source) = change.source_code.as_deref() else {
            return Vec::new();
        };

        if change.change_type == ChangeType::Add {
            return vec![self.whole_file(&change.path, source)];
        }
        self.extract_source(
            &change.path,
            source,
            &change.changed_functions,
            &change.added_lines,
        )
    }

    /// Excerpts for a file snapshot: one per changed function when any are
    /// known, otherwise one per group of added lines
    #[must_use]
    pub fn extract_source(
        &self,
        path: &str,
        source: &str,
        functions: &[FunctionSpan],
        added_lines: &[isize],
    ) -> Vec<Excerpt> {
        let rule = self.table.lookup_path(path);
        let lines = SourceLines::from_text(source);

        if !functions.is_empty() {
            return functions
                .iter()
                .map(|span| {
                    let mut lump = ChangeLump::function(&rule, &lines, span.clone());
                    lump.extend_over_comments();
                    lump.to_excerpt(path)
                })
                .collect();
        }

        let mut lumps = group_changed_lines(
            &rule,
            &lines,
            added_lines,
            self.config.context_on_line_changes,
        );
        if self.config.comments_on_line_changes {
            for lump in &mut lumps {
                lump.extend_over_comments();
            }
        }
        lumps.iter().map(|lump| lump.to_excerpt(path)).collect()
    }

    /// The whole snapshot as a single excerpt, used for newly added files
    #[must_use]
    pub fn whole_file(&self, path: &str, source: &str) -> Excerpt {
        let rule = self.table.lookup_path(path);
        let line_count = source.lines().count();
        Excerpt {
            path: path.to_string(),
            language: rule.markdown_name().to_string(),
            source: LumpSource::Unspecified,
            function_name: None,
            start_line: usize::from(line_count > 0),
            end_line: line_count,
            comment_start_line: None,
            code: source.to_string(),
        }
    }
}
