use crate::error::{LumpError, Result};
use ignore::gitignore::GitignoreBuilder;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name looked up next to a repository for extractor settings
pub const CONFIG_FILE_NAME: &str = ".lumpyconfig.toml";

/// Configuration for turning file changes into excerpts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Grow line-changed lumps over their surrounding paragraph
    pub context_on_line_changes: bool,

    /// Prepend leading comments to line-changed lumps too (function lumps
    /// always get them)
    pub comments_on_line_changes: bool,

    /// Gitignore-style globs of files to skip
    pub ignore_patterns: Vec<String>,

    /// Extensions never excerpted (binary formats)
    pub skip_extensions: Vec<String>,

    /// Language table to use instead of the built-in one
    pub language_table: Option<PathBuf>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            context_on_line_changes: true,
            comments_on_line_changes: true,
            ignore_patterns: vec!["*.md".to_string()],
            skip_extensions: [".png", ".jpg", ".jpeg", ".gif"]
                .into_iter()
                .map(String::from)
                .collect(),
            language_table: None,
        }
    }
}

impl ExtractorConfig {
    /// Only function lumps get extended; changed lines are shown as-is
    pub fn functions_only() -> Self {
        Self {
            context_on_line_changes: false,
            comments_on_line_changes: false,
            ..Default::default()
        }
    }

    /// Changed lines get context but no comment prefix
    pub fn raw_lines() -> Self {
        Self {
            comments_on_line_changes: false,
            ..Default::default()
        }
    }

    /// Parse a config from TOML; missing keys keep their defaults
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(source).map_err(|err| LumpError::invalid_config(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let source = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&source)
    }

    /// Load `.lumpyconfig.toml` from `dir` if present, defaults otherwise
    pub fn discover(dir: impl AsRef<Path>) -> Result<Self> {
        let candidate = dir.as_ref().join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            log::debug!("loading extractor config from {}", candidate.display());
            Self::from_path(candidate)
        } else {
            Ok(Self::default())
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let mut builder = GitignoreBuilder::new(".");
        for pattern in &self.ignore_patterns {
            if pattern.trim().is_empty() {
                return Err(LumpError::invalid_config("ignore pattern cannot be empty"));
            }
            builder
                .add_line(None, pattern)
                .map_err(|err| LumpError::invalid_pattern(pattern.as_str(), err.to_string()))?;
        }

        if self.skip_extensions.iter().any(|ext| ext.trim().is_empty()) {
            return Err(LumpError::invalid_config(
                "skip_extensions cannot contain empty entries",
            ));
        }

        Ok(())
    }
}
