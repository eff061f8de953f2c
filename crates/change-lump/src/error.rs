use thiserror::Error;

/// Result type for lump extraction operations
pub type Result<T> = std::result::Result<T, LumpError>;

/// Errors that can occur while loading tables, configs or sources
#[derive(Error, Debug)]
pub enum LumpError {
    /// Language table could not be parsed
    #[error("Language table error: {0}")]
    Table(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A comment or glob pattern failed to compile
    #[error("Invalid pattern for {owner}: {message}")]
    InvalidPattern { owner: String, message: String },

    /// IO error occurred
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl LumpError {
    /// Create a language table error
    pub fn table(msg: impl Into<String>) -> Self {
        Self::Table(msg.into())
    }

    /// Create an invalid config error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create an invalid pattern error
    pub fn invalid_pattern(owner: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidPattern {
            owner: owner.into(),
            message: message.into(),
        }
    }
}

impl From<toml::de::Error> for LumpError {
    fn from(err: toml::de::Error) -> Self {
        Self::Table(err.to_string())
    }
}
