use std::path::PathBuf;

use thiserror::Error;

/// A question record that violates its own invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed question record: {0}")]
pub struct FormatError(pub String);

/// Integrity violations raised by the in-memory question bank.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BankError {
    #[error("chapter {0} already exists")]
    DuplicateChapter(u32),
    #[error("chapter {0} is unknown")]
    UnknownChapter(u32),
    #[error("question `{id}` is already filed under chapter {chapter}")]
    DuplicateQuestion { id: String, chapter: u32 },
    #[error("question `{0}` not found")]
    QuestionNotFound(String),
    #[error("chapter {0} not found")]
    ChapterNotFound(u32),
}

#[derive(Debug, Error)]
pub enum ScrapeError {
    /// Transport failure or non-success status.
    #[error("failed to fetch {url}: {reason}")]
    Connection { url: String, reason: String },
    /// The markup did not follow the site's structural convention.
    #[error("unexpected page content: {0}")]
    ContentFormat(String),
    #[error("chapters have not been discovered yet")]
    NotConnected,
    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
    #[error(transparent)]
    Bank(#[from] BankError),
}

impl ScrapeError {
    pub fn connection(url: impl Into<String>, reason: impl ToString) -> Self {
        ScrapeError::Connection {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    pub fn content(message: impl Into<String>) -> Self {
        ScrapeError::ContentFormat(message.into())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read site configuration {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("site configuration is not valid: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid site configuration: {0}")]
    Invalid(String),
    #[error("failed to load environment configuration: {0}")]
    Env(#[from] envy::Error),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("database file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("question `{0}` is listed under a chapter but has no stored record")]
    MissingQuestion(String),
    #[error(transparent)]
    Bank(#[from] BankError),
    #[error(transparent)]
    Format(#[from] FormatError),
}
