//! Error types for script parsing

use std::path::PathBuf;
use thiserror::Error;

/// Result type for script parsing
pub type ParseResult<T> = Result<T, ParseError>;

/// Errors that can occur while loading a script
#[derive(Debug, Error)]
pub enum ParseError {
    /// Failed to read the script file
    #[error("failed to read script {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The normalized text is not valid structured data
    #[error("invalid script syntax: {0}")]
    Syntax(#[from] serde_json::Error),

    /// A top-level element does not have the `[delay, [code, param...]]` shape
    #[error("invalid command #{index}: {reason}")]
    InvalidCommand { index: usize, reason: String },
}

impl ParseError {
    pub(crate) fn invalid(index: usize, reason: impl Into<String>) -> Self {
        Self::InvalidCommand {
            index,
            reason: reason.into(),
        }
    }
}
