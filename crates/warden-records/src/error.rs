//! Error types for record parsing and changelog output.

use std::path::PathBuf;

/// Errors that can occur while parsing record sets or writing the changelog.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    /// A record document is not well formed for the strategy reading it.
    #[error("malformed record document ({strategy}): {reason}")]
    Malformed {
        /// Name of the parsing strategy that rejected the document.
        strategy: &'static str,
        /// What was wrong.
        reason: String,
    },

    /// A grammar pattern failed to compile.
    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// No parsing strategy is configured.
    #[error("no record parser available")]
    NoParser,

    /// The changelog could not be written.
    #[error("failed to write {}: {source}", path.display())]
    Io {
        /// The changelog path.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}
