//! Error types for log analysis.

use std::path::PathBuf;

/// Errors that can occur while discovering, loading, or querying admin logs.
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    /// A file or directory under the logs root could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// The path that failed.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A grammar pattern failed to compile.
    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// A request datetime string could not be interpreted.
    #[error("invalid datetime: {0}")]
    InvalidDateTime(String),

    /// A time window whose start lies after its end.
    #[error("invalid time window: start {start} is after end {end}")]
    InvalidWindow {
        /// The requested start, as supplied.
        start: String,
        /// The requested end, as supplied.
        end: String,
    },
}
