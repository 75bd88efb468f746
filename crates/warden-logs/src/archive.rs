//! Log file discovery and loading.
//!
//! The logs root holds the live admin logs plus archival buckets named
//! by number (`1/`, `2/`, `2024/` ...). Only those numeric directories are
//! descended into; anything else under the root is unrelated content.
//! Every analysis run rescans the tree from scratch.

use std::cmp::Ordering;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::error::LogError;
use crate::filename::FilenameDates;
use crate::timeline::{TimedLine, reconstruct};
use crate::tokenizer::LineTokenizer;

/// Default admin log extension.
pub const DEFAULT_LOG_EXTENSION: &str = "ADM";

/// A discovered log file with a usable start instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSource {
    /// Full path of the file.
    pub path: PathBuf,
    /// Start instant inferred from the file name.
    pub started_at: DateTime<Utc>,
}

/// A loaded log file. Immutable once read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFile {
    /// Full path of the file.
    pub path: PathBuf,
    /// Start instant inferred from the file name.
    pub started_at: DateTime<Utc>,
    /// Raw lines in file order.
    pub lines: Vec<String>,
}

impl LogFile {
    /// Timed lines with reconstructed absolute instants.
    pub fn timeline(&self, tokenizer: &LineTokenizer) -> Vec<TimedLine<'_>> {
        reconstruct(self.started_at, &self.lines, tokenizer)
    }
}

/// A directory tree of admin logs.
#[derive(Debug, Clone)]
pub struct LogArchive {
    root: PathBuf,
    extension: String,
    dates: FilenameDates,
}

impl LogArchive {
    /// Create an archive rooted at `root`, collecting files with `extension`
    /// (compared case-insensitively, without the leading dot).
    pub fn new(root: impl Into<PathBuf>, extension: &str) -> Result<Self, LogError> {
        Ok(Self {
            root: root.into(),
            extension: extension.trim_start_matches('.').to_owned(),
            dates: FilenameDates::new()?,
        })
    }

    /// The logs root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The log file extension, without a dot.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// List datable log files in chronological order.
    ///
    /// Files whose names carry no date are dropped silently. Ties on the
    /// start instant are broken by comparing the full path as a string so
    /// repeated runs always agree. A missing root yields an empty list.
    pub async fn discover(&self) -> Result<Vec<LogSource>, LogError> {
        let mut pending = vec![self.root.clone()];
        let mut sources = Vec::new();

        while let Some(dir) = pending.pop() {
            let mut entries = match tokio::fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if dir == self.root && e.kind() == ErrorKind::NotFound => {
                    debug!(root = %dir.display(), "logs root does not exist");
                    return Ok(Vec::new());
                }
                Err(e) => {
                    self.listing_failed(&dir, e)?;
                    continue;
                }
            };

            loop {
                let entry = match entries.next_entry().await {
                    Ok(Some(entry)) => entry,
                    Ok(None) => break,
                    Err(e) => {
                        self.listing_failed(&dir, e)?;
                        break;
                    }
                };
                let path = entry.path();
                let Ok(file_type) = entry.file_type().await else {
                    continue;
                };

                if file_type.is_dir() {
                    if is_numeric_bucket(&path) {
                        pending.push(path);
                    }
                } else if file_type.is_file() && self.has_log_extension(&path) {
                    match self.dates.infer(&path) {
                        Some(started_at) => sources.push(LogSource { path, started_at }),
                        None => debug!(file = %path.display(), "no date in log file name"),
                    }
                }
            }
        }

        sources.sort_by(chronological);
        Ok(sources)
    }

    /// Read a discovered file into memory, decoding lossily as UTF-8.
    pub async fn load(&self, source: &LogSource) -> Result<LogFile, LogError> {
        let bytes = tokio::fs::read(&source.path)
            .await
            .map_err(|e| LogError::Io {
                path: source.path.clone(),
                source: e,
            })?;
        let lines = String::from_utf8_lossy(&bytes)
            .lines()
            .map(str::to_owned)
            .collect();

        Ok(LogFile {
            path: source.path.clone(),
            started_at: source.started_at,
            lines,
        })
    }

    /// Load a file, logging and skipping it if it cannot be read.
    pub async fn load_or_skip(&self, source: &LogSource) -> Option<LogFile> {
        match self.load(source).await {
            Ok(file) => Some(file),
            Err(e) => {
                warn!(error = %e, "skipping unreadable log file");
                None
            }
        }
    }

    /// A listing failure on the root is fatal; a bucket is skipped.
    fn listing_failed(&self, dir: &Path, source: std::io::Error) -> Result<(), LogError> {
        if dir == self.root.as_path() {
            return Err(LogError::Io {
                path: dir.to_path_buf(),
                source,
            });
        }
        warn!(dir = %dir.display(), error = %source, "skipping unreadable log bucket");
        Ok(())
    }

    fn has_log_extension(&self, path: &Path) -> bool {
        path.extension()
            .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case(&self.extension))
    }
}

fn is_numeric_bucket(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy())
        .is_some_and(|name| !name.is_empty() && name.chars().all(|c| c.is_ascii_digit()))
}

fn chronological(a: &LogSource, b: &LogSource) -> Ordering {
    a.started_at
        .cmp(&b.started_at)
        .then_with(|| a.path.to_string_lossy().cmp(&b.path.to_string_lossy()))
}
