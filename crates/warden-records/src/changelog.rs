//! Append-only changelog of record-set edits.
//!
//! Each write produces one block:
//!
//! ```text
//! File: types.xml
//! 02-05-24 9:41:07 - [admin] AKM modified [fields: Nominal(10 > 20)]
//! 02-05-24 9:41:07 - [admin] Apple added
//!
//! ```

use std::path::{Path, PathBuf};

use chrono::FixedOffset;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::diff::{ChangeEntry, ChangeKind};
use crate::error::RecordError;

/// Editor id written when the caller does not identify themselves.
pub const DEFAULT_EDITOR_ID: &str = "unknown";

const TIMESTAMP_FORMAT: &str = "%d-%m-%y %-H:%M:%S";

/// Render one changelog line (without the trailing newline).
pub fn render_entry(entry: &ChangeEntry, offset: FixedOffset) -> String {
    let stamp = entry.timestamp.with_timezone(&offset).format(TIMESTAMP_FORMAT);
    let line = format!("{stamp} - [{}] {} {}", entry.editor_id, entry.record_name, entry.kind);
    if entry.kind == ChangeKind::Modified {
        format!("{line} [fields: {}]", entry.field_diffs.join(", "))
    } else {
        line
    }
}

/// Render a whole block for one written file, or `None` when nothing changed.
pub fn render_block(file_name: &str, entries: &[ChangeEntry], offset: FixedOffset) -> Option<String> {
    if entries.is_empty() {
        return None;
    }
    let mut block = format!("File: {file_name}.xml\n");
    for entry in entries {
        block.push_str(&render_entry(entry, offset));
        block.push('\n');
    }
    block.push('\n');
    Some(block)
}

/// The changelog file on disk.
#[derive(Debug, Clone)]
pub struct Changelog {
    path: PathBuf,
    offset: FixedOffset,
}

impl Changelog {
    /// A changelog at `path`, timestamped in `offset` civil time.
    pub fn new(path: impl Into<PathBuf>, offset: FixedOffset) -> Self {
        Self {
            path: path.into(),
            offset,
        }
    }

    /// Where the changelog lives.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a block for `file_name`. Returns whether anything was written.
    pub async fn append(&self, file_name: &str, entries: &[ChangeEntry]) -> Result<bool, RecordError> {
        let Some(block) = render_block(file_name, entries, self.offset) else {
            return Ok(false);
        };

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(e))?;
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| self.io_error(e))?;
        file.write_all(block.as_bytes())
            .await
            .map_err(|e| self.io_error(e))?;
        file.flush().await.map_err(|e| self.io_error(e))?;

        debug!(path = %self.path.display(), file = file_name, entries = entries.len(), "changelog appended");
        Ok(true)
    }

    /// The full changelog text, empty when nothing has been written yet.
    pub async fn read(&self) -> Result<String, RecordError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(self.io_error(e)),
        }
    }

    fn io_error(&self, source: std::io::Error) -> RecordError {
        RecordError::Io {
            path: self.path.clone(),
            source,
        }
    }
}
