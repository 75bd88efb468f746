//! Group to folder lookup table.
//!
//! Record documents are addressed by a logical group name
//! (`/api/records/{group}/{file}`). A JSON object file declares which
//! folder under the data directory each group lives in:
//!
//! ```json
//! { "economy": "dayzOffline.chernarusplus/db", "events": "dayzOffline.chernarusplus/env" }
//! ```
//!
//! The table is read on first use and then served from memory. A changed
//! declaration file is only picked up through [`FolderMap::reload`] or
//! after [`FolderMap::invalidate`].

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info};

/// Group name to folder, relative to the data directory.
pub type FolderTable = BTreeMap<String, String>;

/// Errors reading the declaration file.
#[derive(Debug, thiserror::Error)]
pub enum FolderError {
    /// The file exists but could not be read.
    #[error("failed to read group map {}: {source}", path.display())]
    Io {
        /// The declaration file.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The file is not a JSON object of strings.
    #[error("invalid group map {}: {source}", path.display())]
    Json {
        /// The declaration file.
        path: PathBuf,
        /// The underlying JSON error.
        source: serde_json::Error,
    },
}

/// Lazily populated, explicitly invalidated group table.
#[derive(Debug)]
pub struct FolderMap {
    path: PathBuf,
    table: RwLock<Option<Arc<FolderTable>>>,
}

impl FolderMap {
    /// A map backed by the declaration file at `path`. Nothing is read yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            table: RwLock::new(None),
        }
    }

    /// The declaration file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The table, reading the declaration file on first use.
    pub async fn table(&self) -> Result<Arc<FolderTable>, FolderError> {
        let cached = self.table.read().await.clone();
        if let Some(table) = cached {
            return Ok(table);
        }

        let mut slot = self.table.write().await;
        if let Some(table) = slot.as_ref() {
            return Ok(Arc::clone(table));
        }
        let table = Arc::new(self.read_file().await?);
        *slot = Some(Arc::clone(&table));
        debug!(groups = table.len(), "group map loaded");
        Ok(table)
    }

    /// The folder declared for `group`, if any.
    pub async fn resolve(&self, group: &str) -> Result<Option<String>, FolderError> {
        Ok(self.table().await?.get(group).cloned())
    }

    /// Drop the cached table; the next lookup re-reads the file.
    pub async fn invalidate(&self) {
        *self.table.write().await = None;
    }

    /// Re-read the declaration file now. Returns the number of groups.
    ///
    /// On failure the previous table stays in place.
    pub async fn reload(&self) -> Result<usize, FolderError> {
        let table = self.read_file().await?;
        let groups = table.len();
        *self.table.write().await = Some(Arc::new(table));
        info!(groups, path = %self.path.display(), "group map reloaded");
        Ok(groups)
    }

    /// Whether the table has been read since start-up or the last invalidation.
    pub async fn is_loaded(&self) -> bool {
        self.table.read().await.is_some()
    }

    async fn read_file(&self) -> Result<FolderTable, FolderError> {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no group map, no groups");
                return Ok(FolderTable::new());
            }
            Err(source) => {
                return Err(FolderError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        serde_json::from_str(&text).map_err(|source| FolderError::Json {
            path: self.path.clone(),
            source,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    async fn write(path: &Path, text: &str) {
        tokio::fs::write(path, text).await.unwrap();
    }

    #[tokio::test]
    async fn lazy_then_cached_until_invalidated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("groups.json");
        write(&path, r#"{"economy": "db"}"#).await;

        let map = FolderMap::new(&path);
        assert!(!map.is_loaded().await);
        assert_eq!(map.resolve("economy").await.unwrap().as_deref(), Some("db"));
        assert!(map.is_loaded().await);

        write(&path, r#"{"economy": "db2"}"#).await;
        assert_eq!(map.resolve("economy").await.unwrap().as_deref(), Some("db"));

        map.invalidate().await;
        assert!(!map.is_loaded().await);
        assert_eq!(map.resolve("economy").await.unwrap().as_deref(), Some("db2"));
    }

    #[tokio::test]
    async fn reload_picks_up_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("groups.json");
        write(&path, r#"{"a": "x"}"#).await;
        let map = FolderMap::new(&path);
        assert_eq!(map.resolve("b").await.unwrap(), None);

        write(&path, r#"{"a": "x", "b": "y"}"#).await;
        assert_eq!(map.reload().await.unwrap(), 2);
        assert_eq!(map.resolve("b").await.unwrap().as_deref(), Some("y"));
    }

    #[tokio::test]
    async fn missing_file_is_empty_and_bad_json_fails() {
        let dir = tempfile::tempdir().unwrap();
        let map = FolderMap::new(dir.path().join("absent.json"));
        assert!(map.table().await.unwrap().is_empty());

        let path = dir.path().join("broken.json");
        write(&path, "[1, 2").await;
        let broken = FolderMap::new(&path);
        assert!(matches!(broken.resolve("a").await, Err(FolderError::Json { .. })));
        assert!(!broken.is_loaded().await);
    }
}
