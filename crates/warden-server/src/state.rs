//! Shared application state for the editor API.

use warden_logs::clock::server_fixed_offset;
use warden_logs::{LineTokenizer, LogArchive, LogError};
use warden_records::{Changelog, ParserChain};

use crate::config::WardenConfig;
use crate::folders::FolderMap;

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`](std::sync::Arc) and injected via Axum's `State`
/// extractor. Log analysis holds no per-request state: every request
/// rescans the archive. The only mutable piece is the group table cache.
#[derive(Debug)]
pub struct AppState {
    /// The configuration the server was started with.
    pub config: WardenConfig,
    /// The admin log tree.
    pub archive: LogArchive,
    /// Line grammar with the configured markers.
    pub tokenizer: LineTokenizer,
    /// Record document parsers, pattern first.
    pub parsers: ParserChain,
    /// Group to folder lookup.
    pub folders: FolderMap,
    /// Where record edits are recorded.
    pub changelog: Changelog,
}

impl AppState {
    /// Build the state from a validated configuration.
    pub fn from_config(config: WardenConfig) -> Result<Self, LogError> {
        let archive = LogArchive::new(config.paths.logs_dir.clone(), &config.logs.extension)?;
        let tokenizer = LineTokenizer::new(&config.logs.markers())?;
        let folders = FolderMap::new(config.paths.group_map.clone());
        let changelog = Changelog::new(config.paths.changelog.clone(), server_fixed_offset());
        Ok(Self {
            config,
            archive,
            tokenizer,
            parsers: ParserChain::standard(),
            folders,
            changelog,
        })
    }
}
