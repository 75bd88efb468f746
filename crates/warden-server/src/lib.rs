//! HTTP editor API for the Warden server tools.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **Log analysis** over the game server's admin logs: a per-player
//!   stash report and a ranged, filterable raw log export
//!   ([`warden_logs`])
//! - **Record documents** addressed by group and file name, with every
//!   overwrite diffed against the previous version and appended to a
//!   changelog ([`warden_records`])
//! - **Maintenance** endpoints for status and reloading the group table
//!
//! # Architecture
//!
//! Nothing is indexed or cached except the group to folder table
//! ([`folders::FolderMap`]). Each log request rescans the archive and
//! each record write reads the previous document from disk. A record
//! write succeeds once the new document is on disk; the changelog append
//! that follows is best-effort.

pub mod config;
pub mod error;
pub mod folders;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;

// Re-export primary types for convenience.
pub use config::{ConfigError, WardenConfig};
pub use error::ApiError;
pub use router::build_router;
pub use server::{ServerConfig, ServerError, start_server};
pub use state::AppState;
