//! Admin log analysis for the Warden server editor.
//!
//! The game server writes line-oriented admin logs (`.ADM`) that carry
//! only a time of day per line. This crate turns a directory of them into
//! ordered, absolutely-timed records and runs two analyses on top:
//!
//! - **Stash report** ([`stash`]): pairs each stash dug up with the
//!   nearest earlier stash buried at the same spot and totals burials and
//!   recoveries per player.
//! - **Ranged export** ([`export`]): pulls raw lines inside a time window,
//!   optionally narrowed by radius or by player id, with a two-pass
//!   "expand by id" mode.
//!
//! # Pipeline
//!
//! ```text
//! LogArchive::discover --> LogArchive::load --> timeline::reconstruct --> LineTokenizer
//!                                                         |
//!                                       +-----------------+-----------------+
//!                                       v                                   v
//!                                stash::correlate                  export::export_range
//! ```
//!
//! All instants are UTC; the server's fixed UTC+10 civil clock is handled
//! in [`clock`]. Nothing is indexed: every request rescans the files.

pub mod archive;
pub mod clock;
pub mod error;
pub mod export;
pub mod filename;
pub mod stash;
pub mod timeline;
pub mod tokenizer;

pub use archive::{DEFAULT_LOG_EXTENSION, LogArchive, LogFile, LogSource};
pub use clock::{TimeWindow, parse_local_datetime, parse_request_datetime, server_fixed_offset};
pub use error::LogError;
pub use export::{ExportFilter, ExportedLine, SpatialFilter};
pub use stash::{ActorAggregate, LogEvent, StashReport};
pub use tokenizer::{EventKind, EventMarkers, LineTokenizer, PlanarPosition};
