//! REST endpoint handlers for the editor API.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/api/status` | Configured paths, log file count, group cache state |
//! | `GET` | `/api/logs/stash-report` | Per-player stash burial and recovery totals |
//! | `GET` | `/api/logs/export` | Raw admin log lines in a window, optionally filtered |
//! | `GET` | `/api/records/{group}/{file}` | Raw record document |
//! | `PUT` | `/api/records/{group}/{file}` | Overwrite a record document, log the diff |
//! | `GET` | `/api/changelog` | Changelog text |
//! | `POST` | `/api/groups/reload` | Re-read the group to folder table |

use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use warden_logs::clock::{parse_local_datetime, parse_request_datetime};
use warden_logs::export::{self, ExportFilter, SpatialFilter};
use warden_logs::{PlanarPosition, StashReport, TimeWindow, stash};
use warden_records::{DEFAULT_EDITOR_ID, diff_documents};

use crate::error::ApiError;
use crate::state::AppState;

/// Header carrying the editor's identity on record writes.
pub const EDITOR_HEADER: &str = "x-editor-id";

const RECORD_EXTENSION: &str = "xml";

// ---------------------------------------------------------------------------
// Query parameter structs
// ---------------------------------------------------------------------------

/// Query parameters for `GET /api/logs/stash-report`.
#[derive(Debug, Default, Deserialize)]
pub struct StashQuery {
    /// Inclusive lower bound; open-ended when absent.
    pub start: Option<String>,
    /// Inclusive upper bound; open-ended when absent.
    pub end: Option<String>,
}

/// Query parameters for `GET /api/logs/export`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportQuery {
    /// Inclusive lower bound (required).
    pub start: Option<String>,
    /// Inclusive upper bound (required).
    pub end: Option<String>,
    /// Search centre, x axis.
    pub x: Option<f64>,
    /// Search centre, z axis.
    pub z: Option<f64>,
    /// Older clients send the second planar axis as `y`.
    pub y: Option<f64>,
    /// Search radius.
    pub radius: Option<f64>,
    /// Re-run the export for every player seen near the centre.
    pub expand_by_ids: Option<bool>,
}

// ---------------------------------------------------------------------------
// Response bodies
// ---------------------------------------------------------------------------

/// Body of `GET /api/status`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    /// Admin log root.
    pub logs_dir: PathBuf,
    /// Record data root.
    pub data_dir: PathBuf,
    /// Changelog file.
    pub changelog: PathBuf,
    /// Log extension in use.
    pub log_extension: String,
    /// Datable log files currently discoverable.
    pub log_files: usize,
    /// Whether the group table is cached.
    pub groups_loaded: bool,
    /// Record parsers in the order they are tried.
    pub parsers: Vec<&'static str>,
}

/// Body of a successful record write.
#[derive(Debug, Serialize)]
pub struct WriteResponse {
    /// Always `true`; failures are reported as errors.
    pub ok: bool,
    /// Number of changed records logged.
    pub changes: usize,
}

/// Body of `POST /api/groups/reload`.
#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    /// Always `true`; failures are reported as errors.
    pub ok: bool,
    /// Groups in the reloaded table.
    pub groups: usize,
}

// ---------------------------------------------------------------------------
// GET /api/status
// ---------------------------------------------------------------------------

/// Report configuration and cache state.
pub async fn status(State(state): State<Arc<AppState>>) -> Result<Json<StatusResponse>, ApiError> {
    let log_files = state.archive.discover().await?.len();
    Ok(Json(StatusResponse {
        logs_dir: state.config.paths.logs_dir.clone(),
        data_dir: state.config.paths.data_dir.clone(),
        changelog: state.changelog.path().to_path_buf(),
        log_extension: state.archive.extension().to_owned(),
        log_files,
        groups_loaded: state.folders.is_loaded().await,
        parsers: state.parsers.strategy_names(),
    }))
}

// ---------------------------------------------------------------------------
// GET /api/logs/stash-report
// ---------------------------------------------------------------------------

/// Build the stash report for an optional window.
pub async fn stash_report(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StashQuery>,
) -> Result<Json<StashReport>, ApiError> {
    let window = TimeWindow::new(
        optional_datetime(query.start.as_deref())?,
        optional_datetime(query.end.as_deref())?,
    )?;
    let report = stash::stash_report(&state.archive, &state.tokenizer, &window).await?;
    info!(players = report.players.len(), "stash report served");
    Ok(Json(report))
}

// ---------------------------------------------------------------------------
// GET /api/logs/export
// ---------------------------------------------------------------------------

/// Export raw admin log lines as a downloadable text document.
pub async fn export_logs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ExportQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let start = required_local_datetime("start", query.start.as_deref())?;
    let end = required_local_datetime("end", query.end.as_deref())?;
    let window = TimeWindow::new(Some(start), Some(end))?;
    let spatial = spatial_filter(&query)?;
    let expand = query.expand_by_ids.unwrap_or(false);

    let lines = match spatial {
        Some(spatial) if expand => {
            export::export_expanded(&state.archive, &state.tokenizer, &window, spatial).await?
        }
        spatial => {
            let filter = ExportFilter::resolve(None, spatial);
            export::export_range(&state.archive, &state.tokenizer, &window, &filter).await?
        }
    };

    let file_name = export::export_file_name(start, end, state.archive.extension());
    info!(lines = lines.len(), file = %file_name, expand, "log export served");

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_owned()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        export::render_export(start, &lines),
    ))
}

fn optional_datetime(value: Option<&str>) -> Result<Option<DateTime<Utc>>, ApiError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(parse_request_datetime)
        .transpose()
        .map_err(ApiError::from)
}

/// A required bound, read as server-local wall-clock time.
fn required_local_datetime(name: &str, value: Option<&str>) -> Result<DateTime<Utc>, ApiError> {
    let value = value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::InvalidQuery(format!("{name} is required")))?;
    Ok(parse_local_datetime(value)?)
}

/// `x`, `z` (or `y`) and `radius` come together or not at all.
fn spatial_filter(query: &ExportQuery) -> Result<Option<SpatialFilter>, ApiError> {
    match (query.x, query.z.or(query.y), query.radius) {
        (None, None, None) => Ok(None),
        (Some(x), Some(z), Some(radius)) => {
            if !(x.is_finite() && z.is_finite()) {
                return Err(ApiError::InvalidQuery("x and z must be finite".to_owned()));
            }
            if !radius.is_finite() || radius < 0.0 {
                return Err(ApiError::InvalidQuery(
                    "radius must be a non-negative number".to_owned(),
                ));
            }
            Ok(Some(SpatialFilter {
                center: PlanarPosition::new(x, z),
                radius,
            }))
        }
        _ => Err(ApiError::InvalidQuery(
            "x, z and radius must be supplied together".to_owned(),
        )),
    }
}

// ---------------------------------------------------------------------------
// /api/records/{group}/{file}
// ---------------------------------------------------------------------------

/// Serve a record document as stored.
pub async fn get_record(
    State(state): State<Arc<AppState>>,
    Path((group, file)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let (path, _) = record_path(&state, &group, &file).await?;
    match tokio::fs::read_to_string(&path).await {
        Ok(text) => Ok((
            [(header::CONTENT_TYPE, "application/xml; charset=utf-8")],
            text,
        )),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            Err(ApiError::NotFound(format!("no record file {group}/{file}")))
        }
        Err(e) => Err(ApiError::Internal(format!("failed to read {group}/{file}: {e}"))),
    }
}

/// Overwrite a record document and log what changed.
///
/// The write is the operation; the changelog is best-effort and a
/// failure to append it is only logged.
pub async fn put_record(
    State(state): State<Arc<AppState>>,
    Path((group, file)): Path<(String, String)>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<WriteResponse>, ApiError> {
    let (path, stem) = record_path(&state, &group, &file).await?;
    let editor = editor_id(&headers);

    let old = match tokio::fs::read_to_string(&path).await {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => String::new(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "previous record unreadable, diffing against empty");
            String::new()
        }
    };

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| ApiError::Internal(format!("failed to create {}: {e}", parent.display())))?;
    }
    tokio::fs::write(&path, body.as_bytes())
        .await
        .map_err(|e| ApiError::Internal(format!("failed to write {group}/{file}: {e}")))?;

    let entries = diff_documents(&state.parsers, &old, &body, editor, Utc::now());
    if let Err(e) = state.changelog.append(&stem, &entries).await {
        warn!(file = %stem, error = %e, "changelog append failed, write kept");
    }

    info!(group = %group, file = %stem, editor, changes = entries.len(), "record written");
    Ok(Json(WriteResponse {
        ok: true,
        changes: entries.len(),
    }))
}

fn editor_id(headers: &HeaderMap) -> &str {
    headers
        .get(EDITOR_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(DEFAULT_EDITOR_ID)
}

/// Resolve `group`/`file` to a path under the data directory.
///
/// Returns the full path and the file stem used in the changelog.
async fn record_path(state: &AppState, group: &str, file: &str) -> Result<(PathBuf, String), ApiError> {
    let stem = record_stem(file)?;
    let folder = state
        .folders
        .resolve(group)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("unknown group {group}")))?;
    let path = state
        .config
        .paths
        .data_dir
        .join(folder)
        .join(format!("{stem}.{RECORD_EXTENSION}"));
    Ok((path, stem.to_owned()))
}

/// Validate a client file name and strip an optional `.xml` suffix.
fn record_stem(file: &str) -> Result<&str, ApiError> {
    let stem = file
        .strip_suffix(".xml")
        .or_else(|| file.strip_suffix(".XML"))
        .unwrap_or(file);
    let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-');
    if stem.is_empty() || stem.contains("..") || stem.starts_with('.') || !stem.chars().all(allowed) {
        return Err(ApiError::InvalidQuery(format!("invalid record file name {file:?}")));
    }
    Ok(stem)
}

// ---------------------------------------------------------------------------
// GET /api/changelog
// ---------------------------------------------------------------------------

/// Serve the changelog text.
pub async fn get_changelog(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let text = state.changelog.read().await?;
    Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], text))
}

// ---------------------------------------------------------------------------
// POST /api/groups/reload
// ---------------------------------------------------------------------------

/// Re-read the group to folder table.
pub async fn reload_groups(State(state): State<Arc<AppState>>) -> Result<Json<ReloadResponse>, ApiError> {
    let groups = state.folders.reload().await?;
    Ok(Json(ReloadResponse { ok: true, groups }))
}
