//! Ranged raw-line export.
//!
//! Selects raw lines whose reconstructed instant lies inside a window,
//! optionally narrowed to a set of actor ids or a planar radius. Output
//! keeps file-then-line order and is never re-sorted across files.

use std::collections::BTreeSet;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::archive::LogArchive;
use crate::clock::{TimeWindow, format_local};
use crate::error::LogError;
use crate::tokenizer::{LineTokenizer, PlanarPosition};

/// Keep lines whose position lies within `radius` of `center`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialFilter {
    /// Centre of the search circle.
    pub center: PlanarPosition,
    /// Inclusive radius.
    pub radius: f64,
}

impl SpatialFilter {
    /// Whether `position` lies inside the circle.
    pub fn contains(&self, position: &PlanarPosition) -> bool {
        self.center.distance_to(position) <= self.radius
    }
}

/// The single filter applied to each in-range line.
#[derive(Debug, Clone, PartialEq)]
pub enum ExportFilter {
    /// Keep every line.
    All,
    /// Keep lines near a point.
    Spatial(SpatialFilter),
    /// Keep lines whose actor id is in the set.
    Actors(BTreeSet<String>),
}

impl ExportFilter {
    /// Pick the filter to apply. A non-empty id set always wins over a
    /// spatial filter.
    pub fn resolve(actor_ids: Option<BTreeSet<String>>, spatial: Option<SpatialFilter>) -> Self {
        match (actor_ids, spatial) {
            (Some(ids), _) if !ids.is_empty() => Self::Actors(ids),
            (_, Some(spatial)) => Self::Spatial(spatial),
            _ => Self::All,
        }
    }

    fn keeps(&self, text: &str, tokenizer: &LineTokenizer) -> bool {
        match self {
            Self::All => true,
            Self::Spatial(spatial) => tokenizer
                .position(text)
                .is_some_and(|position| spatial.contains(&position)),
            Self::Actors(ids) => tokenizer.actor_id(text).is_some_and(|id| ids.contains(id)),
        }
    }
}

/// A raw line selected for export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedLine {
    /// File the line came from.
    pub path: PathBuf,
    /// 1-based line number within that file.
    pub line_number: usize,
    /// Reconstructed instant.
    pub instant: DateTime<Utc>,
    /// The raw text, unmodified.
    pub text: String,
}

/// Select in-range lines that pass `filter`.
pub async fn export_range(
    archive: &LogArchive,
    tokenizer: &LineTokenizer,
    window: &TimeWindow,
    filter: &ExportFilter,
) -> Result<Vec<ExportedLine>, LogError> {
    let mut selected = Vec::new();

    for source in archive.discover().await? {
        let Some(file) = archive.load_or_skip(&source).await else {
            continue;
        };
        selected.extend(
            file.timeline(tokenizer)
                .into_iter()
                .filter(|line| window.contains(line.instant))
                .filter(|line| filter.keeps(line.text, tokenizer))
                .map(|line| ExportedLine {
                    path: file.path.clone(),
                    line_number: line.line_number,
                    instant: line.instant,
                    text: line.text.to_owned(),
                }),
        );
    }

    Ok(selected)
}

/// Distinct actor ids appearing in `lines`.
pub fn actor_ids(lines: &[ExportedLine], tokenizer: &LineTokenizer) -> BTreeSet<String> {
    lines
        .iter()
        .filter_map(|line| tokenizer.actor_id(&line.text))
        .map(str::to_owned)
        .collect()
}

/// Two-pass export: find the actors seen near a point, then return every
/// in-range line touched by those actors, wherever it happened.
///
/// If nobody with an id was seen near the point, the first pass is
/// returned as is.
pub async fn export_expanded(
    archive: &LogArchive,
    tokenizer: &LineTokenizer,
    window: &TimeWindow,
    spatial: SpatialFilter,
) -> Result<Vec<ExportedLine>, LogError> {
    let nearby = export_range(archive, tokenizer, window, &ExportFilter::Spatial(spatial)).await?;
    let ids = actor_ids(&nearby, tokenizer);
    debug!(
        nearby_lines = nearby.len(),
        actors = ids.len(),
        "expanding export by actor id"
    );

    if ids.is_empty() {
        return Ok(nearby);
    }
    export_range(archive, tokenizer, window, &ExportFilter::Actors(ids)).await
}

/// Render an export as an admin log document with a synthesized header.
pub fn render_export(start: DateTime<Utc>, lines: &[ExportedLine]) -> String {
    let mut out = format!(
        "AdminLog started on {} at {}\n",
        format_local(start, "%Y-%m-%d"),
        format_local(start, "%H:%M:%S")
    );
    for line in lines {
        out.push_str(&line.text);
        out.push('\n');
    }
    out
}

/// Suggested download name, `<start>_to_<end>.<ext>` in server-local time.
pub fn export_file_name(start: DateTime<Utc>, end: DateTime<Utc>, extension: &str) -> String {
    const STAMP: &str = "%Y-%m-%d_%H-%M-%S";
    format!(
        "{}_to_{}.{extension}",
        format_local(start, STAMP),
        format_local(end, STAMP)
    )
}
