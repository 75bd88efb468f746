//! Stash burial/recovery correlation.
//!
//! Every Enter (stash buried) and Exit (stash dug up) line becomes a
//! [`LogEvent`]. Each Exit is attributed to the nearest earlier Enter
//! whose position lies within [`RECOVERY_TOLERANCE`] on both planar axes:
//! the same actor recovering their own stash, or someone else's.
//!
//! Events are ordered file-then-line, which is taken as the total order
//! for correlation even though it is not always the true global order.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::archive::LogArchive;
use crate::clock::TimeWindow;
use crate::error::LogError;
use crate::timeline::TimedLine;
use crate::tokenizer::{EventKind, LineTokenizer, PlanarPosition};

/// Per-axis distance within which an Exit matches an earlier Enter.
pub const RECOVERY_TOLERANCE: f64 = 1.0;

/// A correlated Enter or Exit record.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEvent {
    /// Absolute instant of the line.
    pub instant: DateTime<Utc>,
    /// Enter or Exit.
    pub kind: EventKind,
    /// Acting player id.
    pub actor_id: String,
    /// Player display name, when the line carries one.
    pub alias: Option<String>,
    /// Where it happened.
    pub position: PlanarPosition,
}

impl LogEvent {
    /// Build an event from a timed line, if it is an Enter or Exit with
    /// both an actor id and a position.
    pub fn from_line(line: &TimedLine<'_>, tokenizer: &LineTokenizer) -> Option<Self> {
        let tokens = tokenizer.tokenize(line.text);
        Some(Self {
            instant: line.instant,
            kind: tokens.kind?,
            actor_id: tokens.actor_id?.to_owned(),
            alias: tokens.alias.map(str::to_owned),
            position: tokens.position?,
        })
    }
}

/// Per-player totals in a stash report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActorAggregate {
    /// Player id.
    #[serde(rename = "id")]
    pub actor_id: String,
    /// Every display name seen for this id.
    pub aliases: BTreeSet<String>,
    /// Stashes this player buried.
    #[serde(rename = "dugIn")]
    pub enter_count: u64,
    /// Own stashes this player dug up.
    #[serde(rename = "dugUpOwn")]
    pub self_recover_count: u64,
    /// Other players' stashes this player dug up.
    #[serde(rename = "dugUpOthers")]
    pub other_recover_count: u64,
}

impl ActorAggregate {
    fn new(actor_id: &str) -> Self {
        Self {
            actor_id: actor_id.to_owned(),
            aliases: BTreeSet::new(),
            enter_count: 0,
            self_recover_count: 0,
            other_recover_count: 0,
        }
    }
}

/// Stash activity report, one row per player.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StashReport {
    /// Rows ordered by buried desc, own recoveries desc, then id.
    pub players: Vec<ActorAggregate>,
}

/// Walk the archive and collect Enter/Exit events inside `window`.
pub async fn collect_events(
    archive: &LogArchive,
    tokenizer: &LineTokenizer,
    window: &TimeWindow,
) -> Result<Vec<LogEvent>, LogError> {
    let mut events = Vec::new();

    for source in archive.discover().await? {
        let Some(file) = archive.load_or_skip(&source).await else {
            continue;
        };
        events.extend(
            file.timeline(tokenizer)
                .iter()
                .filter(|line| window.contains(line.instant))
                .filter_map(|line| LogEvent::from_line(line, tokenizer)),
        );
    }

    Ok(events)
}

/// Attribute every Exit and total the results per actor.
///
/// An Exit with no earlier Enter in range counts toward nothing. The
/// backward scan is quadratic in the worst case.
pub fn correlate(events: &[LogEvent]) -> Vec<ActorAggregate> {
    let mut actors: BTreeMap<&str, ActorAggregate> = BTreeMap::new();

    for (index, event) in events.iter().enumerate() {
        let aggregate = actors
            .entry(event.actor_id.as_str())
            .or_insert_with(|| ActorAggregate::new(&event.actor_id));

        if let Some(alias) = &event.alias {
            aggregate.aliases.insert(alias.clone());
        }

        match event.kind {
            EventKind::Enter => {
                aggregate.enter_count = aggregate.enter_count.saturating_add(1);
            }
            EventKind::Exit => {
                let matched = events.get(..index).and_then(|earlier| {
                    earlier.iter().rev().find(|candidate| {
                        candidate.kind == EventKind::Enter
                            && candidate
                                .position
                                .within_box(&event.position, RECOVERY_TOLERANCE)
                    })
                });

                match matched {
                    Some(enter) if enter.actor_id == event.actor_id => {
                        aggregate.self_recover_count =
                            aggregate.self_recover_count.saturating_add(1);
                    }
                    Some(_) => {
                        aggregate.other_recover_count =
                            aggregate.other_recover_count.saturating_add(1);
                    }
                    None => {}
                }
            }
        }
    }

    let mut rows: Vec<ActorAggregate> = actors.into_values().collect();
    rows.sort_by(|a, b| {
        b.enter_count
            .cmp(&a.enter_count)
            .then_with(|| b.self_recover_count.cmp(&a.self_recover_count))
            .then_with(|| a.actor_id.cmp(&b.actor_id))
    });
    rows
}

/// Build the stash report for `window`.
pub async fn stash_report(
    archive: &LogArchive,
    tokenizer: &LineTokenizer,
    window: &TimeWindow,
) -> Result<StashReport, LogError> {
    let events = collect_events(archive, tokenizer, window).await?;
    let players = correlate(&events);
    tracing::debug!(
        events = events.len(),
        players = players.len(),
        "stash report built"
    );
    Ok(StashReport { players })
}
