//! Field-level comparison of two record-set snapshots.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};

use crate::parser::ParserChain;
use crate::record::{Flag, RecordSet, ScalarField, StructuredRecord};

/// How a record differs between two snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// Only present in the new snapshot.
    Added,
    /// Only present in the old snapshot.
    Removed,
    /// Present in both with at least one differing field.
    Modified,
}

impl ChangeKind {
    /// The verb written to the changelog.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Removed => "removed",
            Self::Modified => "modified",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One record's change between two snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEntry {
    /// When the change was recorded.
    pub timestamp: DateTime<Utc>,
    /// Who made it.
    pub editor_id: String,
    /// The record that changed.
    pub record_name: String,
    /// Added, removed, or modified.
    pub kind: ChangeKind,
    /// Rendered field differences, empty unless `kind` is `Modified`.
    pub field_diffs: Vec<String>,
}

/// Differences between two versions of one record, rendered in field order.
///
/// Scalars and the category compare as literal text. Changed flags are
/// merged into a single `Flags(...)` entry. A name list that differs is
/// rendered whole, old and new, in sorted order.
pub fn diff_record(old: &StructuredRecord, new: &StructuredRecord) -> Vec<String> {
    let mut diffs = Vec::new();

    for field in ScalarField::ALL {
        let (before, after) = (old.scalar(field), new.scalar(field));
        if before != after {
            diffs.push(format!("{}({before} > {after})", field.label()));
        }
    }

    if old.category != new.category {
        diffs.push(format!("Category({} > {})", old.category, new.category));
    }

    let flags: Vec<String> = Flag::ALL
        .into_iter()
        .filter(|flag| old.flag(*flag) != new.flag(*flag))
        .map(|flag| {
            format!(
                "{}: {} > {}",
                flag.attribute(),
                flag_digit(old.flag(flag)),
                flag_digit(new.flag(flag))
            )
        })
        .collect();
    if !flags.is_empty() {
        diffs.push(format!("Flags({})", flags.join(", ")));
    }

    for (label, before, after) in [
        ("Usage", &old.usage, &new.usage),
        ("Value", &old.value, &new.value),
        ("Tag", &old.tag, &new.tag),
    ] {
        if before != after {
            diffs.push(format!("{label}({} > {})", render_list(before), render_list(after)));
        }
    }

    diffs
}

/// Compare two snapshots, one entry per differing record, by record name.
pub fn diff_record_sets(
    old: &RecordSet,
    new: &RecordSet,
    editor_id: &str,
    timestamp: DateTime<Utc>,
) -> Vec<ChangeEntry> {
    let names: BTreeSet<&String> = old.keys().chain(new.keys()).collect();

    names
        .into_iter()
        .filter_map(|name| {
            let (kind, field_diffs) = match (old.get(name), new.get(name)) {
                (None, Some(_)) => (ChangeKind::Added, Vec::new()),
                (Some(_), None) => (ChangeKind::Removed, Vec::new()),
                (Some(before), Some(after)) => {
                    let diffs = diff_record(before, after);
                    if diffs.is_empty() {
                        return None;
                    }
                    (ChangeKind::Modified, diffs)
                }
                (None, None) => return None,
            };
            Some(ChangeEntry {
                timestamp,
                editor_id: editor_id.to_owned(),
                record_name: name.clone(),
                kind,
                field_diffs,
            })
        })
        .collect()
}

/// Parse two raw documents with `parsers` and compare them.
///
/// A document neither strategy can read counts as an empty snapshot.
pub fn diff_documents(
    parsers: &ParserChain,
    old: &str,
    new: &str,
    editor_id: &str,
    timestamp: DateTime<Utc>,
) -> Vec<ChangeEntry> {
    let before = parsers.parse_or_empty(old);
    let after = parsers.parse_or_empty(new);
    diff_record_sets(&before, &after, editor_id, timestamp)
}

const fn flag_digit(set: bool) -> &'static str {
    if set { "1" } else { "0" }
}

fn render_list(names: &BTreeSet<String>) -> String {
    let joined: Vec<&str> = names.iter().map(String::as_str).collect();
    format!("[{}]", joined.join(", "))
}
