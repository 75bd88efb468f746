//! Absolute timestamp reconstruction for a single log file.
//!
//! Lines only carry a time of day. The file's inferred start instant pins
//! the civil day; each time the clock goes backwards relative to the
//! previous timed line the day offset is bumped, so instants within one
//! file never decrease.

use chrono::{DateTime, TimeDelta, Utc};

use crate::clock::local_midnight;
use crate::tokenizer::LineTokenizer;

/// A raw line together with its reconstructed instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimedLine<'a> {
    /// 1-based line number within the file.
    pub line_number: usize,
    /// Absolute instant of the record.
    pub instant: DateTime<Utc>,
    /// The raw line text.
    pub text: &'a str,
}

/// Reconstruct instants for every timed line of a file.
///
/// Untimed lines (headers, continuation text) are dropped.
pub fn reconstruct<'a>(
    started_at: DateTime<Utc>,
    lines: &'a [String],
    tokenizer: &LineTokenizer,
) -> Vec<TimedLine<'a>> {
    let Some(midnight) = local_midnight(started_at) else {
        return Vec::new();
    };

    let mut day_offset: i64 = 0;
    let mut previous: Option<u32> = None;
    let mut timed = Vec::new();

    for (index, text) in lines.iter().enumerate() {
        let Some(seconds) = tokenizer.seconds_of_day(text) else {
            continue;
        };

        if previous.is_some_and(|p| seconds < p) {
            day_offset = day_offset.saturating_add(1);
        }
        previous = Some(seconds);

        let offset = TimeDelta::days(day_offset)
            .checked_add(&TimeDelta::seconds(i64::from(seconds)));
        let Some(instant) = offset.and_then(|o| midnight.checked_add_signed(o)) else {
            continue;
        };

        timed.push(TimedLine {
            line_number: index.saturating_add(1),
            instant,
            text,
        });
    }

    timed
}
