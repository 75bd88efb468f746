//! Server civil time and time windows.
//!
//! The game server writes its logs in local civil time at a fixed UTC+10
//! offset with no daylight-saving adjustment. Every absolute instant in
//! this crate is a [`DateTime<Utc>`]; conversion to and from server local
//! time goes through [`local_to_instant`] and [`instant_to_local`].

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeDelta, Utc};

use crate::error::LogError;

/// Hours the server's civil clock runs ahead of UTC.
pub const SERVER_UTC_OFFSET_HOURS: i64 = 10;

/// Naive datetime layouts accepted from request parameters, tried in order.
const REQUEST_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const SERVER_UTC_OFFSET_SECONDS: i32 = 36_000;

fn server_offset() -> TimeDelta {
    TimeDelta::hours(SERVER_UTC_OFFSET_HOURS)
}

/// The server offset as a `chrono` time zone, for formatting.
pub fn server_fixed_offset() -> FixedOffset {
    FixedOffset::east_opt(SERVER_UTC_OFFSET_SECONDS).unwrap_or_else(|| Utc.fix())
}

/// Convert a server-local civil datetime into an absolute instant.
///
/// The value is read as if it were UTC and then shifted back by the
/// server offset. Returns `None` only at the edges of the representable
/// range.
pub fn local_to_instant(local: NaiveDateTime) -> Option<DateTime<Utc>> {
    local
        .and_utc()
        .checked_sub_signed(server_offset())
}

/// Convert an absolute instant into server-local civil time.
pub fn instant_to_local(instant: DateTime<Utc>) -> Option<NaiveDateTime> {
    instant
        .naive_utc()
        .checked_add_signed(server_offset())
}

/// The instant of server-local midnight on the civil day containing `instant`.
pub fn local_midnight(instant: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let local = instant_to_local(instant)?;
    local_to_instant(local.date().and_time(NaiveTime::MIN))
}

/// Format an instant in server-local time with a `chrono` format string.
pub fn format_local(instant: DateTime<Utc>, format: &str) -> String {
    instant_to_local(instant)
        .map(|local| local.format(format).to_string())
        .unwrap_or_default()
}

/// Parse a loosely ISO-formatted datetime from a request.
///
/// Strings carrying an explicit offset (RFC 3339, including `Z`) are
/// honoured as written. Naive datetimes and bare dates are server-local.
pub fn parse_request_datetime(input: &str) -> Result<DateTime<Utc>, LogError> {
    let trimmed = input.trim();

    if let Ok(with_offset) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(with_offset.with_timezone(&Utc));
    }
    let naive = parse_naive(trimmed).ok_or_else(|| LogError::InvalidDateTime(trimmed.to_owned()))?;
    local_to_instant(naive).ok_or_else(|| LogError::InvalidDateTime(trimmed.to_owned()))
}

/// Parse a request datetime as server-local wall-clock time.
///
/// Any offset in the input is dropped: `2024-05-02T12:00:00Z` means
/// 12:00 on the server clock. Export bounds are read this way.
pub fn parse_local_datetime(input: &str) -> Result<DateTime<Utc>, LogError> {
    let trimmed = input.trim();

    let naive = DateTime::parse_from_rfc3339(trimmed)
        .ok()
        .map(|with_offset| with_offset.naive_local())
        .or_else(|| parse_naive(trimmed))
        .ok_or_else(|| LogError::InvalidDateTime(trimmed.to_owned()))?;
    local_to_instant(naive).ok_or_else(|| LogError::InvalidDateTime(trimmed.to_owned()))
}

fn parse_naive(trimmed: &str) -> Option<NaiveDateTime> {
    REQUEST_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                .ok()
                .map(|date| date.and_time(NaiveTime::MIN))
        })
}

/// An inclusive window of instants, open-ended on either side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeWindow {
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
}

impl TimeWindow {
    /// Build a window, rejecting a start that lies after the end.
    pub fn new(
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Self, LogError> {
        if let (Some(s), Some(e)) = (start, end)
            && s > e
        {
            return Err(LogError::InvalidWindow {
                start: s.to_rfc3339(),
                end: e.to_rfc3339(),
            });
        }
        Ok(Self { start, end })
    }

    /// A window that admits every instant.
    pub const fn unbounded() -> Self {
        Self {
            start: None,
            end: None,
        }
    }

    /// The inclusive lower bound, if any.
    pub const fn start(&self) -> Option<DateTime<Utc>> {
        self.start
    }

    /// The inclusive upper bound, if any.
    pub const fn end(&self) -> Option<DateTime<Utc>> {
        self.end
    }

    /// Whether `instant` falls inside the window (both ends inclusive).
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start.is_none_or(|s| instant >= s) && self.end.is_none_or(|e| instant <= e)
    }
}
