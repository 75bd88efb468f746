//! Admin log line grammar.
//!
//! A timed record looks like
//!
//! ```text
//! 14:02:11 | Player "Survivor" (id=Abc123xyz= pos=<4512.3, 301.7, 9877.1>) Dug in Underground Stash
//! ```
//!
//! Each token is extracted independently so a line missing one token
//! still yields the others. Positions keep only the first and third
//! components of the triple; the middle (vertical) component is dropped.

use regex::Regex;

use crate::error::LogError;

/// Default Enter marker: a stash being buried.
pub const DEFAULT_ENTER_MARKER: &str = r"(?i)\b(?:dug in|buried)\b";

/// Default Exit marker: a stash being dug back up.
pub const DEFAULT_EXIT_MARKER: &str = r"(?i)\b(?:dug up|dug out|unburied)\b";

const NUMBER: &str = r"-?\d+(?:\.\d+)?(?:[eE][-+]?\d+)?";
const TIME_PATTERN: &str =
    r"^\s*(?P<hour>\d{1,2}):(?P<minute>\d{2}):(?P<second>\d{2})(?:\.\d+)?\s*\|";
const ACTOR_ID_PATTERN: &str = r"\(\s*id=(?P<id>[^\s)]+)";
const ALIAS_PATTERN: &str = r#"Player\s+"(?P<alias>[^"]*)""#;

/// Kind of a correlated event line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum EventKind {
    /// An actor starts an interaction at a position (stash buried).
    Enter,
    /// An actor concludes an interaction at a position (stash dug up).
    Exit,
}

/// A position on the ground plane, vertical axis discarded.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct PlanarPosition {
    /// East-west coordinate.
    pub x: f64,
    /// North-south coordinate.
    pub z: f64,
}

impl PlanarPosition {
    /// Build a position from its two planar components.
    pub const fn new(x: f64, z: f64) -> Self {
        Self { x, z }
    }

    /// Euclidean distance on the plane.
    pub fn distance_to(&self, other: &Self) -> f64 {
        (self.x - other.x).hypot(self.z - other.z)
    }

    /// Whether both axes differ by at most `tolerance` (inclusive box test).
    pub fn within_box(&self, other: &Self, tolerance: f64) -> bool {
        (self.x - other.x).abs() <= tolerance && (self.z - other.z).abs() <= tolerance
    }
}

/// Regular expressions selecting Enter and Exit lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventMarkers {
    /// Pattern marking an Enter line.
    pub enter: String,
    /// Pattern marking an Exit line.
    pub exit: String,
}

impl Default for EventMarkers {
    fn default() -> Self {
        Self {
            enter: DEFAULT_ENTER_MARKER.to_owned(),
            exit: DEFAULT_EXIT_MARKER.to_owned(),
        }
    }
}

/// Tokens extracted from a single raw line.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LineTokens<'a> {
    /// Seconds since local midnight, when the line is a timed record.
    pub seconds_of_day: Option<u32>,
    /// Actor identifier.
    pub actor_id: Option<&'a str>,
    /// Actor display name.
    pub alias: Option<&'a str>,
    /// Planar position.
    pub position: Option<PlanarPosition>,
    /// Enter/Exit classification.
    pub kind: Option<EventKind>,
}

/// Compiled line grammar.
#[derive(Debug, Clone)]
pub struct LineTokenizer {
    time: Regex,
    actor_id: Regex,
    alias: Regex,
    position_marker: Regex,
    position_braced: Regex,
    enter: Regex,
    exit: Regex,
}

impl LineTokenizer {
    /// Compile the grammar with the given event markers.
    pub fn new(markers: &EventMarkers) -> Result<Self, LogError> {
        let triple = format!(r"<\s*(?P<x>{NUMBER})\s*,\s*(?P<y>{NUMBER})\s*,\s*(?P<z>{NUMBER})\s*>");
        Ok(Self {
            time: Regex::new(TIME_PATTERN)?,
            actor_id: Regex::new(ACTOR_ID_PATTERN)?,
            alias: Regex::new(ALIAS_PATTERN)?,
            position_marker: Regex::new(&format!(r"pos=\s*{triple}"))?,
            position_braced: Regex::new(&format!(r"\{{\s*{triple}\s*\}}"))?,
            enter: Regex::new(&markers.enter)?,
            exit: Regex::new(&markers.exit)?,
        })
    }

    /// Tokenizer with the default stash markers.
    pub fn with_default_markers() -> Result<Self, LogError> {
        Self::new(&EventMarkers::default())
    }

    /// Extract every token the line carries.
    pub fn tokenize<'a>(&self, line: &'a str) -> LineTokens<'a> {
        LineTokens {
            seconds_of_day: self.seconds_of_day(line),
            actor_id: self.actor_id(line),
            alias: self.alias(line),
            position: self.position(line),
            kind: self.event_kind(line),
        }
    }

    /// Leading `HH:MM:SS |` time token as seconds since midnight.
    pub fn seconds_of_day(&self, line: &str) -> Option<u32> {
        let caps = self.time.captures(line)?;
        let hour: u32 = caps.name("hour")?.as_str().parse().ok()?;
        let minute: u32 = caps.name("minute")?.as_str().parse().ok()?;
        let second: u32 = caps.name("second")?.as_str().parse().ok()?;
        if hour > 23 || minute > 59 || second > 59 {
            return None;
        }
        hour.checked_mul(3600)?
            .checked_add(minute.checked_mul(60)?)?
            .checked_add(second)
    }

    /// Actor id from the parenthesized `id=` marker.
    pub fn actor_id<'a>(&self, line: &'a str) -> Option<&'a str> {
        self.actor_id
            .captures(line)
            .and_then(|caps| caps.name("id"))
            .map(|m| m.as_str())
    }

    /// Display name from the quoted `Player "..."` marker.
    pub fn alias<'a>(&self, line: &'a str) -> Option<&'a str> {
        self.alias
            .captures(line)
            .and_then(|caps| caps.name("alias"))
            .map(|m| m.as_str())
            .filter(|alias| !alias.is_empty())
    }

    /// Planar position from `pos=<x, y, z>` or `{ <x, y, z> }`.
    pub fn position(&self, line: &str) -> Option<PlanarPosition> {
        let caps = self
            .position_marker
            .captures(line)
            .or_else(|| self.position_braced.captures(line))?;
        let x: f64 = caps.name("x")?.as_str().parse().ok()?;
        let z: f64 = caps.name("z")?.as_str().parse().ok()?;
        Some(PlanarPosition::new(x, z))
    }

    /// Enter/Exit classification; Enter wins if a line matches both.
    pub fn event_kind(&self, line: &str) -> Option<EventKind> {
        if self.enter.is_match(line) {
            Some(EventKind::Enter)
        } else if self.exit.is_match(line) {
            Some(EventKind::Exit)
        } else {
            None
        }
    }
}
