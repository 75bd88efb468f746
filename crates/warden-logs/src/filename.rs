//! Start-instant inference from log file names.
//!
//! The server names each admin log after the moment it was opened, e.g.
//! `DayZServer_x64_2024-05-01_10-00-00.ADM`. Some archives carry only the
//! date. Files whose names match neither shape are skipped by the caller.

use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use regex::{Captures, Regex};

use crate::clock::local_to_instant;
use crate::error::LogError;

const DATE_TIME_PATTERN: &str = r"(?P<year>\d{4})[-_.](?P<month>\d{2})[-_.](?P<day>\d{2})[-_.T ](?P<hour>\d{2})[-_.:](?P<minute>\d{2})[-_.:](?P<second>\d{2})";
const DATE_PATTERN: &str = r"(?P<year>\d{4})[-_.](?P<month>\d{2})[-_.](?P<day>\d{2})";

/// Compiled filename grammar.
#[derive(Debug, Clone)]
pub struct FilenameDates {
    date_time: Regex,
    date: Regex,
}

impl FilenameDates {
    /// Compile the filename patterns.
    pub fn new() -> Result<Self, LogError> {
        Ok(Self {
            date_time: Regex::new(DATE_TIME_PATTERN)?,
            date: Regex::new(DATE_PATTERN)?,
        })
    }

    /// Infer the absolute start instant encoded in `path`'s file name.
    ///
    /// A full date-time match wins over a date-only match; date-only
    /// names start at local midnight. Returns `None` when nothing usable
    /// is found.
    pub fn infer(&self, path: &Path) -> Option<DateTime<Utc>> {
        let name = path.file_name()?.to_string_lossy();

        self.date_time
            .captures(&name)
            .and_then(|caps| {
                let date = capture_date(&caps)?;
                date.and_hms_opt(
                    capture_u32(&caps, "hour")?,
                    capture_u32(&caps, "minute")?,
                    capture_u32(&caps, "second")?,
                )
            })
            .or_else(|| {
                let caps = self.date.captures(&name)?;
                capture_date(&caps)?.and_hms_opt(0, 0, 0)
            })
            .and_then(local_to_instant)
    }
}

fn capture_u32(caps: &Captures<'_>, name: &str) -> Option<u32> {
    caps.name(name)?.as_str().parse().ok()
}

fn capture_date(caps: &Captures<'_>) -> Option<NaiveDate> {
    let year: i32 = caps.name("year")?.as_str().parse().ok()?;
    NaiveDate::from_ymd_opt(year, capture_u32(caps, "month")?, capture_u32(caps, "day")?)
}
