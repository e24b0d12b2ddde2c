//! Business-time arithmetic over a configurable work calendar.
//!
//! Every duration in the report is measured in *business time*: only the part
//! of an interval that falls inside a working day's hour window counts.
//!
//! ## Conventions
//!
//! - Daily windows are half-open, `[day_start, day_end)`. A range that ends
//!   exactly at `day_start` contributes nothing for that day.
//! - Instants must carry a UTC offset. They are converted to the calendar's
//!   timezone before being intersected with the daily windows.
//! - A reversed range is an error, never a negative or zero duration.
//! - The measure is additive: `elapsed(a, b) + elapsed(b, c) == elapsed(a, c)`
//!   for any `a <= b <= c`, at one-second resolution.
//!
//! ## Usage
//!
//! ```rust
//! use chrono::NaiveDate;
//! use jira_kpi::libs::business_time::WorkCalendar;
//!
//! let calendar = WorkCalendar::default();
//! let monday = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
//! let start = monday.and_hms_opt(9, 0, 0).unwrap();
//! let end = monday.succ_opt().unwrap().and_hms_opt(9, 0, 0).unwrap();
//! assert_eq!(calendar.elapsed_local(start, end).unwrap().num_hours(), 10);
//! ```

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

/// Timestamp layout used by the Jira REST API (`2018-07-23T12:42:06.058+0000`).
const TRACKER_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f%z";

#[derive(Debug, Error, Clone, PartialEq)]
pub enum BusinessTimeError {
    #[error("invalid time range: start {start} is after end {end}")]
    InvalidRange { start: String, end: String },

    #[error("invalid timestamp '{0}': expected an instant with an explicit UTC offset")]
    InvalidInput(String),

    #[error("invalid work calendar: {0}")]
    InvalidCalendar(String),
}

/// Validated work calendar: working weekdays, a daily hour window and the
/// reference timezone all instants are normalized to.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkCalendar {
    working_days: BTreeSet<u32>,
    day_start: NaiveTime,
    day_end: NaiveTime,
    timezone: Tz,
}

impl Default for WorkCalendar {
    /// Monday to Friday, 08:00 to 18:00, UTC.
    fn default() -> Self {
        Self {
            working_days: default_working_days().iter().map(Weekday::num_days_from_monday).collect(),
            day_start: default_day_start(),
            day_end: default_day_end(),
            timezone: Tz::UTC,
        }
    }
}

impl WorkCalendar {
    pub fn new(
        working_days: impl IntoIterator<Item = Weekday>,
        day_start: NaiveTime,
        day_end: NaiveTime,
        timezone: Tz,
    ) -> Result<Self, BusinessTimeError> {
        if day_end <= day_start {
            return Err(BusinessTimeError::InvalidCalendar(format!(
                "day end {} must be later than day start {}",
                day_end.format("%H:%M"),
                day_start.format("%H:%M")
            )));
        }

        let working_days: BTreeSet<u32> = working_days.into_iter().map(|d| d.num_days_from_monday()).collect();
        if working_days.is_empty() {
            return Err(BusinessTimeError::InvalidCalendar("no working days configured".to_string()));
        }

        Ok(Self {
            working_days,
            day_start,
            day_end,
            timezone,
        })
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Length of one full working day.
    pub fn daily_window(&self) -> Duration {
        self.day_end - self.day_start
    }

    pub fn is_working_day(&self, date: NaiveDate) -> bool {
        self.working_days.contains(&date.weekday().num_days_from_monday())
    }

    /// Wall-clock time of `instant` in the calendar's timezone.
    pub fn local<Z: TimeZone>(&self, instant: &DateTime<Z>) -> NaiveDateTime {
        instant.with_timezone(&self.timezone).naive_local()
    }

    /// ISO week number of `instant` in the calendar's timezone.
    pub fn week_of<Z: TimeZone>(&self, instant: &DateTime<Z>) -> u32 {
        self.local(instant).iso_week().week()
    }

    /// Business time between two offset-aware instants.
    pub fn elapsed(&self, start: &DateTime<FixedOffset>, end: &DateTime<FixedOffset>) -> Result<Duration, BusinessTimeError> {
        if start > end {
            return Err(BusinessTimeError::InvalidRange {
                start: start.to_rfc3339(),
                end: end.to_rfc3339(),
            });
        }

        let start = self.local(start);
        // A DST fold can move the local end before the local start.
        let end = self.local(end).max(start);
        self.elapsed_local(start, end)
    }

    /// Business time between two wall-clock times already expressed in the
    /// calendar's timezone.
    pub fn elapsed_local(&self, start: NaiveDateTime, end: NaiveDateTime) -> Result<Duration, BusinessTimeError> {
        if start > end {
            return Err(BusinessTimeError::InvalidRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }

        let mut total = Duration::zero();
        let mut day = start.date();
        let last_day = end.date();

        while day <= last_day {
            if self.is_working_day(day) {
                let from = day.and_time(self.day_start).max(start);
                let to = day.and_time(self.day_end).min(end);
                if to > from {
                    total += to - from;
                }
            }

            day = match day.succ_opt() {
                Some(next) => next,
                None => break,
            };
        }

        Ok(total)
    }
}

/// Serializable form of [`WorkCalendar`] as stored in the configuration file.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CalendarConfig {
    #[serde(default = "default_working_days")]
    pub working_days: Vec<Weekday>,

    /// Start of the daily window, `HH:MM`.
    #[serde(default = "default_day_start", with = "hhmm")]
    pub day_start: NaiveTime,

    /// End of the daily window, `HH:MM`.
    #[serde(default = "default_day_end", with = "hhmm")]
    pub day_end: NaiveTime,

    /// IANA timezone name, e.g. `Europe/Berlin`.
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            working_days: default_working_days(),
            day_start: default_day_start(),
            day_end: default_day_end(),
            timezone: default_timezone(),
        }
    }
}

impl CalendarConfig {
    pub fn build(&self) -> Result<WorkCalendar, BusinessTimeError> {
        let timezone: Tz = self
            .timezone
            .parse()
            .map_err(|_| BusinessTimeError::InvalidCalendar(format!("unknown timezone '{}'", self.timezone)))?;
        WorkCalendar::new(self.working_days.iter().copied(), self.day_start, self.day_end, timezone)
    }
}

fn default_working_days() -> Vec<Weekday> {
    vec![Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu, Weekday::Fri]
}

fn default_day_start() -> NaiveTime {
    NaiveTime::from_hms_opt(8, 0, 0).unwrap_or(NaiveTime::MIN)
}

fn default_day_end() -> NaiveTime {
    NaiveTime::from_hms_opt(18, 0, 0).unwrap_or(NaiveTime::MIN)
}

fn default_timezone() -> String {
    "UTC".to_string()
}

/// Parses a tracker timestamp. Values without a UTC offset are rejected so
/// that naive and offset-aware instants can never be mixed.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<FixedOffset>, BusinessTimeError> {
    let raw = raw.trim();
    DateTime::parse_from_str(raw, TRACKER_TIMESTAMP_FORMAT)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .map_err(|_| BusinessTimeError::InvalidInput(raw.to_string()))
}

/// Fractional hours, the unit used in report cells.
pub fn hours(duration: Duration) -> f64 {
    duration.num_seconds() as f64 / 3600.0
}

mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&raw, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(&raw, "%H:%M:%S"))
            .map_err(serde::de::Error::custom)
    }
}
