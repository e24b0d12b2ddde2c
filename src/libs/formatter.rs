//! Cell formatting for report rows.
//!
//! Every report cell is a string. These helpers fix how durations,
//! timestamps and numbers are rendered so that CSV, JSON, Excel and the
//! terminal preview all show the same values.
//!
//! ## Examples
//!
//! ```rust
//! use jira_kpi::libs::formatter::{format_hours, format_story_points};
//! use chrono::Duration;
//!
//! assert_eq!(format_hours(&(Duration::hours(10) + Duration::minutes(15))), "10.25");
//! assert_eq!(format_story_points(Some(3.0)), "3");
//! assert_eq!(format_story_points(Some(0.5)), "0.5");
//! assert_eq!(format_story_points(None), "");
//! ```

use super::business_time::{hours, WorkCalendar};
use chrono::{DateTime, Duration, FixedOffset};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Business hours with two decimals. Negative durations render as zero.
pub fn format_hours(duration: &Duration) -> String {
    format!("{:.2}", hours(*duration).max(0.0))
}

/// Renders `instant` as wall-clock time in the calendar's timezone.
pub fn format_timestamp(calendar: &WorkCalendar, instant: &DateTime<FixedOffset>) -> String {
    calendar.local(instant).format(TIMESTAMP_FORMAT).to_string()
}

/// Whole numbers lose their fraction; missing values render empty.
pub fn format_story_points(points: Option<f64>) -> String {
    match points {
        Some(p) if p.fract() == 0.0 => format!("{}", p as i64),
        Some(p) => p.to_string(),
        None => String::new(),
    }
}

/// Flattens free text into one cell: carriage returns, newlines and commas
/// are dropped.
pub fn flatten_text(text: &str) -> String {
    text.chars().filter(|c| !matches!(c, '\r' | '\n' | ',')).collect()
}
