//! Calendar bucketing utilities
//!
//! - Day buckets: "YYYY-MM-DD", always in the student's local calendar
//! - History buckets: day, ISO week (Monday start) or month

use chrono::{DateTime, Datelike, Duration, NaiveDate, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Format a calendar day as a bucket string ("YYYY-MM-DD").
pub fn day_bucket(day: NaiveDate) -> String {
    format!("{:04}-{:02}-{:02}", day.year(), day.month(), day.day())
}

/// Parse a day bucket string back into a date.
pub fn parse_day_bucket(bucket: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(bucket, "%Y-%m-%d").ok()
}

fn shifted(timestamp_ms: i64, utc_offset_minutes: i32) -> DateTime<Utc> {
    let dt = DateTime::from_timestamp_millis(timestamp_ms).unwrap_or_default();
    dt + Duration::minutes(utc_offset_minutes as i64)
}

/// Calendar day of a Unix timestamp (ms) for someone at the given UTC offset.
pub fn local_day(timestamp_ms: i64, utc_offset_minutes: i32) -> NaiveDate {
    shifted(timestamp_ms, utc_offset_minutes).date_naive()
}

/// Hour of day (0-23) of a Unix timestamp (ms) at the given UTC offset.
pub fn local_hour(timestamp_ms: i64, utc_offset_minutes: i32) -> u32 {
    shifted(timestamp_ms, utc_offset_minutes).hour()
}

/// Granularity of XP history charts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryBucket {
    #[default]
    Day,
    Week,
    Month,
}

impl HistoryBucket {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "day" => Some(Self::Day),
            "week" => Some(Self::Week),
            "month" => Some(Self::Month),
            _ => None,
        }
    }

    /// First day of the bucket containing `day`
    pub fn start_of(&self, day: NaiveDate) -> NaiveDate {
        match self {
            Self::Day => day,
            Self::Week => day - Duration::days(day.weekday().num_days_from_monday() as i64),
            Self::Month => day.with_day(1).unwrap_or(day),
        }
    }
}

/// First day of the trailing window of `days` days ending on `today`.
pub fn window_start(today: NaiveDate, days: u32) -> NaiveDate {
    today - Duration::days(days.saturating_sub(1) as i64)
}
