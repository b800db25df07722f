//! Query time ranges
//!
//! Batches carry a `{from, to}` range. Each bound is epoch milliseconds (as a
//! number or numeric string), an RFC 3339 timestamp, `now`, or `now-<N><unit>`
//! with unit one of `s`, `m`, `h`, `d`, `w`.

#![warn(clippy::all, rust_2018_idioms)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimeRangeError {
    #[error("invalid time value '{0}'")]
    InvalidValue(String),
    #[error("invalid relative time '{0}': expected now-<N><s|m|h|d|w>")]
    InvalidRelative(String),
}

/// One bound of a time range as supplied by the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimeValue {
    EpochMillis(i64),
    Text(String),
}

impl TimeValue {
    pub fn resolve(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>, TimeRangeError> {
        match self {
            TimeValue::EpochMillis(ms) => from_epoch_millis(*ms, &ms.to_string()),
            TimeValue::Text(text) => parse_text(text.trim(), now),
        }
    }
}

impl From<&str> for TimeValue {
    fn from(value: &str) -> Self {
        TimeValue::Text(value.to_string())
    }
}

impl From<i64> for TimeValue {
    fn from(value: i64) -> Self {
        TimeValue::EpochMillis(value)
    }
}

/// Caller-supplied search window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub from: TimeValue,
    pub to: TimeValue,
}

impl TimeRange {
    pub fn new(from: impl Into<TimeValue>, to: impl Into<TimeValue>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Resolve both bounds against a single `now` so relative bounds agree
    pub fn resolve(&self, now: DateTime<Utc>) -> Result<ResolvedTimeRange, TimeRangeError> {
        Ok(ResolvedTimeRange {
            start: self.from.resolve(now)?,
            end: self.to.resolve(now)?,
        })
    }
}

/// Absolute search window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedTimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ResolvedTimeRange {
    pub fn is_ordered(&self) -> bool {
        self.start < self.end
    }
}

fn from_epoch_millis(ms: i64, original: &str) -> Result<DateTime<Utc>, TimeRangeError> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .ok_or_else(|| TimeRangeError::InvalidValue(original.to_string()))
}

fn parse_text(text: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>, TimeRangeError> {
    if text == "now" {
        return Ok(now);
    }

    if let Some(offset) = text.strip_prefix("now-") {
        return parse_offset(offset)
            .and_then(|d| now.checked_sub_signed(d))
            .ok_or_else(|| TimeRangeError::InvalidRelative(text.to_string()));
    }

    if let Ok(ms) = text.parse::<i64>() {
        return from_epoch_millis(ms, text);
    }

    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| TimeRangeError::InvalidValue(text.to_string()))
}

fn parse_offset(offset: &str) -> Option<Duration> {
    let unit = offset.chars().last()?;
    let amount: i64 = offset[..offset.len() - unit.len_utf8()].parse().ok()?;
    if amount < 0 {
        return None;
    }

    match unit {
        's' => Duration::try_seconds(amount),
        'm' => Duration::try_minutes(amount),
        'h' => Duration::try_hours(amount),
        'd' => Duration::try_days(amount),
        'w' => Duration::try_weeks(amount),
        _ => None,
    }
}
