//! CloudWatch Logs Insights Data Types
//!
//! Data structures exchanged with the log store: discovered log groups and
//! fields, query submissions, job status and result pages.

#![warn(clippy::all, rust_2018_idioms)]

use serde::{Deserialize, Serialize};
use std::fmt;

/// A discovered log group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogGroup {
    pub name: String,
}

impl LogGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Field statistics for a log group at one sample time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Field name, e.g. `@message`
    pub name: String,
    /// Share of sampled records containing the field (0-100)
    pub percent: i64,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, percent: i64) -> Self {
        Self {
            name: name.into(),
            percent,
        }
    }
}

/// Parameters for submitting a new Insights query job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartQueryInput {
    pub log_group_names: Vec<String>,
    /// Full query text as sent to the service
    pub query_string: String,
    /// Start of the search window (Unix seconds)
    pub start_time: i64,
    /// End of the search window (Unix seconds)
    pub end_time: i64,
    pub limit: i32,
}

/// Status of a query job as reported by the log store.
///
/// Unrecognized status strings map to [`QueryStatus::Unknown`] so new
/// upstream states never break a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QueryStatus {
    Scheduled,
    Running,
    Complete,
    Failed,
    Cancelled,
    Timeout,
    Unknown,
}

impl QueryStatus {
    /// Map the remote status string onto the local state machine
    pub fn from_remote(status: &str) -> Self {
        match status {
            "Scheduled" => Self::Scheduled,
            "Running" => Self::Running,
            "Complete" => Self::Complete,
            "Failed" => Self::Failed,
            "Cancelled" => Self::Cancelled,
            "Timeout" => Self::Timeout,
            _ => Self::Unknown,
        }
    }

    /// Terminal states never change again; polling can stop
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Complete | Self::Failed | Self::Cancelled | Self::Timeout
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "Scheduled",
            Self::Running => "Running",
            Self::Complete => "Complete",
            Self::Failed => "Failed",
            Self::Cancelled => "Cancelled",
            Self::Timeout => "Timeout",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for QueryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Statistics about a Logs Insights query.
///
/// Each value is only present once the job reports it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryStatistics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes_scanned: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records_matched: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records_scanned: Option<f64>,
}

impl QueryStatistics {
    pub fn new(bytes_scanned: f64, records_matched: f64, records_scanned: f64) -> Self {
        Self {
            bytes_scanned: Some(bytes_scanned),
            records_matched: Some(records_matched),
            records_scanned: Some(records_scanned),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bytes_scanned.is_none()
            && self.records_matched.is_none()
            && self.records_scanned.is_none()
    }
}

/// One `field = value` pair of a result record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultField {
    pub field: Option<String>,
    pub value: Option<String>,
}

impl ResultField {
    pub fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            value: Some(value.into()),
        }
    }
}

/// One retrieved log record; field sets differ from row to row
pub type ResultRow = Vec<ResultField>;

/// Snapshot of a query job returned by a single results fetch
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResultsPage {
    pub rows: Vec<ResultRow>,
    pub statistics: Option<QueryStatistics>,
    pub status: QueryStatus,
}
