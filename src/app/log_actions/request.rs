//! Batch request and response types
//!
//! A batch is a list of `{refId, subtype, ...parameters}` requests sharing
//! one time range. The response maps every refId to its frames or its error.

#![warn(clippy::all, rust_2018_idioms)]

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::app::data_plane::cloudwatch_logs::{Frame, TimeRange};

use super::error::LogActionError;

/// Actions a request can name in its `subtype` tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogAction {
    DescribeLogGroups,
    GetLogGroupFields,
    StartQuery,
    StopQuery,
    GetQueryResults,
}

impl LogAction {
    pub const ALL: [LogAction; 5] = [
        LogAction::DescribeLogGroups,
        LogAction::GetLogGroupFields,
        LogAction::StartQuery,
        LogAction::StopQuery,
        LogAction::GetQueryResults,
    ];

    pub fn parse(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|action| action.as_str() == tag)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogAction::DescribeLogGroups => "DescribeLogGroups",
            LogAction::GetLogGroupFields => "GetLogGroupFields",
            LogAction::StartQuery => "StartQuery",
            LogAction::StopQuery => "StopQuery",
            LogAction::GetQueryResults => "GetQueryResults",
        }
    }
}

impl fmt::Display for LogAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single tagged request within a batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogActionRequest {
    pub ref_id: String,
    /// Action tag; kept as text so unknown tags reach the dispatcher
    #[serde(alias = "action")]
    pub subtype: String,
    /// Action-specific parameters
    #[serde(flatten)]
    pub parameters: serde_json::Map<String, serde_json::Value>,
}

impl LogActionRequest {
    pub fn new(ref_id: impl Into<String>, subtype: impl Into<String>) -> Self {
        Self {
            ref_id: ref_id.into(),
            subtype: subtype.into(),
            parameters: serde_json::Map::new(),
        }
    }

    pub fn with_param(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.parameters.insert(key.to_string(), value.into());
        self
    }

    /// Decode the parameters for `action` into their typed form
    pub fn params<T: DeserializeOwned>(&self, action: LogAction) -> Result<T, LogActionError> {
        serde_json::from_value(serde_json::Value::Object(self.parameters.clone()))
            .map_err(|e| LogActionError::invalid_parameter(action, e.to_string()))
    }
}

/// Requests sharing one time range
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogActionBatch {
    /// Search window for StartQuery requests
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<TimeRange>,
    pub queries: Vec<LogActionRequest>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DescribeLogGroupsParams {
    #[serde(default)]
    pub log_group_name_prefix: Option<String>,
    #[serde(default)]
    pub limit: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetLogGroupFieldsParams {
    pub log_group_name: String,
    /// Sample time in epoch seconds
    #[serde(default)]
    pub time: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartQueryParams {
    pub log_group_names: Vec<String>,
    #[serde(default)]
    pub query_string: Option<String>,
    #[serde(default)]
    pub limit: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryIdParams {
    pub query_id: String,
}

/// Outcome for a single refId: its frames, or the error that replaced them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    pub ref_id: String,
    pub frames: Vec<Frame>,
    pub error: Option<String>,
}

impl QueryResult {
    pub fn from_outcome(ref_id: String, outcome: Result<Frame, LogActionError>) -> Self {
        match outcome {
            Ok(frame) => Self {
                ref_id,
                frames: vec![frame],
                error: None,
            },
            Err(e) => Self {
                ref_id,
                frames: Vec::new(),
                error: Some(e.to_string()),
            },
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn frame(&self) -> Option<&Frame> {
        self.frames.first()
    }
}

/// Results keyed by refId
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchResponse {
    pub results: BTreeMap<String, QueryResult>,
}

impl BatchResponse {
    pub fn get(&self, ref_id: &str) -> Option<&QueryResult> {
        self.results.get(ref_id)
    }

    /// First failing refId and its message, for callers that treat the
    /// batch as all-or-nothing
    pub fn first_error(&self) -> Option<(&str, &str)> {
        self.results
            .values()
            .find_map(|r| r.error.as_deref().map(|e| (r.ref_id.as_str(), e)))
    }
}
