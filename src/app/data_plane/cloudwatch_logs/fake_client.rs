//! Deterministic in-memory log store
//!
//! [`FakeLogsClient`] serves fixed fixtures for every [`LogStoreClient`]
//! operation and records each call, so lifecycle logic can be exercised
//! without network access. Any operation can be switched to fail.

#![warn(clippy::all, rust_2018_idioms)]

use async_trait::async_trait;
use std::sync::{Mutex, MutexGuard};

use super::client::LogStoreClient;
use super::errors::LogStoreError;
use super::types::{
    FieldDescriptor, LogGroup, QueryResultsPage, QueryStatistics, QueryStatus, ResultField,
    StartQueryInput,
};

/// A remote call observed by the fake
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCall {
    DescribeLogGroups {
        name_prefix: Option<String>,
        limit: i32,
    },
    GetLogGroupFields {
        log_group_name: String,
        time: Option<i64>,
    },
    StartQuery(StartQueryInput),
    StopQuery(String),
    GetQueryResults(String),
}

#[derive(Debug, Default)]
struct Failures {
    describe_log_groups: Option<LogStoreError>,
    get_log_group_fields: Option<LogStoreError>,
    start_query: Option<LogStoreError>,
    stop_query: Option<LogStoreError>,
    get_query_results: Option<LogStoreError>,
}

/// Fixture-driven [`LogStoreClient`] test double
#[derive(Debug)]
pub struct FakeLogsClient {
    log_groups: Vec<LogGroup>,
    fields: Vec<FieldDescriptor>,
    query_id: String,
    stop_success: bool,
    results: QueryResultsPage,
    failures: Mutex<Failures>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl Default for FakeLogsClient {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeLogsClient {
    /// Fake with the standard fixtures: three log groups, three fields and a
    /// completed two-row result
    pub fn new() -> Self {
        Self {
            log_groups: vec![
                LogGroup::new("group_a"),
                LogGroup::new("group_b"),
                LogGroup::new("group_c"),
            ],
            fields: vec![
                FieldDescriptor::new("field_a", 100),
                FieldDescriptor::new("field_b", 30),
                FieldDescriptor::new("field_c", 55),
            ],
            query_id: "abcd-efgh-ijkl-mnop".to_string(),
            stop_success: true,
            results: QueryResultsPage {
                rows: vec![
                    vec![
                        ResultField::new("@timestamp", "1584700643"),
                        ResultField::new("field_b", "b_1"),
                        ResultField::new("@ptr", "abcdefg"),
                    ],
                    vec![
                        ResultField::new("@timestamp", "1584700843"),
                        ResultField::new("field_b", "b_2"),
                        ResultField::new("@ptr", "hijklmnop"),
                    ],
                ],
                statistics: Some(QueryStatistics::new(512.0, 256.0, 1024.0)),
                status: QueryStatus::Complete,
            },
            failures: Mutex::new(Failures::default()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_log_groups<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.log_groups = names.into_iter().map(LogGroup::new).collect();
        self
    }

    pub fn with_fields(mut self, fields: Vec<FieldDescriptor>) -> Self {
        self.fields = fields;
        self
    }

    pub fn with_query_id(mut self, query_id: impl Into<String>) -> Self {
        self.query_id = query_id.into();
        self
    }

    pub fn with_stop_success(mut self, success: bool) -> Self {
        self.stop_success = success;
        self
    }

    pub fn with_results(mut self, results: QueryResultsPage) -> Self {
        self.results = results;
        self
    }

    pub fn fail_describe_log_groups(self, error: LogStoreError) -> Self {
        lock(&self.failures).describe_log_groups = Some(error);
        self
    }

    pub fn fail_get_log_group_fields(self, error: LogStoreError) -> Self {
        lock(&self.failures).get_log_group_fields = Some(error);
        self
    }

    pub fn fail_start_query(self, error: LogStoreError) -> Self {
        lock(&self.failures).start_query = Some(error);
        self
    }

    pub fn fail_stop_query(self, error: LogStoreError) -> Self {
        lock(&self.failures).stop_query = Some(error);
        self
    }

    pub fn fail_get_query_results(self, error: LogStoreError) -> Self {
        lock(&self.failures).get_query_results = Some(error);
        self
    }

    /// Every call received so far, in order
    pub fn calls(&self) -> Vec<RecordedCall> {
        lock(&self.calls).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    fn record(&self, call: RecordedCall) {
        lock(&self.calls).push(call);
    }

    fn failure(&self, pick: impl FnOnce(&Failures) -> &Option<LogStoreError>) -> Result<(), LogStoreError> {
        match pick(&lock(&self.failures)) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl LogStoreClient for FakeLogsClient {
    async fn describe_log_groups(
        &self,
        name_prefix: Option<&str>,
        limit: i32,
    ) -> Result<Vec<LogGroup>, LogStoreError> {
        self.record(RecordedCall::DescribeLogGroups {
            name_prefix: name_prefix.map(str::to_string),
            limit,
        });
        self.failure(|f| &f.describe_log_groups)?;

        Ok(self
            .log_groups
            .iter()
            .filter(|g| name_prefix.map_or(true, |p| g.name.starts_with(p)))
            .take(usize::try_from(limit).unwrap_or(0))
            .cloned()
            .collect())
    }

    async fn get_log_group_fields(
        &self,
        log_group_name: &str,
        time: Option<i64>,
    ) -> Result<Vec<FieldDescriptor>, LogStoreError> {
        self.record(RecordedCall::GetLogGroupFields {
            log_group_name: log_group_name.to_string(),
            time,
        });
        self.failure(|f| &f.get_log_group_fields)?;
        Ok(self.fields.clone())
    }

    async fn start_query(&self, input: &StartQueryInput) -> Result<String, LogStoreError> {
        self.record(RecordedCall::StartQuery(input.clone()));
        self.failure(|f| &f.start_query)?;
        Ok(self.query_id.clone())
    }

    async fn stop_query(&self, query_id: &str) -> Result<bool, LogStoreError> {
        self.record(RecordedCall::StopQuery(query_id.to_string()));
        self.failure(|f| &f.stop_query)?;
        Ok(self.stop_success)
    }

    async fn get_query_results(&self, query_id: &str) -> Result<QueryResultsPage, LogStoreError> {
        self.record(RecordedCall::GetQueryResults(query_id.to_string()));
        self.failure(|f| &f.get_query_results)?;
        Ok(self.results.clone())
    }
}
