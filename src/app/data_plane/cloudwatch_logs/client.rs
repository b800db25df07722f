//! CloudWatch Logs Client Wrapper
//!
//! [`LogStoreClient`] is the narrow seam the query lifecycle talks to: five
//! remote operations and nothing else. [`CloudWatchLogsClient`] implements it
//! on top of the AWS SDK; tests substitute
//! [`FakeLogsClient`](super::fake_client::FakeLogsClient).

#![warn(clippy::all, rust_2018_idioms)]

use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_cloudwatchlogs as cloudwatchlogs;
use aws_sdk_cloudwatchlogs::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_types::region::Region;
use std::time::Duration;

use crate::app::config::LogsConfig;

use super::errors::LogStoreError;
use super::types::{
    FieldDescriptor, LogGroup, QueryResultsPage, QueryStatistics, QueryStatus, ResultField,
    StartQueryInput,
};

/// Remote operations offered by the log store.
///
/// Implementations must be safe to share across concurrently running
/// handlers.
#[async_trait]
pub trait LogStoreClient: Send + Sync {
    async fn describe_log_groups(
        &self,
        name_prefix: Option<&str>,
        limit: i32,
    ) -> Result<Vec<LogGroup>, LogStoreError>;

    /// `time` is the sample time in epoch seconds; `None` means now
    async fn get_log_group_fields(
        &self,
        log_group_name: &str,
        time: Option<i64>,
    ) -> Result<Vec<FieldDescriptor>, LogStoreError>;

    /// Submit a query job and return its id
    async fn start_query(&self, input: &StartQueryInput) -> Result<String, LogStoreError>;

    async fn stop_query(&self, query_id: &str) -> Result<bool, LogStoreError>;

    /// Fetch the current result snapshot of a job
    async fn get_query_results(&self, query_id: &str) -> Result<QueryResultsPage, LogStoreError>;
}

/// CloudWatch Logs client wrapper
#[derive(Clone, Debug)]
pub struct CloudWatchLogsClient {
    client: cloudwatchlogs::Client,
}

impl CloudWatchLogsClient {
    /// Wrap an already configured SDK client
    pub fn new(client: cloudwatchlogs::Client) -> Self {
        Self { client }
    }

    /// Create a client from the SDK default credential chain, narrowed by
    /// the configured profile, region and per-operation timeout
    pub async fn from_config(config: &LogsConfig) -> Result<Self> {
        let timeout_config = aws_config::timeout::TimeoutConfig::builder()
            .operation_timeout(Duration::from_secs(config.queries.operation_timeout_secs))
            .build();

        let mut loader =
            aws_config::defaults(BehaviorVersion::latest()).timeout_config(timeout_config);

        if let Some(profile) = &config.profile {
            loader = loader.profile_name(profile);
        }

        if let Some(region) = &config.region {
            loader = loader.region(Region::new(region.clone()));
        }

        let aws_config = loader.load().await;
        let region = aws_config
            .region()
            .map(|r| r.to_string())
            .context("No AWS region configured; set `region` in the config file or AWS_REGION")?;

        log_info!(
            "CloudWatch Logs client ready (region: {}, profile: {:?})",
            region,
            config.profile
        );

        Ok(Self::new(cloudwatchlogs::Client::new(&aws_config)))
    }
}

/// Reduce an SDK failure to its error code and underlying message
fn to_log_store_error<E, R>(operation: &str, err: SdkError<E, R>) -> LogStoreError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    let code = err.code().map(str::to_string);
    let message = err
        .message()
        .map(str::to_string)
        .unwrap_or_else(|| DisplayErrorContext(&err).to_string());

    let error = LogStoreError { code, message };
    if error.is_throttling() {
        log_warn!("{} throttled by CloudWatch Logs: {}", operation, error);
    } else {
        trace_debug!("{} failed: {:?}", operation, error);
    }
    error
}

#[async_trait]
impl LogStoreClient for CloudWatchLogsClient {
    async fn describe_log_groups(
        &self,
        name_prefix: Option<&str>,
        limit: i32,
    ) -> Result<Vec<LogGroup>, LogStoreError> {
        let response = self
            .client
            .describe_log_groups()
            .set_log_group_name_prefix(name_prefix.map(str::to_string))
            .limit(limit)
            .send()
            .await
            .map_err(|e| to_log_store_error("DescribeLogGroups", e))?;

        Ok(response
            .log_groups()
            .iter()
            .filter_map(|group| group.log_group_name())
            .map(LogGroup::new)
            .collect())
    }

    async fn get_log_group_fields(
        &self,
        log_group_name: &str,
        time: Option<i64>,
    ) -> Result<Vec<FieldDescriptor>, LogStoreError> {
        let response = self
            .client
            .get_log_group_fields()
            .log_group_name(log_group_name)
            .set_time(time)
            .send()
            .await
            .map_err(|e| to_log_store_error("GetLogGroupFields", e))?;

        Ok(response
            .log_group_fields()
            .iter()
            .filter_map(|field| {
                field
                    .name()
                    .map(|name| FieldDescriptor::new(name, i64::from(field.percent())))
            })
            .collect())
    }

    async fn start_query(&self, input: &StartQueryInput) -> Result<String, LogStoreError> {
        let response = self
            .client
            .start_query()
            .set_log_group_names(Some(input.log_group_names.clone()))
            .query_string(&input.query_string)
            .start_time(input.start_time)
            .end_time(input.end_time)
            .limit(input.limit)
            .send()
            .await
            .map_err(|e| to_log_store_error("StartQuery", e))?;

        response
            .query_id()
            .map(str::to_string)
            .ok_or_else(|| LogStoreError {
                code: None,
                message: "StartQuery returned no query id".to_string(),
            })
    }

    async fn stop_query(&self, query_id: &str) -> Result<bool, LogStoreError> {
        let response = self
            .client
            .stop_query()
            .query_id(query_id)
            .send()
            .await
            .map_err(|e| to_log_store_error("StopQuery", e))?;

        Ok(response.success())
    }

    async fn get_query_results(&self, query_id: &str) -> Result<QueryResultsPage, LogStoreError> {
        let response = self
            .client
            .get_query_results()
            .query_id(query_id)
            .send()
            .await
            .map_err(|e| to_log_store_error("GetQueryResults", e))?;

        let rows = response
            .results()
            .iter()
            .map(|row| {
                row.iter()
                    .map(|f| ResultField {
                        field: f.field().map(str::to_string),
                        value: f.value().map(str::to_string),
                    })
                    .collect()
            })
            .collect();

        let statistics = response.statistics().map(|s| {
            QueryStatistics::new(s.bytes_scanned(), s.records_matched(), s.records_scanned())
        });

        let status = response
            .status()
            .map(|s| QueryStatus::from_remote(s.as_str()))
            .unwrap_or(QueryStatus::Unknown);

        Ok(QueryResultsPage {
            rows,
            statistics,
            status,
        })
    }
}
