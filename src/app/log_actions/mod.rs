//! Log Actions Dispatcher
//!
//! Routes each request of a batch, by its `subtype` tag, to the query
//! lifecycle or to metadata discovery, and collects the outcome per refId.
//!
//! ## Failure isolation
//!
//! Each refId carries either its frame or its own error. One failing
//! request never discards the results of the others; callers that want the
//! whole batch to fail can use [`BatchResponse::first_error`]. Unknown
//! action tags are reported as [`LogActionError::UnrecognizedAction`].
//!
//! ## Concurrency
//!
//! Requests are independent and run concurrently, bounded by
//! `max_concurrency`. All of them are joined before the response is built.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use logsdash::app::data_plane::cloudwatch_logs::FakeLogsClient;
//! use logsdash::app::log_actions::{LogActionBatch, LogActionExecutor, LogActionRequest};
//!
//! # async fn example() {
//! let executor = LogActionExecutor::new(Arc::new(FakeLogsClient::new()));
//! let batch = LogActionBatch {
//!     range: None,
//!     queries: vec![LogActionRequest::new("A", "DescribeLogGroups")],
//! };
//! let response = executor.execute_batch(batch).await;
//! assert!(response.get("A").unwrap().error.is_none());
//! # }
//! ```

#![warn(clippy::all, rust_2018_idioms)]

pub mod discovery;
pub mod error;
pub mod lifecycle;
pub mod request;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use std::sync::Arc;

use crate::app::config::QueryConfig;
use crate::app::data_plane::cloudwatch_logs::{
    Frame, LogStoreClient, ResolvedTimeRange, TimeRangeError,
};

pub use error::LogActionError;
pub use lifecycle::{QueryLifecycle, DEFAULT_QUERY_LIMIT, TIMESTAMP_QUERY_PREFIX};
pub use request::{
    BatchResponse, DescribeLogGroupsParams, GetLogGroupFieldsParams, LogAction, LogActionBatch,
    LogActionRequest, QueryIdParams, QueryResult, StartQueryParams,
};

/// Time range of a batch after resolution against the batch start time
type BatchRange = Result<Option<ResolvedTimeRange>, TimeRangeError>;

/// Executes batches of log actions against a log store
#[derive(Clone)]
pub struct LogActionExecutor {
    client: Arc<dyn LogStoreClient>,
    lifecycle: QueryLifecycle,
    settings: QueryConfig,
}

impl LogActionExecutor {
    pub fn new(client: Arc<dyn LogStoreClient>) -> Self {
        Self::with_settings(client, QueryConfig::default())
    }

    pub fn with_settings(client: Arc<dyn LogStoreClient>, settings: QueryConfig) -> Self {
        let lifecycle = QueryLifecycle::new(client.clone()).with_default_limit(settings.default_limit);
        Self {
            client,
            lifecycle,
            settings,
        }
    }

    /// Run every request of the batch and map each refId to its outcome.
    ///
    /// A refId used twice keeps the outcome of its last request.
    pub async fn execute_batch(&self, batch: LogActionBatch) -> BatchResponse {
        let LogActionBatch { range, queries } = batch;
        let range: BatchRange = range.map(|r| r.resolve(Utc::now())).transpose();

        log_info!(
            "Executing log action batch: {} requests (concurrency {})",
            queries.len(),
            self.settings.max_concurrency
        );

        let range = &range;
        let outcomes: Vec<QueryResult> = stream::iter(queries)
            .map(move |request| async move {
                let outcome = self.execute_action(&request, range).await;
                if let Err(e) = &outcome {
                    log_warn!(
                        "Log action {} for refId {} failed: {}",
                        request.subtype,
                        request.ref_id,
                        e
                    );
                }
                QueryResult::from_outcome(request.ref_id, outcome)
            })
            .buffered(self.settings.max_concurrency.max(1))
            .collect()
            .await;

        let mut response = BatchResponse::default();
        for result in outcomes {
            if response.results.contains_key(&result.ref_id) {
                trace_warn!(
                    "Duplicate refId {} in batch; keeping the later result",
                    result.ref_id
                );
            }
            response.results.insert(result.ref_id.clone(), result);
        }

        response
    }

    /// Route one request to its handler
    pub async fn execute_action(
        &self,
        request: &LogActionRequest,
        range: &BatchRange,
    ) -> Result<Frame, LogActionError> {
        let action = LogAction::parse(&request.subtype)
            .ok_or_else(|| LogActionError::UnrecognizedAction(request.subtype.clone()))?;

        trace_info!("Dispatching {} for refId {}", action, request.ref_id);

        match action {
            LogAction::DescribeLogGroups => {
                let params: DescribeLogGroupsParams = request.params(action)?;
                discovery::describe_log_groups(
                    self.client.as_ref(),
                    &params,
                    self.settings.describe_limit,
                )
                .await
            }
            LogAction::GetLogGroupFields => {
                let params: GetLogGroupFieldsParams = request.params(action)?;
                discovery::get_log_group_fields(self.client.as_ref(), &request.ref_id, &params)
                    .await
            }
            LogAction::StartQuery => {
                let params: StartQueryParams = request.params(action)?;
                let range = match range {
                    Ok(Some(range)) => range,
                    Ok(None) => {
                        return Err(LogActionError::invalid_parameter(
                            action,
                            "batch has no time range",
                        ))
                    }
                    Err(e) => return Err(LogActionError::invalid_parameter(action, e.to_string())),
                };
                self.lifecycle
                    .start_query(&request.ref_id, &params, range)
                    .await
            }
            LogAction::StopQuery => {
                let params: QueryIdParams = request.params(action)?;
                self.lifecycle.stop_query(&params.query_id).await
            }
            LogAction::GetQueryResults => {
                let params: QueryIdParams = request.params(action)?;
                self.lifecycle
                    .get_query_results(&request.ref_id, &params.query_id)
                    .await
            }
        }
    }
}
