//! Query lifecycle: start, poll, stop.
//!
//! The job's status lives in the log store. Nothing here caches it: every
//! results call is exactly one remote fetch returning whatever snapshot the
//! service holds (partial while Running). Callers poll at their own cadence
//! until [`QueryStatus::is_terminal`](crate::app::data_plane::cloudwatch_logs::QueryStatus::is_terminal).

#![warn(clippy::all, rust_2018_idioms)]

use std::sync::Arc;

use crate::app::data_plane::cloudwatch_logs::{
    rows_to_frame, Field, Frame, LogStoreClient, ResolvedTimeRange, StartQueryInput,
};

use super::error::LogActionError;
use super::request::{LogAction, StartQueryParams};

/// Prefix forced onto every query so results always carry `@timestamp`
pub const TIMESTAMP_QUERY_PREFIX: &str = "fields @timestamp | ";

pub const DEFAULT_QUERY_LIMIT: i32 = 1000;

/// Translates lifecycle requests into log store calls
#[derive(Clone)]
pub struct QueryLifecycle {
    client: Arc<dyn LogStoreClient>,
    default_limit: i32,
}

impl QueryLifecycle {
    pub fn new(client: Arc<dyn LogStoreClient>) -> Self {
        Self {
            client,
            default_limit: DEFAULT_QUERY_LIMIT,
        }
    }

    pub fn with_default_limit(mut self, limit: i32) -> Self {
        self.default_limit = limit;
        self
    }

    /// Submit a query job; the frame holds only the new job's id
    pub async fn start_query(
        &self,
        ref_id: &str,
        params: &StartQueryParams,
        range: &ResolvedTimeRange,
    ) -> Result<Frame, LogActionError> {
        if !range.is_ordered() {
            return Err(LogActionError::InvalidTimeRange);
        }

        if params.log_group_names.is_empty() {
            return Err(LogActionError::invalid_parameter(
                LogAction::StartQuery,
                "at least one log group name is required",
            ));
        }

        let input = StartQueryInput {
            log_group_names: params.log_group_names.clone(),
            query_string: format!(
                "{}{}",
                TIMESTAMP_QUERY_PREFIX,
                params.query_string.as_deref().unwrap_or("")
            ),
            start_time: range.start.timestamp(),
            end_time: range.end.timestamp(),
            limit: params.limit.unwrap_or(self.default_limit),
        };

        trace_debug!(
            "StartQuery [{}]: groups={:?}, window={}..{}, limit={}",
            ref_id,
            input.log_group_names,
            input.start_time,
            input.end_time,
            input.limit
        );

        let query_id = self.client.start_query(&input).await?;
        log_info!("Started query {} for refId {}", query_id, ref_id);

        Ok(Frame::try_new(ref_id, vec![Field::strings("queryId", [query_id])])?.with_ref_id(ref_id))
    }

    /// Stop a running job.
    ///
    /// A job that is no longer stoppable (already finished) yields
    /// `success = false` rather than an error.
    pub async fn stop_query(&self, query_id: &str) -> Result<Frame, LogActionError> {
        let success = match self.client.stop_query(query_id).await {
            Ok(success) => success,
            Err(e) if e.is_not_stoppable() => {
                trace_debug!("Query {} is not stoppable: {}", query_id, e);
                false
            }
            Err(e) => return Err(e.into()),
        };

        log_info!("StopQuery {} -> success={}", query_id, success);
        Ok(Frame::try_new(
            "StopQueryResponse",
            vec![Field::booleans("success", [success])],
        )?)
    }

    /// Fetch the current snapshot of a job as a frame named after `ref_id`
    pub async fn get_query_results(
        &self,
        ref_id: &str,
        query_id: &str,
    ) -> Result<Frame, LogActionError> {
        let page = self.client.get_query_results(query_id).await?;

        trace_debug!(
            "GetQueryResults {} [{}]: status={}, rows={}",
            query_id,
            ref_id,
            page.status,
            page.rows.len()
        );

        Ok(rows_to_frame(ref_id, &page.rows, page.statistics, Some(page.status)).with_ref_id(ref_id))
    }
}
