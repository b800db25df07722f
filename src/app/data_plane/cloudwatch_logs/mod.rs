//! CloudWatch Logs Insights Integration Module
//!
//! Talks to the asynchronous Logs Insights query service and shapes what it
//! returns into tabular [`Frame`]s.
//!
//! ## Features
//!
//! - [`LogStoreClient`] seam with an AWS SDK implementation and a fixture-driven fake
//! - Query job status mapped onto a closed [`QueryStatus`] enum
//! - Schema-less result rows pivoted into a stable column layout
//! - Relative and absolute query time ranges
//!
//! ## Usage
//!
//! ```rust,no_run
//! use logsdash::app::config::LogsConfig;
//! use logsdash::app::data_plane::cloudwatch_logs::{rows_to_frame, CloudWatchLogsClient, LogStoreClient};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = CloudWatchLogsClient::from_config(&LogsConfig::default()).await?;
//!
//! let page = client.get_query_results("12ab3456-12ab-123a-789e-1234567890ab").await?;
//! let frame = rows_to_frame("A", &page.rows, page.statistics, Some(page.status));
//!
//! println!("{} rows, columns {:?}", frame.row_count(), frame.field_names());
//! # Ok(())
//! # }
//! ```

#![warn(clippy::all, rust_2018_idioms)]

pub mod client;
pub mod errors;
pub mod fake_client;
pub mod frame;
pub mod time_range;
pub mod types;

// Re-export commonly used types
pub use client::{CloudWatchLogsClient, LogStoreClient};
pub use errors::LogStoreError;
pub use fake_client::{FakeLogsClient, RecordedCall};
pub use frame::{rows_to_frame, Field, FieldValues, Frame, FrameError, FrameMeta};
pub use time_range::{ResolvedTimeRange, TimeRange, TimeRangeError, TimeValue};
pub use types::{
    FieldDescriptor, LogGroup, QueryResultsPage, QueryStatistics, QueryStatus, ResultField,
    ResultRow, StartQueryInput,
};
