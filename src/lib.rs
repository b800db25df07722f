//! logsdash - CloudWatch Logs Insights query bridge
//!
//! Runs ad-hoc Logs Insights searches and returns their results as typed
//! tabular frames. The service executes queries asynchronously: starting a
//! query returns a job id at once, and results are fetched by polling until
//! the job reaches a terminal status.
//!
//! # Architecture Overview
//!
//! - **Log Store Client** ([`app::data_plane::cloudwatch_logs::LogStoreClient`]): five remote
//!   operations behind a trait, implemented with the AWS SDK and by a test fake
//! - **Frame Builder** ([`app::data_plane::cloudwatch_logs::rows_to_frame`]): pivots
//!   schema-less result rows into ordered, nullable columns
//! - **Query Lifecycle** ([`app::log_actions::QueryLifecycle`]): validates and translates
//!   start, poll and stop requests
//! - **Dispatcher** ([`app::LogActionExecutor`]): routes a batch of tagged requests and
//!   collects a result or error per refId
//!
//! # Getting Started
//!
//! `logsdash serve` exposes the dispatcher on a local HTTP endpoint;
//! `logsdash run batch.json` executes a single batch and prints the response.

#![warn(clippy::all, rust_2018_idioms)]

// Include logging macros first
#[macro_use]
pub mod logging_macros;

pub mod app;
pub use app::LogActionExecutor;
