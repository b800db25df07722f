//! Data Plane Services Module
//!
//! Data plane services query data held inside AWS resources, as opposed to
//! discovering or managing the resources themselves.
//!
//! ## Available Services
//!
//! - **CloudWatch Logs Insights**: asynchronous log search jobs and log group metadata
//!
//! ## Architecture
//!
//! ```text
//! 1. Client Layer (src/app/data_plane/{service}/client.rs)
//!    └─ Trait seam + AWS SDK implementation
//!
//! 2. Frame Layer (src/app/data_plane/{service}/frame.rs)
//!    └─ Raw output shaped into tabular frames
//!
//! 3. Action Layer (src/app/log_actions/)
//!    └─ Request routing, validation and batch results
//!
//! 4. API Server (src/app/api_server.rs)
//!    └─ Local HTTP endpoint for batches
//! ```

pub mod cloudwatch_logs;

// Re-export commonly used types
pub use cloudwatch_logs::{CloudWatchLogsClient, FakeLogsClient, LogStoreClient};
