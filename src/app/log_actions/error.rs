//! Handler-level errors for log actions.

use crate::app::data_plane::cloudwatch_logs::{FrameError, LogStoreError};

use super::request::LogAction;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LogActionError {
    /// The query window does not start before it ends
    #[error("Invalid time range: Start time must be before end time")]
    InvalidTimeRange,

    #[error("Invalid parameters for {action}: {message}")]
    InvalidParameter { action: LogAction, message: String },

    /// Failure returned by the log store, surfaced with its message verbatim
    #[error(transparent)]
    RemoteService(#[from] LogStoreError),

    #[error("Unrecognized action: '{0}'")]
    UnrecognizedAction(String),

    #[error(transparent)]
    Frame(#[from] FrameError),
}

impl LogActionError {
    pub fn invalid_parameter(action: LogAction, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            action,
            message: message.into(),
        }
    }
}
