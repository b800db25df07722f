//! Log store error classification.
//!
//! Remote failures are reduced to an error code (when the service supplies
//! one) and the underlying message. Callers only ever see the message; the
//! code is kept so specific failures can be recognized, e.g. a stop request
//! against a query that already finished.

/// Error code CloudWatch Logs returns when a query can no longer be stopped
pub const NOT_STOPPABLE_ERROR_CODE: &str = "InvalidParameterException";

/// Failure reported by the log store for a single remote call
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct LogStoreError {
    pub code: Option<String>,
    pub message: String,
}

impl LogStoreError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: message.into(),
        }
    }

    /// The query is not in a stoppable state (already finished, cancelled
    /// or timed out)
    pub fn is_not_stoppable(&self) -> bool {
        self.code.as_deref() == Some(NOT_STOPPABLE_ERROR_CODE)
    }

    pub fn is_throttling(&self) -> bool {
        matches!(
            self.code.as_deref(),
            Some("ThrottlingException" | "LimitExceededException" | "TooManyRequestsException")
        )
    }
}
