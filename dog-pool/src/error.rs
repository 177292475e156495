use thiserror::Error;

use crate::types::Lane;

/// Result type for pool operations
pub type PoolResult<T> = Result<T, PoolError>;

/// Call-site errors for pool operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("Queue is full: {lane} lane at capacity {capacity}")]
    QueueFull { lane: Lane, capacity: usize },

    #[error("Pool has been canceled")]
    Cancelled,

    #[error("Pool is shutting down")]
    Closed,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl PoolError {
    /// Check if the caller may retry the same submission later
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::QueueFull { .. })
    }

    /// Short machine-readable name
    pub fn kind(&self) -> &'static str {
        match self {
            Self::QueueFull { .. } => "queue_full",
            Self::Cancelled => "cancelled",
            Self::Closed => "closed",
            Self::InvalidConfig(_) => "invalid_config",
        }
    }
}

/// Job execution outcome carried inside a `JobResult`
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JobError {
    /// The pool signal was canceled while the job was running
    #[error("Job canceled")]
    Cancelled,

    /// The pool deadline passed while the job was running
    #[error("Job deadline exceeded")]
    DeadlineExceeded,

    /// The handler reported a failure
    #[error("Job failed: {0}")]
    Failed(String),

    /// The handler panicked
    #[error("Job panicked: {0}")]
    Panicked(String),
}

impl JobError {
    /// Create a handler failure
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::Failed(msg.into())
    }

    /// Check if this error comes from the cancellation signal
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled | Self::DeadlineExceeded)
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        match self {
            Self::Cancelled => "canceled",
            Self::DeadlineExceeded => "deadline exceeded",
            Self::Failed(msg) | Self::Panicked(msg) => msg,
        }
    }
}
