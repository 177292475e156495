use serde::{Deserialize, Serialize};

use super::JobId;

/// Unit of work submitted to a pool
///
/// The payload type is fixed by the pool's handler, so a job can only be
/// submitted to a pool that knows how to run it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job<P> {
    /// Submitter-chosen identifier, echoed in the result
    pub id: JobId,

    /// Handler input
    pub payload: P,

    /// Routing priority (higher is more urgent)
    pub priority: i32,
}

impl<P> Job<P> {
    /// Create a job with priority 0
    pub fn new(id: impl Into<JobId>, payload: P) -> Self {
        Self {
            id: id.into(),
            payload,
            priority: 0,
        }
    }

    /// Set the job priority
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}
