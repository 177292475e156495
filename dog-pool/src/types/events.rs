use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{JobId, Lane, WorkerId};

/// Structured lifecycle events emitted by a pool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PoolEvent {
    /// Job was accepted onto a lane
    Submitted {
        job_id: JobId,
        lane: Lane,
        at: DateTime<Utc>,
    },

    /// Job submission was refused
    Rejected {
        job_id: JobId,
        reason: String,
        at: DateTime<Utc>,
    },

    /// Worker picked the job up
    Started {
        job_id: JobId,
        worker_id: WorkerId,
        at: DateTime<Utc>,
    },

    /// Job finished successfully
    Completed {
        job_id: JobId,
        worker_id: WorkerId,
        duration: Duration,
        at: DateTime<Utc>,
    },

    /// Handler returned an error or panicked
    Failed {
        job_id: JobId,
        worker_id: WorkerId,
        error: String,
        at: DateTime<Utc>,
    },

    /// Job was cut short by the pool signal
    Cancelled {
        job_id: JobId,
        worker_id: WorkerId,
        at: DateTime<Utc>,
    },

    /// Result was abandoned because the signal fired while publishing it
    ResultDropped {
        job_id: JobId,
        worker_id: WorkerId,
        at: DateTime<Utc>,
    },

    /// Queued jobs thrown away at shutdown
    JobsDiscarded {
        count: usize,
        at: DateTime<Utc>,
    },

    /// Worker loop exited
    WorkerStopped {
        worker_id: WorkerId,
        at: DateTime<Utc>,
    },
}

impl PoolEvent {
    /// Get event type name as string
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::Submitted { .. } => "submitted",
            Self::Rejected { .. } => "rejected",
            Self::Started { .. } => "started",
            Self::Completed { .. } => "completed",
            Self::Failed { .. } => "failed",
            Self::Cancelled { .. } => "cancelled",
            Self::ResultDropped { .. } => "result_dropped",
            Self::JobsDiscarded { .. } => "jobs_discarded",
            Self::WorkerStopped { .. } => "worker_stopped",
        }
    }

    /// Get the job ID for job-scoped events
    pub fn job_id(&self) -> Option<JobId> {
        match self {
            Self::Submitted { job_id, .. }
            | Self::Rejected { job_id, .. }
            | Self::Started { job_id, .. }
            | Self::Completed { job_id, .. }
            | Self::Failed { job_id, .. }
            | Self::Cancelled { job_id, .. }
            | Self::ResultDropped { job_id, .. } => Some(*job_id),
            Self::JobsDiscarded { .. } | Self::WorkerStopped { .. } => None,
        }
    }

    /// Get the timestamp from any event
    pub fn timestamp(&self) -> &DateTime<Utc> {
        match self {
            Self::Submitted { at, .. } => at,
            Self::Rejected { at, .. } => at,
            Self::Started { at, .. } => at,
            Self::Completed { at, .. } => at,
            Self::Failed { at, .. } => at,
            Self::Cancelled { at, .. } => at,
            Self::ResultDropped { at, .. } => at,
            Self::JobsDiscarded { at, .. } => at,
            Self::WorkerStopped { at, .. } => at,
        }
    }
}
