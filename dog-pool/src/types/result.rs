use std::time::Duration;

use crate::JobError;

use super::{JobId, WorkerId};

/// Outcome of one executed job
#[derive(Debug, Clone, PartialEq)]
pub struct JobResult<O> {
    /// ID of the job this result was produced for
    pub job_id: JobId,

    /// Handler output, present only on success
    pub output: Option<O>,

    /// Time spent executing (up to the cancellation point if canceled)
    pub duration: Duration,

    /// Worker that ran the job
    pub worker_id: WorkerId,

    /// Failure, if any
    pub error: Option<JobError>,
}

impl<O> JobResult<O> {
    /// Create a successful result
    pub fn success(job_id: JobId, worker_id: WorkerId, output: O, duration: Duration) -> Self {
        Self {
            job_id,
            output: Some(output),
            duration,
            worker_id,
            error: None,
        }
    }

    /// Create a failed result
    pub fn failure(job_id: JobId, worker_id: WorkerId, error: JobError, duration: Duration) -> Self {
        Self {
            job_id,
            output: None,
            duration,
            worker_id,
            error: Some(error),
        }
    }

    /// Check if the job completed without error
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Check if the job was cut short by the pool signal
    pub fn is_cancelled(&self) -> bool {
        self.error.as_ref().is_some_and(JobError::is_cancellation)
    }

    /// Convert into a plain `Result`
    pub fn into_result(self) -> Result<O, JobError> {
        match (self.output, self.error) {
            (_, Some(error)) => Err(error),
            (Some(output), None) => Ok(output),
            (None, None) => Err(JobError::failed("result carried no output")),
        }
    }
}
