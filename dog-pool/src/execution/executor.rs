use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;

use crate::{
    JobError,
    handler::{Handler, JobContext},
    signal::Signal,
    types::{Job, JobResult, WorkerId},
};

/// Runs jobs through a handler, racing each one against the pool signal
pub(crate) struct JobExecutor<H> {
    handler: Arc<H>,
    signal: Signal,
}

impl<H: Handler> JobExecutor<H> {
    pub(crate) fn new(handler: Arc<H>, signal: Signal) -> Self {
        Self { handler, signal }
    }

    /// Execute one job and describe the outcome
    ///
    /// If the signal fires first the handler future is dropped and the
    /// result carries the cancellation reason with the time spent so far.
    /// A panicking handler yields `JobError::Panicked`.
    pub(crate) async fn execute(
        &self,
        job: Job<H::Payload>,
        worker_id: WorkerId,
    ) -> JobResult<H::Output> {
        let job_id = job.id;
        let started = Instant::now();

        let ctx = JobContext {
            job_id,
            worker_id,
            signal: self.signal.clone(),
        };
        let work = AssertUnwindSafe(self.handler.handle(job, ctx)).catch_unwind();

        let outcome = tokio::select! {
            biased;
            _ = self.signal.cancelled() => Err(self.cancellation_error()),
            result = work => match result {
                Ok(outcome) => outcome,
                Err(panic) => Err(JobError::Panicked(panic_message(panic.as_ref()))),
            },
        };

        let duration = started.elapsed();
        match outcome {
            Ok(output) => JobResult::success(job_id, worker_id, output, duration),
            Err(error) => JobResult::failure(job_id, worker_id, error, duration),
        }
    }

    fn cancellation_error(&self) -> JobError {
        self.signal
            .reason()
            .map(JobError::from)
            .unwrap_or(JobError::Cancelled)
    }
}

impl<H> Clone for JobExecutor<H> {
    fn clone(&self) -> Self {
        Self {
            handler: self.handler.clone(),
            signal: self.signal.clone(),
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
