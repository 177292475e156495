use std::sync::Arc;

use async_channel::{Sender, TrySendError};
use tracing::{debug, info};

use crate::{
    handler::Handler,
    observability::ObservabilityLayer,
    queue::{Dequeued, JobQueue},
    signal::Signal,
    types::{JobResult, WorkerId},
};

use super::executor::JobExecutor;

/// One worker loop: Waiting -> Processing -> Waiting ... -> Terminated
pub(crate) struct Worker<H: Handler> {
    pub(crate) id: WorkerId,
    pub(crate) executor: JobExecutor<H>,
    pub(crate) queue: Arc<JobQueue<H::Payload>>,
    pub(crate) results: Sender<JobResult<H::Output>>,
    pub(crate) signal: Signal,
    pub(crate) observability: ObservabilityLayer,
}

impl<H: Handler> Worker<H> {
    /// Run until the queue is closed and drained, or the signal fires
    pub(crate) async fn run(self) {
        info!("Worker started");

        loop {
            let (job, lane) = match self.queue.pop(&self.signal).await {
                Dequeued::Job { job, lane } => (job, lane),
                Dequeued::Closed => {
                    debug!("Input closed and drained");
                    break;
                }
                Dequeued::Cancelled => {
                    debug!("Signal fired while waiting for a job");
                    break;
                }
            };

            debug!(job_id = %job.id, %lane, "Dequeued job");
            self.observability.record_started(job.id, self.id);

            let result = self.executor.execute(job, self.id).await;
            self.observability.record_finished(&result);

            if !self.publish(result).await {
                break;
            }
        }

        self.observability.record_worker_stopped(self.id);
        info!("Worker stopped");
    }

    /// Hand a result to consumers. Returns `false` when the worker must stop.
    async fn publish(&self, result: JobResult<H::Output>) -> bool {
        let job_id = result.job_id;

        // a free slot is always used, even after the signal fired
        let result = match self.results.try_send(result) {
            Ok(()) => return true,
            Err(TrySendError::Full(result)) => result,
            Err(TrySendError::Closed(_)) => {
                self.observability.record_result_dropped(job_id, self.id);
                return false;
            }
        };

        tokio::select! {
            biased;
            _ = self.signal.cancelled() => {
                self.observability.record_result_dropped(job_id, self.id);
                false
            }
            sent = self.results.send(result) => {
                if sent.is_err() {
                    self.observability.record_result_dropped(job_id, self.id);
                }
                sent.is_ok()
            }
        }
    }
}
