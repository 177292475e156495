use std::sync::Arc;

use chrono::Utc;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::{
    JobError, PoolError,
    types::{JobId, JobResult, Lane, PoolEvent, WorkerId},
};

use super::{BoxStream, LiveMetrics};

/// Event stream and counters shared by a pool and its workers
#[derive(Clone)]
pub struct ObservabilityLayer {
    event_broadcaster: broadcast::Sender<PoolEvent>,
    metrics: Arc<LiveMetrics>,
}

impl ObservabilityLayer {
    /// Create a layer buffering up to `event_capacity` events per subscriber
    pub fn new(event_capacity: usize) -> Self {
        let (event_broadcaster, _) = broadcast::channel(event_capacity.max(1));

        Self {
            event_broadcaster,
            metrics: Arc::new(LiveMetrics::new()),
        }
    }

    fn emit(&self, event: PoolEvent) {
        // no subscribers is fine
        let _ = self.event_broadcaster.send(event);
    }

    pub fn record_submitted(&self, job_id: JobId, lane: Lane) {
        self.metrics.increment_jobs_submitted();
        self.emit(PoolEvent::Submitted {
            job_id,
            lane,
            at: Utc::now(),
        });
        debug!(%job_id, %lane, "Job submitted");
    }

    pub fn record_rejected(&self, job_id: JobId, error: &PoolError) {
        self.metrics.increment_jobs_rejected();
        self.emit(PoolEvent::Rejected {
            job_id,
            reason: error.to_string(),
            at: Utc::now(),
        });
        warn!(%job_id, reason = error.kind(), "Job rejected: {}", error);
    }

    pub fn record_started(&self, job_id: JobId, worker_id: WorkerId) {
        self.emit(PoolEvent::Started {
            job_id,
            worker_id,
            at: Utc::now(),
        });
        debug!(%job_id, %worker_id, "Job started");
    }

    /// Record the outcome carried by a result
    pub fn record_finished<O>(&self, result: &JobResult<O>) {
        let job_id = result.job_id;
        let worker_id = result.worker_id;
        let at = Utc::now();
        self.metrics.record_execution_time(result.duration);

        match &result.error {
            None => {
                self.metrics.increment_jobs_completed();
                self.emit(PoolEvent::Completed {
                    job_id,
                    worker_id,
                    duration: result.duration,
                    at,
                });
                debug!(%job_id, %worker_id, duration = ?result.duration, "Job completed");
            }
            Some(error) if error.is_cancellation() => {
                self.metrics.increment_jobs_cancelled();
                self.emit(PoolEvent::Cancelled { job_id, worker_id, at });
                debug!(%job_id, %worker_id, "Job canceled: {}", error);
            }
            Some(error) => {
                self.metrics.increment_jobs_failed();
                self.emit(PoolEvent::Failed {
                    job_id,
                    worker_id,
                    error: error.to_string(),
                    at,
                });
                match error {
                    JobError::Panicked(_) => warn!(%job_id, %worker_id, "Job panicked: {}", error),
                    _ => debug!(%job_id, %worker_id, "Job failed: {}", error),
                }
            }
        }
    }

    pub fn record_result_dropped(&self, job_id: JobId, worker_id: WorkerId) {
        self.metrics.increment_results_dropped();
        self.emit(PoolEvent::ResultDropped {
            job_id,
            worker_id,
            at: Utc::now(),
        });
        warn!(%job_id, %worker_id, "Result dropped: pool canceled while publishing");
    }

    pub fn record_discarded(&self, count: usize) {
        if count == 0 {
            return;
        }
        self.metrics.add_jobs_discarded(count as u64);
        self.emit(PoolEvent::JobsDiscarded {
            count,
            at: Utc::now(),
        });
        warn!(count, "Discarded queued jobs at shutdown");
    }

    pub fn record_worker_stopped(&self, worker_id: WorkerId) {
        self.emit(PoolEvent::WorkerStopped {
            worker_id,
            at: Utc::now(),
        });
    }

    /// Subscribe to raw events
    pub fn subscribe(&self) -> broadcast::Receiver<PoolEvent> {
        self.event_broadcaster.subscribe()
    }

    /// Event stream for observability (lagged events are skipped)
    pub fn event_stream(&self) -> BoxStream<PoolEvent> {
        use tokio_stream::{wrappers::BroadcastStream, StreamExt};

        let stream = BroadcastStream::new(self.subscribe()).filter_map(|result| result.ok());
        Box::pin(stream)
    }

    /// Get live metrics
    pub fn metrics(&self) -> &LiveMetrics {
        &self.metrics
    }
}

impl Default for ObservabilityLayer {
    fn default() -> Self {
        Self::new(1024)
    }
}
