use tokio::sync::broadcast;

use crate::{
    PoolResult,
    config::PoolConfig,
    handler::Handler,
    observability::{BoxStream, LiveMetrics, MetricsSnapshot},
    signal::Signal,
    types::{Job, JobResult, Lane, PoolEvent, Scheduling},
};

use super::WorkerPool;

/// Worker pool with a high and a low priority lane
///
/// Jobs with `priority >= priority_threshold` go to the high lane. Whenever
/// both lanes hold work, a free worker takes from the high lane. Each lane
/// has its own `queue_capacity`, so a full low lane never blocks urgent jobs.
pub struct PriorityWorkerPool<H: Handler> {
    inner: WorkerPool<H>,
}

impl<H: Handler> PriorityWorkerPool<H> {
    /// Create a pool using the default threshold
    pub fn new(handler: H, worker_count: usize, queue_capacity: usize) -> PoolResult<Self> {
        Self::with_config(handler, PoolConfig::new(worker_count, queue_capacity))
    }

    pub fn with_config(handler: H, config: PoolConfig) -> PoolResult<Self> {
        let scheduling = Scheduling::priority(config.priority_threshold);
        Ok(Self {
            inner: WorkerPool::build(handler, config, scheduling)?,
        })
    }

    pub fn start(&self) {
        self.inner.start()
    }

    /// Route a job to its lane by priority and enqueue it without blocking
    pub fn submit_job(&self, job: Job<H::Payload>) -> PoolResult<()> {
        self.inner.submit_job(job)
    }

    pub async fn get_result(&self) -> Option<JobResult<H::Output>> {
        self.inner.get_result().await
    }

    pub async fn stop(&self) {
        self.inner.stop().await
    }

    pub async fn abort(&self) {
        self.inner.abort().await
    }

    pub fn cancel(&self) {
        self.inner.cancel()
    }

    /// Priority at or above which jobs use the high lane
    pub fn threshold(&self) -> i32 {
        self.inner.config().priority_threshold
    }

    /// Per-lane input capacity
    pub fn queue_capacity(&self) -> usize {
        self.inner.queue_capacity()
    }

    pub fn scheduling(&self) -> Scheduling {
        self.inner.scheduling()
    }

    pub fn lane_len(&self, lane: Lane) -> usize {
        self.inner.lane_len(lane)
    }

    pub fn queue_len(&self) -> usize {
        self.inner.queue_len()
    }

    pub fn worker_count(&self) -> usize {
        self.inner.worker_count()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }

    pub fn signal(&self) -> &Signal {
        self.inner.signal()
    }

    pub fn config(&self) -> &PoolConfig {
        self.inner.config()
    }

    pub fn metrics(&self) -> &LiveMetrics {
        self.inner.metrics()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        self.inner.snapshot()
    }

    pub fn events(&self) -> broadcast::Receiver<PoolEvent> {
        self.inner.events()
    }

    pub fn event_stream(&self) -> BoxStream<PoolEvent> {
        self.inner.event_stream()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{Simulated, Workload};
    use crate::types::JobId;
    use crate::PoolError;
    use std::time::Duration;

    fn job(id: u64, priority: i32) -> Job<Workload> {
        Job::new(id, Workload::sleep(Duration::from_millis(10))).with_priority(priority)
    }

    #[tokio::test]
    async fn test_routes_by_threshold() {
        let pool = PriorityWorkerPool::new(Simulated::new(), 1, 4).unwrap();
        assert_eq!(pool.threshold(), 5);

        pool.submit_job(job(1, 5)).unwrap();
        pool.submit_job(job(2, 4)).unwrap();
        pool.submit_job(job(3, 10)).unwrap();

        assert_eq!(pool.lane_len(Lane::High), 2);
        assert_eq!(pool.lane_len(Lane::Low), 1);
        assert_eq!(pool.queue_len(), 3);
    }

    #[tokio::test]
    async fn test_full_low_lane_does_not_block_high() {
        let pool = PriorityWorkerPool::new(Simulated::new(), 1, 2).unwrap();
        pool.submit_job(job(1, 0)).unwrap();
        pool.submit_job(job(2, 0)).unwrap();

        assert_eq!(
            pool.submit_job(job(3, 0)),
            Err(PoolError::QueueFull { lane: Lane::Low, capacity: 2 })
        );
        assert!(pool.submit_job(job(4, 9)).is_ok());
    }

    #[tokio::test]
    async fn test_surface_matches_single_lane_pool() {
        let pool = PriorityWorkerPool::with_config(
            Simulated::new(),
            PoolConfig::new(2, 6).with_priority_threshold(3),
        )
        .unwrap();

        assert_eq!(pool.queue_capacity(), 6);
        assert_eq!(pool.scheduling(), Scheduling::priority(3));
        assert_eq!(pool.scheduling().lanes(), &[Lane::High, Lane::Low]);
    }

    #[tokio::test]
    async fn test_stop_drains_both_lanes_high_first() {
        let pool = PriorityWorkerPool::new(Simulated::new(), 1, 10).unwrap();
        for id in 1..=3 {
            pool.submit_job(job(id, 0)).unwrap();
        }
        for id in 4..=6 {
            pool.submit_job(job(id, 9)).unwrap();
        }
        assert_eq!(pool.lane_len(Lane::High), 3);
        assert_eq!(pool.lane_len(Lane::Low), 3);

        pool.start();
        pool.stop().await;

        let mut order = Vec::new();
        while let Some(result) = pool.get_result().await {
            assert!(result.is_success());
            order.push(result.job_id);
        }
        assert_eq!(order, (4..=6).chain(1..=3).map(JobId).collect::<Vec<_>>());
        assert_eq!(pool.queue_len(), 0);
        assert_eq!(pool.snapshot().jobs_discarded, 0);
    }

    #[tokio::test]
    async fn test_high_lane_served_first() {
        let pool = PriorityWorkerPool::with_config(
            Simulated::new(),
            PoolConfig::new(1, 10).with_priority_threshold(1),
        )
        .unwrap();

        pool.submit_job(job(1, 0)).unwrap();
        pool.submit_job(job(2, 0)).unwrap();
        pool.submit_job(job(3, 1)).unwrap();
        pool.start();

        let mut order = Vec::new();
        for _ in 0..3 {
            order.push(pool.get_result().await.unwrap().job_id);
        }
        assert_eq!(order, vec![JobId(3), JobId(1), JobId(2)]);

        pool.stop().await;
    }
}
