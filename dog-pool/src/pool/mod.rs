//! Worker pools
//!
//! [`WorkerPool`] serves a single FIFO lane. [`PriorityWorkerPool`] routes
//! jobs into a high and a low lane and always drains the high lane first.

pub mod priority;

pub use priority::PriorityWorkerPool;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_channel::{Receiver, Sender};
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{error, info, info_span, instrument, warn, Instrument};

use crate::{
    PoolError, PoolResult,
    config::PoolConfig,
    execution::{JobExecutor, Worker},
    handler::Handler,
    observability::{BoxStream, LiveMetrics, MetricsSnapshot, ObservabilityLayer},
    queue::JobQueue,
    signal::Signal,
    types::{Job, JobResult, Lane, PoolEvent, Scheduling, WorkerId},
};

/// Bounded pool of worker tasks fed through a FIFO input queue
///
/// Jobs are accepted with [`submit_job`](Self::submit_job), which never
/// blocks: a full queue is reported as [`PoolError::QueueFull`]. Results are
/// delivered in completion order through [`get_result`](Self::get_result).
///
/// ```no_run
/// use std::time::Duration;
/// use dog_pool::prelude::*;
///
/// # async fn demo() -> PoolResult<()> {
/// let pool = WorkerPool::new(Simulated::new(), 3, 10)?;
/// pool.start();
///
/// for id in 1..=5 {
///     pool.submit_job(Job::new(id, Workload::sleep(Duration::from_millis(50))))?;
/// }
/// for _ in 1..=5 {
///     if let Some(result) = pool.get_result().await {
///         println!("{}: {:?}", result.job_id, result.output);
///     }
/// }
///
/// pool.stop().await;
/// # Ok(())
/// # }
/// ```
pub struct WorkerPool<H: Handler> {
    config: PoolConfig,
    scheduling: Scheduling,
    handler: Arc<H>,
    queue: Arc<JobQueue<H::Payload>>,
    results_tx: Sender<JobResult<H::Output>>,
    results_rx: Receiver<JobResult<H::Output>>,
    signal: Signal,
    observability: ObservabilityLayer,
    workers: Mutex<Vec<JoinHandle<()>>>,
    spawned: AtomicUsize,
    // serializes stop() and abort()
    shutdown: tokio::sync::Mutex<()>,
}

impl<H: Handler> WorkerPool<H> {
    /// Create a pool with `worker_count` workers and an input queue holding
    /// at most `queue_capacity` jobs
    pub fn new(handler: H, worker_count: usize, queue_capacity: usize) -> PoolResult<Self> {
        Self::with_config(handler, PoolConfig::new(worker_count, queue_capacity))
    }

    /// Create a pool from a full configuration
    pub fn with_config(handler: H, config: PoolConfig) -> PoolResult<Self> {
        Self::build(handler, config, Scheduling::Fifo)
    }

    pub(crate) fn build(handler: H, config: PoolConfig, scheduling: Scheduling) -> PoolResult<Self> {
        config.validate()?;

        let signal = match config.deadline {
            Some(deadline) => Signal::with_timeout(deadline),
            None => Signal::new(),
        };
        let (results_tx, results_rx) = async_channel::bounded(config.result_capacity());

        Ok(Self {
            queue: Arc::new(JobQueue::new(scheduling.lanes(), config.queue_capacity)),
            observability: ObservabilityLayer::new(config.event_capacity),
            handler: Arc::new(handler),
            workers: Mutex::new(Vec::with_capacity(config.workers)),
            spawned: AtomicUsize::new(0),
            shutdown: tokio::sync::Mutex::new(()),
            config,
            scheduling,
            results_tx,
            results_rx,
            signal,
        })
    }

    /// Spawn the configured number of workers
    ///
    /// Must be called from within a Tokio runtime. Calling it again spawns
    /// another full set of workers. Does nothing once shutdown has begun.
    #[instrument(skip(self), fields(workers = self.config.workers))]
    pub fn start(&self) {
        let mut workers = self.workers.lock();

        if self.queue.is_closed() || self.signal.is_cancelled() {
            warn!("Pool is shut down; not starting workers");
            return;
        }
        if self.spawned.load(Ordering::SeqCst) > 0 {
            warn!("Pool already started; spawning additional workers");
        }

        let executor = JobExecutor::new(self.handler.clone(), self.signal.clone());
        for _ in 0..self.config.workers {
            let id = WorkerId(self.spawned.fetch_add(1, Ordering::SeqCst) + 1);
            let worker = Worker {
                id,
                executor: executor.clone(),
                queue: self.queue.clone(),
                results: self.results_tx.clone(),
                signal: self.signal.clone(),
                observability: self.observability.clone(),
            };

            let span = info_span!("worker", worker_id = %id);
            workers.push(tokio::spawn(worker.run().instrument(span)));
        }

        info!("Started {} workers", self.config.workers);
    }

    /// Enqueue a job without blocking
    ///
    /// Fails with `Cancelled` once the pool signal has fired, `QueueFull`
    /// when the job's lane is at capacity and `Closed` once shutdown began.
    pub fn submit_job(&self, job: Job<H::Payload>) -> PoolResult<()> {
        let job_id = job.id;

        let accepted = if self.signal.is_cancelled() {
            Err(PoolError::Cancelled)
        } else {
            let lane = self.scheduling.lane_for(job.priority);
            self.queue
                .try_push(lane, job)
                .map(|()| lane)
                .map_err(PoolError::from)
        };

        match accepted {
            Ok(lane) => {
                self.observability.record_submitted(job_id, lane);
                Ok(())
            }
            Err(err) => {
                self.observability.record_rejected(job_id, &err);
                Err(err)
            }
        }
    }

    /// Wait for the next result
    ///
    /// Returns `None` once results are closed and drained, or when the pool
    /// signal fires while waiting with nothing buffered.
    pub async fn get_result(&self) -> Option<JobResult<H::Output>> {
        tokio::select! {
            biased;
            result = self.results_rx.recv() => result.ok(),
            _ = self.signal.cancelled() => self.results_rx.try_recv().ok(),
        }
    }

    /// Graceful shutdown
    ///
    /// Closes the input, lets workers finish every queued job, then cancels
    /// the signal and closes results. Results stay readable until drained.
    /// Safe to call more than once and from several tasks.
    ///
    /// Without `shutdown_timeout` this blocks until every queued job has run
    /// and its result found room, so when the result channel fills up some
    /// task must keep calling `get_result` (or call `abort`). With
    /// `shutdown_timeout` set, workers still busy when it elapses are
    /// canceled and results that cannot be delivered are dropped.
    #[instrument(skip(self))]
    pub async fn stop(&self) {
        let _guard = self.shutdown.lock().await;

        if self.queue.close() {
            info!(queued = self.queue.len(), "Stopping pool; draining queued jobs");
        }

        let handles = std::mem::take(&mut *self.workers.lock());
        self.join_workers(handles, self.config.shutdown_timeout).await;

        self.signal.cancel();
        self.discard_queued();
        self.results_tx.close();

        info!("Pool stopped");
    }

    /// Immediate shutdown
    ///
    /// Cancels the signal first so in-flight jobs end as canceled and queued
    /// jobs are discarded without running. Also unblocks a `stop()` whose
    /// workers are stuck publishing to a full result channel.
    #[instrument(skip(self))]
    pub async fn abort(&self) {
        // fire before taking the lock: a stuck stop() holds it until workers exit
        self.queue.close();
        self.signal.cancel();
        info!("Aborting pool");

        let _guard = self.shutdown.lock().await;

        let handles = std::mem::take(&mut *self.workers.lock());
        self.join_workers(handles, None).await;

        self.discard_queued();
        self.results_tx.close();

        info!("Pool aborted");
    }

    /// Fire the pool signal without waiting for workers
    pub fn cancel(&self) {
        self.signal.cancel();
    }

    async fn join_workers(&self, handles: Vec<JoinHandle<()>>, timeout: Option<Duration>) {
        if handles.is_empty() {
            return;
        }

        let join = futures::future::join_all(handles);
        tokio::pin!(join);

        let outcomes = match timeout {
            Some(timeout) => match tokio::time::timeout(timeout, &mut join).await {
                Ok(outcomes) => outcomes,
                Err(_) => {
                    warn!(?timeout, "Workers still busy after shutdown timeout; canceling");
                    self.signal.cancel();
                    join.await
                }
            },
            None => join.await,
        };

        for outcome in outcomes {
            if let Err(e) = outcome {
                error!("Worker task failed: {}", e);
            }
        }
    }

    fn discard_queued(&self) {
        let discarded = self.queue.drain();
        self.observability.record_discarded(discarded.len());
    }

    /// Jobs waiting across all lanes
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Jobs waiting in one lane
    pub fn lane_len(&self, lane: Lane) -> usize {
        self.queue.lane_len(lane)
    }

    /// Per-lane input capacity
    pub fn queue_capacity(&self) -> usize {
        self.queue.capacity()
    }

    /// Worker tasks spawned and not yet joined
    pub fn worker_count(&self) -> usize {
        self.workers.lock().len()
    }

    /// Whether the input queue has been closed
    pub fn is_closed(&self) -> bool {
        self.queue.is_closed()
    }

    pub fn signal(&self) -> &Signal {
        &self.signal
    }

    pub fn scheduling(&self) -> Scheduling {
        self.scheduling
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    pub fn metrics(&self) -> &LiveMetrics {
        self.observability.metrics()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        self.observability.metrics().snapshot()
    }

    /// Subscribe to lifecycle events
    pub fn events(&self) -> broadcast::Receiver<PoolEvent> {
        self.observability.subscribe()
    }

    /// Lifecycle events as a stream
    pub fn event_stream(&self) -> BoxStream<PoolEvent> {
        self.observability.event_stream()
    }
}

impl<H: Handler> Drop for WorkerPool<H> {
    fn drop(&mut self) {
        // detached workers wind down on their own
        self.queue.close();
        self.signal.cancel();
        self.results_tx.close();
    }
}
