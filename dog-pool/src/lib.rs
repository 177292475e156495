//! # dog-pool: Bounded Concurrent Job Execution
//!
//! A fixed set of async workers pulls jobs from a bounded input queue,
//! runs them through a [`Handler`] and publishes one [`JobResult`] per job.
//!
//! ## Features
//!
//! - **Backpressure**: `submit_job` never blocks; a full queue is an error the caller handles
//! - **Priority lanes**: [`PriorityWorkerPool`] always serves high priority work first
//! - **Cancellation**: one shared [`Signal`] covers explicit cancel and pool deadlines
//! - **Graceful shutdown**: `stop()` drains queued work, `abort()` discards it
//! - **Structured observability**: lifecycle events and live counters
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dog_pool::prelude::*;
//!
//! struct Square;
//!
//! #[async_trait]
//! impl Handler for Square {
//!     type Payload = u64;
//!     type Output = u64;
//!
//!     async fn handle(&self, job: Job<u64>, _ctx: JobContext) -> Result<u64, JobError> {
//!         Ok(job.payload * job.payload)
//!     }
//! }
//!
//! # async fn demo() -> PoolResult<()> {
//! let pool = WorkerPool::new(Square, 3, 10)?;
//! pool.start();
//!
//! for n in 1..=5 {
//!     pool.submit_job(Job::new(n, n))?;
//! }
//! pool.stop().await;
//!
//! while let Some(result) = pool.get_result().await {
//!     println!("{} -> {:?}", result.job_id, result.output);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod handler;
pub mod observability;
pub mod pool;
pub mod signal;
pub mod types;

pub(crate) mod execution;
pub(crate) mod queue;

pub use config::PoolConfig;
pub use error::{JobError, PoolError, PoolResult};
pub use handler::{handler_fn, FnHandler, Handler, JobContext, Simulated, Workload};
pub use pool::{PriorityWorkerPool, WorkerPool};
pub use signal::{CancelReason, Signal};
pub use types::{
    Job, JobId, JobResult, Lane, PoolEvent, Scheduling, WorkerId, DEFAULT_PRIORITY_THRESHOLD,
};

pub use observability::{LiveMetrics, MetricsSnapshot, ObservabilityLayer};

#[cfg(feature = "tracing-basic")]
pub use observability::init_tracing;

/// Everything needed to define a handler and run a pool
pub mod prelude {
    pub use crate::{PriorityWorkerPool, WorkerPool, PoolConfig};

    pub use crate::{
        Handler, JobContext, handler_fn, Simulated, Workload,
    };

    pub use crate::{
        Job, JobId, JobResult, Lane, WorkerId, JobError, PoolError, PoolResult,
    };

    pub use crate::{Signal, CancelReason};

    pub use crate::{PoolEvent, LiveMetrics, MetricsSnapshot};

    pub use async_trait::async_trait;
}
