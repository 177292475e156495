//! Job bodies.
//!
//! A [`Handler`] fixes the payload and output types of a pool. Closures can
//! be used through [`handler_fn`], and [`Simulated`] runs timed workloads
//! described by the [`Workload`] enum.

use std::future::Future;
use std::marker::PhantomData;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    JobError,
    signal::Signal,
    types::{Job, JobId, WorkerId},
};

/// Execution context handed to a handler
#[derive(Debug, Clone)]
pub struct JobContext {
    /// Job being executed
    pub job_id: JobId,

    /// Worker running it
    pub worker_id: WorkerId,

    /// Pool signal, for handlers that want to stop early on their own
    pub signal: Signal,
}

/// Typed job body run by pool workers
#[async_trait]
pub trait Handler: Send + Sync + 'static {
    /// Job input
    type Payload: Send + 'static;

    /// Job output
    type Output: Send + 'static;

    /// Run one job. Errors are reported in the job's result.
    async fn handle(
        &self,
        job: Job<Self::Payload>,
        ctx: JobContext,
    ) -> Result<Self::Output, JobError>;
}

/// Handler backed by an async closure
pub struct FnHandler<F, P, O> {
    f: F,
    _phantom: PhantomData<fn(P) -> O>,
}

/// Wrap an async closure as a handler
pub fn handler_fn<F, Fut, P, O>(f: F) -> FnHandler<F, P, O>
where
    F: Fn(Job<P>, JobContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<O, JobError>> + Send + 'static,
    P: Send + 'static,
    O: Send + 'static,
{
    FnHandler {
        f,
        _phantom: PhantomData,
    }
}

#[async_trait]
impl<F, Fut, P, O> Handler for FnHandler<F, P, O>
where
    F: Fn(Job<P>, JobContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<O, JobError>> + Send + 'static,
    P: Send + 'static,
    O: Send + 'static,
{
    type Payload = P;
    type Output = O;

    async fn handle(&self, job: Job<P>, ctx: JobContext) -> Result<O, JobError> {
        (self.f)(job, ctx).await
    }
}

/// Simulated work description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Workload {
    /// Succeed after `duration`
    Sleep { duration: Duration },

    /// Fail with `reason` after `duration`
    Fail { duration: Duration, reason: String },
}

impl Workload {
    pub fn sleep(duration: Duration) -> Self {
        Self::Sleep { duration }
    }

    pub fn fail(duration: Duration, reason: impl Into<String>) -> Self {
        Self::Fail {
            duration,
            reason: reason.into(),
        }
    }

    fn duration(&self) -> Duration {
        match self {
            Self::Sleep { duration } | Self::Fail { duration, .. } => *duration,
        }
    }
}

/// Handler that sleeps through a `Workload` in fixed ticks
///
/// The signal is checked between ticks, so cancellation latency is bounded
/// by the tick length even when the executor race is not in play.
#[derive(Debug, Clone)]
pub struct Simulated {
    tick: Duration,
}

impl Simulated {
    pub fn new() -> Self {
        Self {
            tick: Duration::from_millis(10),
        }
    }

    /// Use a custom tick length
    pub fn with_tick(tick: Duration) -> Self {
        Self {
            tick: tick.max(Duration::from_millis(1)),
        }
    }
}

impl Default for Simulated {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Handler for Simulated {
    type Payload = Workload;
    type Output = String;

    async fn handle(&self, job: Job<Workload>, ctx: JobContext) -> Result<String, JobError> {
        let mut remaining = job.payload.duration();
        while !remaining.is_zero() {
            if let Some(reason) = ctx.signal.reason() {
                return Err(reason.into());
            }
            let step = remaining.min(self.tick);
            tokio::time::sleep(step).await;
            remaining -= step;
        }

        match job.payload {
            Workload::Sleep { duration } => Ok(format!(
                "job {} done by {} after {}ms",
                job.id,
                ctx.worker_id,
                duration.as_millis()
            )),
            Workload::Fail { reason, .. } => Err(JobError::Failed(reason)),
        }
    }
}
