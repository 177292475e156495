use std::collections::VecDeque;

use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::{
    PoolError,
    signal::Signal,
    types::{Job, Lane},
};

/// Outcome of waiting on the queue
#[derive(Debug)]
pub(crate) enum Dequeued<P> {
    /// A job taken from `lane`
    Job { job: Job<P>, lane: Lane },

    /// The queue is closed and every lane is empty
    Closed,

    /// The signal fired first
    Cancelled,
}

/// Non-blocking enqueue failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PushError {
    Full { lane: Lane, capacity: usize },
    Closed,
    UnknownLane(Lane),
}

impl From<PushError> for PoolError {
    fn from(err: PushError) -> Self {
        match err {
            PushError::Full { lane, capacity } => PoolError::QueueFull { lane, capacity },
            PushError::Closed => PoolError::Closed,
            PushError::UnknownLane(lane) => {
                PoolError::InvalidConfig(format!("pool has no {} lane", lane))
            }
        }
    }
}

struct QueueState<P> {
    // service order: earlier lanes are always drained first
    lanes: Vec<(Lane, VecDeque<Job<P>>)>,
    closed: bool,
}

impl<P> QueueState<P> {
    fn lane_mut(&mut self, lane: Lane) -> Option<&mut VecDeque<Job<P>>> {
        self.lanes
            .iter_mut()
            .find(|(l, _)| *l == lane)
            .map(|(_, jobs)| jobs)
    }

    fn pop_front(&mut self) -> Option<(Job<P>, Lane)> {
        self.lanes
            .iter_mut()
            .find_map(|(lane, jobs)| jobs.pop_front().map(|job| (job, *lane)))
    }

    fn len(&self) -> usize {
        self.lanes.iter().map(|(_, jobs)| jobs.len()).sum()
    }
}

/// Bounded multi-lane job queue
///
/// Every lane holds at most `capacity` jobs. Taking a job always scans the
/// lanes in service order under a single lock, so a job on an earlier lane
/// can never lose to one on a later lane.
pub(crate) struct JobQueue<P> {
    state: Mutex<QueueState<P>>,
    capacity: usize,
    available: Notify,
}

impl<P> JobQueue<P> {
    /// Create a queue with the given lanes (in service order)
    pub(crate) fn new(lanes: &[Lane], capacity: usize) -> Self {
        assert!(!lanes.is_empty(), "a job queue needs at least one lane");

        Self {
            state: Mutex::new(QueueState {
                lanes: lanes.iter().map(|lane| (*lane, VecDeque::with_capacity(capacity))).collect(),
                closed: false,
            }),
            capacity,
            available: Notify::new(),
        }
    }

    /// Enqueue without waiting
    pub(crate) fn try_push(&self, lane: Lane, job: Job<P>) -> Result<(), PushError> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(PushError::Closed);
        }

        let jobs = state.lane_mut(lane).ok_or(PushError::UnknownLane(lane))?;
        if jobs.len() >= self.capacity {
            return Err(PushError::Full {
                lane,
                capacity: self.capacity,
            });
        }
        jobs.push_back(job);
        drop(state);

        self.available.notify_one();
        Ok(())
    }

    /// Take the next job in service order without waiting
    #[cfg(test)]
    pub(crate) fn try_pop(&self) -> Option<(Job<P>, Lane)> {
        self.state.lock().pop_front()
    }

    /// Wait for a job, queue closure, or the signal
    ///
    /// A fired signal wins over queued jobs.
    pub(crate) async fn pop(&self, signal: &Signal) -> Dequeued<P> {
        loop {
            if signal.is_cancelled() {
                return Dequeued::Cancelled;
            }

            // register interest before looking so a push in between is not missed
            let notified = self.available.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut state = self.state.lock();
                if let Some((job, lane)) = state.pop_front() {
                    return Dequeued::Job { job, lane };
                }
                if state.closed {
                    return Dequeued::Closed;
                }
            }

            tokio::select! {
                biased;
                _ = signal.cancelled() => return Dequeued::Cancelled,
                _ = &mut notified => {}
            }
        }
    }

    /// Refuse further pushes and wake every waiter. Returns `true` on the first call.
    pub(crate) fn close(&self) -> bool {
        let newly_closed = {
            let mut state = self.state.lock();
            !std::mem::replace(&mut state.closed, true)
        };
        self.available.notify_waiters();
        newly_closed
    }

    /// Remove every queued job
    pub(crate) fn drain(&self) -> Vec<Job<P>> {
        let mut state = self.state.lock();
        state
            .lanes
            .iter_mut()
            .flat_map(|(_, jobs)| jobs.drain(..))
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.state.lock().len()
    }

    pub(crate) fn lane_len(&self, lane: Lane) -> usize {
        let state = self.state.lock();
        state
            .lanes
            .iter()
            .find(|(l, _)| *l == lane)
            .map_or(0, |(_, jobs)| jobs.len())
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }
}
