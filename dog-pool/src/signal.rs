//! One-shot cancellation signal shared by a pool controller and its workers.
//!
//! A [`Signal`] is fired either explicitly with [`Signal::cancel`] or
//! implicitly when its deadline passes. Once fired it never resets, and the
//! first cause to fire is kept as the [`CancelReason`]. Clones share state.

use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::JobError;

/// Why a signal fired
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CancelReason {
    /// `cancel()` was called
    Cancelled,

    /// The deadline passed
    DeadlineExceeded,
}

impl From<CancelReason> for JobError {
    fn from(reason: CancelReason) -> Self {
        match reason {
            CancelReason::Cancelled => JobError::Cancelled,
            CancelReason::DeadlineExceeded => JobError::DeadlineExceeded,
        }
    }
}

/// Broadcast cancellation flag with an optional deadline
#[derive(Debug, Clone)]
pub struct Signal {
    token: CancellationToken,
    deadline: Option<Instant>,
    reason: Arc<OnceCell<CancelReason>>,
}

impl Signal {
    /// Create a signal that only fires on `cancel()`
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: None,
            reason: Arc::new(OnceCell::new()),
        }
    }

    /// Create a signal that fires `timeout` from now
    pub fn with_timeout(timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => Self::with_deadline(deadline),
            None => Self::new(),
        }
    }

    /// Create a signal that fires at `deadline`
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            ..Self::new()
        }
    }

    /// Deadline, if any
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline (zero once passed)
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Fire the signal. Idempotent.
    pub fn cancel(&self) {
        self.fire(CancelReason::Cancelled);
    }

    fn fire(&self, reason: CancelReason) {
        // first writer wins; the token may already be canceled
        let _ = self.reason.set(reason);
        self.token.cancel();
    }

    /// Check whether the signal has fired, observing the deadline
    pub fn is_cancelled(&self) -> bool {
        if self.token.is_cancelled() {
            return true;
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => {
                self.fire(CancelReason::DeadlineExceeded);
                true
            }
            _ => false,
        }
    }

    /// Why the signal fired, or `None` if it has not
    pub fn reason(&self) -> Option<CancelReason> {
        if !self.is_cancelled() {
            return None;
        }
        Some(self.reason.get().copied().unwrap_or(CancelReason::Cancelled))
    }

    /// Wait until the signal fires
    pub async fn cancelled(&self) {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = self.token.cancelled() => {}
                    _ = tokio::time::sleep_until(deadline) => {
                        self.fire(CancelReason::DeadlineExceeded);
                    }
                }
            }
            None => self.token.cancelled().await,
        }
    }
}

impl Default for Signal {
    fn default() -> Self {
        Self::new()
    }
}
