use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

/// Execution samples kept for duration statistics
const DURATION_WINDOW: usize = 1000;

/// Live counters for one pool
pub struct LiveMetrics {
    jobs_submitted: AtomicU64,
    jobs_rejected: AtomicU64,
    jobs_completed: AtomicU64,
    jobs_failed: AtomicU64,
    jobs_cancelled: AtomicU64,
    results_dropped: AtomicU64,
    jobs_discarded: AtomicU64,

    performance: Mutex<PerformanceMetrics>,
}

impl LiveMetrics {
    pub fn new() -> Self {
        Self {
            jobs_submitted: AtomicU64::new(0),
            jobs_rejected: AtomicU64::new(0),
            jobs_completed: AtomicU64::new(0),
            jobs_failed: AtomicU64::new(0),
            jobs_cancelled: AtomicU64::new(0),
            results_dropped: AtomicU64::new(0),
            jobs_discarded: AtomicU64::new(0),
            performance: Mutex::new(PerformanceMetrics::new()),
        }
    }

    pub fn increment_jobs_submitted(&self) {
        self.jobs_submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_jobs_rejected(&self) {
        self.jobs_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_jobs_completed(&self) {
        self.jobs_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_jobs_failed(&self) {
        self.jobs_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_jobs_cancelled(&self) {
        self.jobs_cancelled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_results_dropped(&self) {
        self.results_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_jobs_discarded(&self, count: u64) {
        self.jobs_discarded.fetch_add(count, Ordering::Relaxed);
    }

    // Getters for global metrics
    pub fn jobs_submitted(&self) -> u64 {
        self.jobs_submitted.load(Ordering::Relaxed)
    }

    pub fn jobs_rejected(&self) -> u64 {
        self.jobs_rejected.load(Ordering::Relaxed)
    }

    pub fn jobs_completed(&self) -> u64 {
        self.jobs_completed.load(Ordering::Relaxed)
    }

    pub fn jobs_failed(&self) -> u64 {
        self.jobs_failed.load(Ordering::Relaxed)
    }

    pub fn jobs_cancelled(&self) -> u64 {
        self.jobs_cancelled.load(Ordering::Relaxed)
    }

    pub fn results_dropped(&self) -> u64 {
        self.results_dropped.load(Ordering::Relaxed)
    }

    pub fn jobs_discarded(&self) -> u64 {
        self.jobs_discarded.load(Ordering::Relaxed)
    }

    /// Record job execution time
    pub fn record_execution_time(&self, duration: Duration) {
        self.performance.lock().record_execution_time(duration);
    }

    /// Get performance metrics
    pub fn performance_metrics(&self) -> PerformanceMetrics {
        self.performance.lock().clone()
    }

    /// Collect current snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        let performance = self.performance.lock();
        MetricsSnapshot {
            timestamp: Utc::now(),
            jobs_submitted: self.jobs_submitted(),
            jobs_rejected: self.jobs_rejected(),
            jobs_completed: self.jobs_completed(),
            jobs_failed: self.jobs_failed(),
            jobs_cancelled: self.jobs_cancelled(),
            results_dropped: self.results_dropped(),
            jobs_discarded: self.jobs_discarded(),
            average_duration: performance.average_execution_time(),
            p95_duration: performance.percentile_execution_time(95.0),
        }
    }
}

impl Default for LiveMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Rolling window of execution durations
#[derive(Debug, Clone)]
pub struct PerformanceMetrics {
    execution_times: VecDeque<Duration>,
    last_updated: DateTime<Utc>,
}

impl PerformanceMetrics {
    pub fn new() -> Self {
        Self {
            execution_times: VecDeque::new(),
            last_updated: Utc::now(),
        }
    }

    pub fn record_execution_time(&mut self, duration: Duration) {
        if self.execution_times.len() == DURATION_WINDOW {
            self.execution_times.pop_front();
        }
        self.execution_times.push_back(duration);
        self.last_updated = Utc::now();
    }

    pub fn average_execution_time(&self) -> Option<Duration> {
        if self.execution_times.is_empty() {
            return None;
        }

        let total: Duration = self.execution_times.iter().sum();
        Some(total / self.execution_times.len() as u32)
    }

    /// Nearest-rank percentile over the window
    pub fn percentile_execution_time(&self, percentile: f64) -> Option<Duration> {
        if self.execution_times.is_empty() {
            return None;
        }

        let mut sorted: Vec<Duration> = self.execution_times.iter().copied().collect();
        sorted.sort();

        let index = ((percentile / 100.0) * (sorted.len() - 1) as f64).round() as usize;
        sorted.get(index.min(sorted.len() - 1)).copied()
    }

    pub fn sample_count(&self) -> usize {
        self.execution_times.len()
    }

    pub fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }
}

impl Default for PerformanceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of metrics at a point in time
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub timestamp: DateTime<Utc>,
    pub jobs_submitted: u64,
    pub jobs_rejected: u64,
    pub jobs_completed: u64,
    pub jobs_failed: u64,
    pub jobs_cancelled: u64,
    pub results_dropped: u64,
    pub jobs_discarded: u64,
    pub average_duration: Option<Duration>,
    pub p95_duration: Option<Duration>,
}

impl MetricsSnapshot {
    /// Completed share of finished jobs, as a percentage
    pub fn success_rate(&self) -> f64 {
        let finished = self.jobs_completed + self.jobs_failed + self.jobs_cancelled;
        if finished == 0 {
            100.0
        } else {
            (self.jobs_completed as f64 / finished as f64) * 100.0
        }
    }

    /// Accepted jobs with no recorded outcome yet
    pub fn jobs_in_flight(&self) -> u64 {
        self.jobs_submitted.saturating_sub(
            self.jobs_completed
                + self.jobs_failed
                + self.jobs_cancelled
                + self.jobs_discarded,
        )
    }
}
