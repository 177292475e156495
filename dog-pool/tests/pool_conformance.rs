use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_stream::StreamExt;

use dog_pool::{
    handler_fn, Job, JobError, JobId, JobResult, Lane, PoolConfig, PoolError, PoolEvent,
    PriorityWorkerPool, Simulated, WorkerPool, Workload,
};

/// Test factory functions
fn sleep_job(id: u64, millis: u64) -> Job<Workload> {
    Job::new(id, Workload::sleep(Duration::from_millis(millis)))
}

async fn next_result<H: dog_pool::Handler>(pool: &WorkerPool<H>) -> JobResult<H::Output> {
    tokio::time::timeout(Duration::from_secs(2), pool.get_result())
        .await
        .expect("Timeout waiting for result")
        .expect("Results closed")
}

async fn next_event(stream: &mut dog_pool::observability::BoxStream<PoolEvent>) -> PoolEvent {
    tokio::time::timeout(Duration::from_secs(1), stream.next())
        .await
        .expect("Timeout waiting for event")
        .expect("Stream ended")
}

/// A1. Every accepted job yields exactly one result
#[tokio::test]
async fn test_concrete_scenario_three_workers() {
    let pool = WorkerPool::new(Simulated::new(), 3, 10).unwrap();
    pool.start();

    for id in 1..=5 {
        pool.submit_job(sleep_job(id, 20)).unwrap();
    }

    let mut seen = HashSet::new();
    for _ in 1..=5 {
        let result = next_result(&pool).await;
        assert!(result.is_success());
        assert!(seen.insert(result.job_id), "duplicate result for {}", result.job_id);
    }
    pool.stop().await;

    let expected: HashSet<JobId> = (1..=5).map(JobId).collect();
    assert_eq!(seen, expected);
    assert!(pool.get_result().await.is_none());
}

/// A2. Failures are results too
#[tokio::test]
async fn test_failed_jobs_still_produce_results() {
    let handler = handler_fn(|job: Job<u64>, _ctx| async move {
        if job.payload % 2 == 1 {
            Err(JobError::failed(format!("odd input {}", job.payload)))
        } else {
            Ok(job.payload / 2)
        }
    });
    let pool = WorkerPool::new(handler, 2, 10).unwrap();
    pool.start();

    for n in 1..=6 {
        pool.submit_job(Job::new(n, n)).unwrap();
    }
    pool.stop().await;

    let mut failed = 0;
    let mut succeeded = 0;
    while let Some(result) = pool.get_result().await {
        match result.into_result() {
            Ok(_) => succeeded += 1,
            Err(JobError::Failed(_)) => failed += 1,
            Err(other) => panic!("unexpected error {other}"),
        }
    }
    assert_eq!((succeeded, failed), (3, 3));

    let snapshot = pool.snapshot();
    assert_eq!(snapshot.jobs_completed, 3);
    assert_eq!(snapshot.jobs_failed, 3);
}

/// B1. Submitting beyond capacity is rejected without blocking
#[tokio::test]
async fn test_backpressure_rejects_overflow() {
    let pool = WorkerPool::new(Simulated::new(), 2, 3).unwrap();

    for id in 1..=3 {
        pool.submit_job(sleep_job(id, 10)).unwrap();
    }
    let err = pool.submit_job(sleep_job(4, 10)).unwrap_err();

    assert_eq!(err, PoolError::QueueFull { lane: Lane::Default, capacity: 3 });
    assert!(err.is_recoverable());
    assert_eq!(pool.queue_len(), 3);
    assert_eq!(pool.snapshot().jobs_rejected, 1);
}

/// B2. Capacity frees up once workers dequeue
#[tokio::test]
async fn test_backpressure_recovers_after_drain() {
    let pool = WorkerPool::new(Simulated::new(), 1, 1).unwrap();
    pool.submit_job(sleep_job(1, 10)).unwrap();
    assert!(pool.submit_job(sleep_job(2, 10)).is_err());

    pool.start();
    next_result(&pool).await;

    assert!(pool.submit_job(sleep_job(2, 10)).is_ok());
    pool.stop().await;
}

/// C1. High priority precedes low when both are waiting
#[tokio::test]
async fn test_priority_precedence() {
    let pool = PriorityWorkerPool::new(Simulated::new(), 1, 10).unwrap();

    pool.submit_job(sleep_job(1, 10).with_priority(0)).unwrap();
    pool.submit_job(sleep_job(2, 10).with_priority(9)).unwrap();
    pool.start();

    let first = tokio::time::timeout(Duration::from_secs(2), pool.get_result())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first.job_id, JobId(2));

    let second = pool.get_result().await.unwrap();
    assert_eq!(second.job_id, JobId(1));

    pool.stop().await;
}

/// D1. A pool deadline interrupts long jobs shortly after it passes
#[tokio::test]
async fn test_timeout_cancellation() {
    let unit = Duration::from_millis(25);
    let created = Instant::now();
    let config = PoolConfig::new(1, 10).with_deadline(unit * 2);
    let pool = WorkerPool::with_config(Simulated::new(), config).unwrap();
    pool.start();

    pool.submit_job(Job::new(1, Workload::sleep(unit * 10))).unwrap();
    pool.stop().await;
    let elapsed = created.elapsed();

    let result = pool.get_result().await.expect("canceled job still reports");
    assert_eq!(result.job_id, JobId(1));
    assert_eq!(result.error, Some(JobError::DeadlineExceeded));
    assert!(result.duration < unit * 10);
    assert!(elapsed >= unit * 2);
    assert!(elapsed < unit * 2 + Duration::from_millis(200), "overshoot too large: {elapsed:?}");
}

/// D2. Submissions after the deadline are refused
#[tokio::test]
async fn test_submit_after_deadline() {
    let config = PoolConfig::new(1, 10).with_deadline(Duration::from_millis(10));
    let pool = WorkerPool::with_config(Simulated::new(), config).unwrap();

    tokio::time::sleep(Duration::from_millis(30)).await;

    assert_eq!(pool.submit_job(sleep_job(1, 10)), Err(PoolError::Cancelled));
    assert!(pool.get_result().await.is_none());
}

/// E1. Stop races submitters and consumers without panicking or hanging
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_shutdown_safety() {
    let pool = Arc::new(WorkerPool::new(Simulated::new(), 4, 8).unwrap());
    pool.start();

    let mut submitters = Vec::new();
    for producer in 0..4u64 {
        let pool = pool.clone();
        submitters.push(tokio::spawn(async move {
            let mut accepted = 0u64;
            for i in 0..200u64 {
                match pool.submit_job(sleep_job(producer * 1000 + i, 1)) {
                    Ok(()) => accepted += 1,
                    Err(e) if e.is_recoverable() => tokio::task::yield_now().await,
                    Err(_) => break,
                }
            }
            accepted
        }));
    }

    let mut consumers = Vec::new();
    for _ in 0..2 {
        let pool = pool.clone();
        consumers.push(tokio::spawn(async move {
            let mut received = 0u64;
            while pool.get_result().await.is_some() {
                received += 1;
            }
            received
        }));
    }

    let stopper = {
        let pool = pool.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            pool.stop().await;
        })
    };

    let outcome = tokio::time::timeout(Duration::from_secs(10), async {
        stopper.await.unwrap();
        let mut accepted = 0;
        for handle in submitters {
            accepted += handle.await.unwrap();
        }
        let mut received = 0;
        for handle in consumers {
            received += handle.await.unwrap();
        }
        (accepted, received)
    })
    .await
    .expect("shutdown must terminate");

    let (accepted, received) = outcome;
    assert_eq!(accepted, received);
    assert!(pool.is_closed());
    assert_eq!(pool.worker_count(), 0);
}

/// E3. Same race against the two-lane pool: both lanes drain before workers exit
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_priority_shutdown_safety() {
    let pool = Arc::new(PriorityWorkerPool::new(Simulated::new(), 3, 8).unwrap());
    pool.start();

    let mut submitters = Vec::new();
    for producer in 0..4u64 {
        let pool = pool.clone();
        submitters.push(tokio::spawn(async move {
            let mut accepted = HashSet::new();
            for i in 0..200u64 {
                let id = producer * 1000 + i;
                let priority = if i % 2 == 0 { 9 } else { 0 };
                match pool.submit_job(sleep_job(id, 1).with_priority(priority)) {
                    Ok(()) => {
                        accepted.insert(JobId(id));
                    }
                    Err(e) if e.is_recoverable() => tokio::task::yield_now().await,
                    Err(_) => break,
                }
            }
            accepted
        }));
    }

    let consumer = {
        let pool = pool.clone();
        tokio::spawn(async move {
            let mut received = Vec::new();
            while let Some(result) = pool.get_result().await {
                received.push(result.job_id);
            }
            received
        })
    };

    let stopper = {
        let pool = pool.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            pool.stop().await;
        })
    };

    let (accepted, received) = tokio::time::timeout(Duration::from_secs(10), async {
        stopper.await.unwrap();
        let mut accepted = HashSet::new();
        for handle in submitters {
            accepted.extend(handle.await.unwrap());
        }
        (accepted, consumer.await.unwrap())
    })
    .await
    .expect("shutdown must terminate");

    let unique: HashSet<JobId> = received.iter().copied().collect();
    assert_eq!(unique.len(), received.len(), "a job produced two results");
    assert_eq!(unique, accepted);
    assert_eq!(pool.lane_len(Lane::High) + pool.lane_len(Lane::Low), 0);
    assert_eq!(pool.worker_count(), 0);
}

/// E2. Stop and abort may both be called, repeatedly
#[tokio::test]
async fn test_repeated_shutdown_is_harmless() {
    let pool = WorkerPool::new(Simulated::new(), 2, 4).unwrap();
    pool.start();
    pool.submit_job(sleep_job(1, 10)).unwrap();

    pool.stop().await;
    pool.stop().await;
    pool.abort().await;

    assert_eq!(next_result(&pool).await.job_id, JobId(1));
    assert!(pool.get_result().await.is_none());
}

/// F1. Lifecycle events are observable as a stream
#[tokio::test]
async fn test_event_stream() {
    let pool = WorkerPool::new(Simulated::new(), 1, 4).unwrap();
    let mut events = pool.event_stream();

    pool.submit_job(sleep_job(7, 10)).unwrap();
    pool.start();

    let submitted = next_event(&mut events).await;
    assert_eq!(submitted.event_name(), "submitted");
    assert_eq!(submitted.job_id(), Some(JobId(7)));

    let started = next_event(&mut events).await;
    assert_eq!(started.event_name(), "started");

    let completed = next_event(&mut events).await;
    assert_eq!(completed.event_name(), "completed");
    assert_eq!(completed.job_id(), Some(JobId(7)));

    pool.stop().await;
    let stopped = next_event(&mut events).await;
    assert_eq!(stopped.event_name(), "worker_stopped");
}

/// F2. Metrics track every outcome
#[tokio::test]
async fn test_metrics_snapshot() {
    let pool = WorkerPool::new(Simulated::new(), 2, 2).unwrap();
    pool.submit_job(sleep_job(1, 5)).unwrap();
    pool.submit_job(Job::new(2, Workload::fail(Duration::from_millis(5), "nope"))).unwrap();
    assert!(pool.submit_job(sleep_job(3, 5)).is_err());

    pool.start();
    pool.stop().await;

    let snapshot = pool.snapshot();
    assert_eq!(snapshot.jobs_submitted, 2);
    assert_eq!(snapshot.jobs_rejected, 1);
    assert_eq!(snapshot.jobs_completed, 1);
    assert_eq!(snapshot.jobs_failed, 1);
    assert_eq!(snapshot.jobs_in_flight(), 0);
    assert!(snapshot.average_duration.is_some());
}
