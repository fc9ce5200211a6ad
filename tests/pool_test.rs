//! Integration tests for the worker pool

use cryptpool::prelude::*;
use cryptpool::transform::TransformError;
use rand::Rng;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

type TransformResult = std::result::Result<(), TransformError>;

fn numbered_jobs(n: usize) -> Vec<Job> {
    (0..n)
        .map(|i| Job::new(format!("job-{}", i), Action::Encrypt))
        .collect()
}

fn job_index(job: &Job) -> usize {
    job.target()
        .trim_start_matches("job-")
        .parse()
        .expect("numbered job")
}

#[test]
fn test_every_job_delivered_exactly_once() {
    // 8 workers, capacity 4, 1000 jobs
    let markers: Arc<Vec<AtomicBool>> = Arc::new((0..1000).map(|_| AtomicBool::new(false)).collect());
    let duplicates = Arc::new(AtomicUsize::new(0));

    let m = Arc::clone(&markers);
    let d = Arc::clone(&duplicates);
    let transform = Arc::new(move |job: &Job| -> TransformResult {
        if m[job_index(job)].swap(true, Ordering::SeqCst) {
            d.fetch_add(1, Ordering::SeqCst);
        }
        // Jitter so workers interleave differently on every run
        let pause = rand::thread_rng().gen_range(0..50);
        thread::sleep(Duration::from_micros(pause));
        Ok(())
    });

    let config = PoolConfig::new(8).with_queue_capacity(4);
    let result = run_batch(config, numbered_jobs(1000), transform).expect("batch failed");

    assert_eq!(duplicates.load(Ordering::SeqCst), 0);
    assert!(markers.iter().all(|m| m.load(Ordering::SeqCst)));
    assert_eq!(result.jobs_submitted(), 1000);
    assert_eq!(result.jobs_succeeded(), 1000);
    assert_eq!(result.records.len(), 1000);
    assert_eq!(result.workers.len(), 8);
    assert!(result.queue.high_water_mark <= 4);

    let taken: u64 = result.workers.values().map(|w| w.stats.jobs_taken()).sum();
    assert_eq!(taken, 1000);
    assert!(result.is_success());
}

#[test]
fn test_small_batch_fits_in_queue() {
    let counter = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&counter);
    let transform = Arc::new(move |_: &Job| -> TransformResult {
        c.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });

    let config = PoolConfig::new(3).with_queue_capacity(16);
    let result = run_batch(config, numbered_jobs(10), transform).unwrap();

    assert_eq!(counter.load(Ordering::SeqCst), 10);
    assert_eq!(result.jobs_succeeded(), 10);
    assert_eq!(result.queue.submit.blocked_submissions, 0);
}

#[test]
fn test_occupancy_never_exceeds_capacity() {
    let pool_queue: Arc<parking_lot::Mutex<Option<Arc<BoundedJobQueue>>>> =
        Arc::new(parking_lot::Mutex::new(None));
    let max_seen = Arc::new(AtomicUsize::new(0));

    let q = Arc::clone(&pool_queue);
    let seen = Arc::clone(&max_seen);
    let transform = Arc::new(move |_: &Job| -> TransformResult {
        if let Some(queue) = q.lock().as_ref() {
            seen.fetch_max(queue.len(), Ordering::SeqCst);
        }
        thread::sleep(Duration::from_micros(200));
        Ok(())
    });

    let pool = WorkerPool::start(PoolConfig::new(2).with_queue_capacity(3), transform).unwrap();
    *pool_queue.lock() = Some(Arc::clone(pool.queue()));

    for job in numbered_jobs(200) {
        pool.submit(&job).unwrap();
        assert!(pool.queue().len() <= 3);
    }
    pool.close();
    let result = pool.wait_all();

    assert_eq!(result.jobs_succeeded(), 200);
    assert!(max_seen.load(Ordering::SeqCst) <= 3);
    assert!(result.queue.high_water_mark <= 3);
    assert!(result.queue.submit.blocked_submissions > 0);
}

#[test]
fn test_single_worker_preserves_fifo() {
    let transform = Arc::new(|_: &Job| -> TransformResult { Ok(()) });
    let config = PoolConfig::new(1).with_queue_capacity(5);
    let result = run_batch(config, numbered_jobs(50), transform).unwrap();

    let order: Vec<usize> = result.records.iter().map(|r| job_index(&r.job)).collect();
    assert_eq!(order, (0..50).collect::<Vec<_>>());
}

#[test]
fn test_example_scenario_capacity_two_one_worker() {
    let transform = Arc::new(|_: &Job| -> TransformResult {
        thread::sleep(Duration::from_millis(5));
        Ok(())
    });
    let jobs = ["a.txt,ENCRYPT", "b.txt,DECRYPT", "c.txt,ENCRYPT"]
        .iter()
        .map(|s| Job::decode(s).unwrap())
        .collect::<Vec<_>>();

    let config = PoolConfig::new(1).with_queue_capacity(2);
    let result = run_batch(config, jobs, transform).unwrap();

    let order: Vec<String> = result.records.iter().map(|r| r.job.encode()).collect();
    assert_eq!(order, vec!["a.txt,ENCRYPT", "b.txt,DECRYPT", "c.txt,ENCRYPT"]);
    assert_eq!(result.jobs_succeeded(), 3);
    assert!(result.queue.high_water_mark <= 2);
}

#[test]
fn test_failure_is_isolated() {
    let transform = Arc::new(|job: &Job| -> TransformResult {
        if job.target() == "job-13" {
            Err(TransformError::other("cannot open job-13"))
        } else {
            Ok(())
        }
    });

    let config = PoolConfig::new(4).with_queue_capacity(8);
    let result = run_batch(config, numbered_jobs(100), transform).unwrap();

    assert_eq!(result.jobs_succeeded(), 99);
    let failures: Vec<_> = result.failures().collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].job.target(), "job-13");
    assert_eq!(
        failures[0].status,
        JobStatus::Failed("cannot open job-13".to_string())
    );
    assert!(result.workers.values().all(|w| w.exit == WorkerExit::Clean));
    assert!(!result.is_success());
}

#[test]
fn test_panicking_job_does_not_kill_worker() {
    let transform = Arc::new(|job: &Job| -> TransformResult {
        if job.target() == "job-2" {
            panic!("transform blew up");
        }
        Ok(())
    });

    let config = PoolConfig::new(1).with_queue_capacity(2);
    let result = run_batch(config, numbered_jobs(5), transform).unwrap();

    assert_eq!(result.jobs_succeeded(), 4);
    assert_eq!(
        result.records[2].status,
        JobStatus::Panicked("transform blew up".to_string())
    );
    assert_eq!(result.workers[&0].exit, WorkerExit::Clean);
    assert_eq!(result.workers[&0].stats.jobs_panicked, 1);
}

fn assert_finishes_within(timeout: Duration, pool: WorkerPool) -> AggregateResult {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let _ = tx.send(pool.wait_all());
    });
    rx.recv_timeout(timeout)
        .expect("workers did not exit after close")
}

#[test]
fn test_parked_workers_exit_after_close() {
    let transform = Arc::new(|_: &Job| -> TransformResult { Ok(()) });
    let pool = WorkerPool::start(PoolConfig::new(6).with_queue_capacity(4), transform).unwrap();

    // Let every worker park on the empty queue
    thread::sleep(Duration::from_millis(50));
    pool.close();

    let result = assert_finishes_within(Duration::from_secs(5), pool);
    assert_eq!(result.workers.len(), 6);
    assert!(result.workers.values().all(|w| w.exit == WorkerExit::Clean));
}

#[test]
fn test_polling_workers_exit_after_close() {
    let transform = Arc::new(|_: &Job| -> TransformResult { Ok(()) });
    let config = PoolConfig::new(4)
        .with_queue_capacity(4)
        .with_poll_interval(Duration::from_millis(10));
    let pool = WorkerPool::start(config, transform).unwrap();

    for job in numbered_jobs(20) {
        pool.submit(&job).unwrap();
    }
    pool.close();

    let result = assert_finishes_within(Duration::from_secs(5), pool);
    assert_eq!(result.jobs_succeeded(), 20);
}

#[test]
fn test_close_with_jobs_in_flight_drains_everything() {
    let transform = Arc::new(|_: &Job| -> TransformResult {
        thread::sleep(Duration::from_millis(2));
        Ok(())
    });
    let pool = WorkerPool::start(PoolConfig::new(3).with_queue_capacity(10), transform).unwrap();

    for job in numbered_jobs(10) {
        pool.submit(&job).unwrap();
    }
    // Close while the queue is still full
    pool.close();

    let result = assert_finishes_within(Duration::from_secs(5), pool);
    assert_eq!(result.jobs_succeeded(), 10);
}

#[test]
fn test_unbounded_poll_interval_still_drains() {
    let transform = Arc::new(|_: &Job| -> TransformResult { Ok(()) });
    let config = PoolConfig::new(2)
        .with_queue_capacity(2)
        .with_poll_interval(Duration::MAX);
    let pool = WorkerPool::start(config, transform).unwrap();

    for job in numbered_jobs(10) {
        pool.submit(&job).unwrap();
    }
    pool.close();

    let result = assert_finishes_within(Duration::from_secs(5), pool);
    assert_eq!(result.jobs_succeeded(), 10);
    assert!(result.workers.values().all(|w| w.exit == WorkerExit::Clean));
}

#[test]
fn test_unbounded_submit_timeout_blocks_like_block() {
    let transform = Arc::new(|_: &Job| -> TransformResult {
        thread::sleep(Duration::from_millis(1));
        Ok(())
    });
    let config = PoolConfig::new(1)
        .with_queue_capacity(1)
        .with_submit_policy(SubmitPolicy::BlockWithTimeout(Duration::MAX));
    let pool = WorkerPool::start(config, transform).unwrap();

    for job in numbered_jobs(5) {
        pool.submit(&job).unwrap();
    }
    pool.close();

    let result = assert_finishes_within(Duration::from_secs(5), pool);
    assert_eq!(result.jobs_succeeded(), 5);
    assert!(result.rejected.is_empty());
}
