use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use cryptpool::prelude::*;
use std::sync::Arc;
use std::thread;

fn jobs(n: usize) -> Vec<Job> {
    (0..n)
        .map(|i| Job::new(format!("dir/file-{}.bin", i), Action::Encrypt))
        .collect()
}

fn benchmark_single_thread_ring(c: &mut Criterion) {
    let queue = BoundedJobQueue::new(64);
    let job = Job::new("dir/file.bin", Action::Decrypt);

    c.bench_function("submit_take_single_thread", |b| {
        b.iter(|| {
            queue.try_submit(black_box(&job)).expect("queue full");
            black_box(queue.try_take().expect("queue empty"));
        });
    });
}

fn benchmark_producer_consumers(c: &mut Criterion) {
    let mut group = c.benchmark_group("producer_consumers");
    let batch = jobs(1000);
    group.throughput(Throughput::Elements(batch.len() as u64));

    for consumers in [1usize, 4, 8] {
        group.bench_with_input(
            BenchmarkId::from_parameter(consumers),
            &consumers,
            |b, &consumers| {
                b.iter(|| {
                    let queue = Arc::new(BoundedJobQueue::new(4));
                    let handles: Vec<_> = (0..consumers)
                        .map(|_| {
                            let q = Arc::clone(&queue);
                            thread::spawn(move || {
                                let mut taken = 0usize;
                                while q.take().is_ok() {
                                    taken += 1;
                                }
                                taken
                            })
                        })
                        .collect();

                    for job in &batch {
                        queue.submit(job).expect("submit failed");
                    }
                    queue.close(consumers);

                    let total: usize = handles.into_iter().map(|h| h.join().unwrap_or(0)).sum();
                    assert_eq!(total, batch.len());
                });
            },
        );
    }
    group.finish();
}

fn benchmark_run_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("run_batch");
    let transform: Arc<dyn Transform> =
        Arc::new(|job: &Job| -> std::result::Result<(), TransformError> {
            black_box(job.target().len());
            Ok(())
        });

    for capacity in [1usize, 16, 1000] {
        group.bench_with_input(
            BenchmarkId::new("capacity", capacity),
            &capacity,
            |b, &capacity| {
                b.iter(|| {
                    let config = PoolConfig::new(4).with_queue_capacity(capacity);
                    let result = run_batch(config, jobs(500), Arc::clone(&transform))
                        .expect("batch failed");
                    black_box(result.jobs_succeeded());
                });
            },
        );
    }
    group.finish();
}

criterion_group!(
    benches,
    benchmark_single_thread_ring,
    benchmark_producer_consumers,
    benchmark_run_batch
);
criterion_main!(benches);
