use adaptive_thread_system::prelude::*;
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use rand::Rng;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn benchmark_pool_lifecycle(c: &mut Criterion) {
    c.bench_function("pool_start_stop", |b| {
        b.iter(|| {
            let pool = Pool::with_workers(1, 4, 4).expect("Failed to create pool");
            pool.start().expect("Failed to start pool");
            pool.stop().expect("Failed to stop pool");
        });
    });
}

fn benchmark_priority_queue(c: &mut Criterion) {
    let mut group = c.benchmark_group("priority_queue");

    group.bench_function("push_pop_1000_mixed", |b| {
        let mut rng = rand::thread_rng();
        let priorities: Vec<Priority> = (0..1000)
            .map(|_| Priority::ALL[rng.gen_range(0..Priority::ALL.len())])
            .collect();

        b.iter(|| {
            let queue = PriorityQueue::with_capacity(priorities.len());
            for &priority in &priorities {
                queue.push(Task::new(priority, || {}));
            }
            while let Some(task) = queue.try_pop() {
                black_box(task.priority());
            }
        });
    });

    group.finish();
}

fn benchmark_task_submission(c: &mut Criterion) {
    let mut group = c.benchmark_group("task_submission");

    // Lightweight tasks
    group.bench_function("lightweight_tasks_100", |b| {
        b.iter_batched(
            || {
                let pool = Pool::with_workers(1, 4, 4).expect("Failed to create pool");
                pool.start().expect("Failed to start pool");
                pool
            },
            |pool| {
                let handles: Vec<_> = (0..100)
                    .map(|_| pool.submit(|| black_box(1 + 1)).expect("Failed to submit task"))
                    .collect();
                for handle in handles {
                    handle.wait().expect("Task failed");
                }
                pool.stop().expect("Failed to stop pool");
            },
            BatchSize::SmallInput,
        );
    });

    // Medium workload with random priorities
    group.bench_function("medium_tasks_100_mixed_priority", |b| {
        b.iter_batched(
            || {
                let pool = Pool::with_workers(1, 4, 4).expect("Failed to create pool");
                pool.start().expect("Failed to start pool");
                let mut rng = rand::thread_rng();
                let priorities: Vec<Priority> = (0..100)
                    .map(|_| Priority::ALL[rng.gen_range(0..Priority::ALL.len())])
                    .collect();
                (pool, priorities)
            },
            |(pool, priorities)| {
                let handles: Vec<_> = priorities
                    .into_iter()
                    .map(|priority| {
                        pool.submit_with_priority(priority, || {
                            // Simulate some work
                            let mut sum = 0u64;
                            for i in 0..1000 {
                                sum = sum.wrapping_add(i);
                            }
                            black_box(sum)
                        })
                        .expect("Failed to submit task")
                    })
                    .collect();
                for handle in handles {
                    handle.wait().expect("Task failed");
                }
                pool.stop().expect("Failed to stop pool");
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

fn benchmark_concurrent_submission(c: &mut Criterion) {
    c.bench_function("concurrent_submission_4_threads", |b| {
        b.iter_batched(
            || {
                let pool = Pool::with_workers(1, 4, 4).expect("Failed to create pool");
                pool.start().expect("Failed to start pool");
                Arc::new(pool)
            },
            |pool| {
                let submitters: Vec<_> = (0..4)
                    .map(|_| {
                        let pool = Arc::clone(&pool);
                        std::thread::spawn(move || {
                            (0..25)
                                .map(|_| pool.submit(|| ()).expect("Failed to submit task"))
                                .collect::<Vec<_>>()
                        })
                    })
                    .collect();

                for submitter in submitters {
                    for handle in submitter.join().expect("Thread panicked") {
                        handle.wait().expect("Task failed");
                    }
                }
                pool.stop().expect("Failed to stop pool");
            },
            BatchSize::SmallInput,
        );
    });
}

fn benchmark_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("throughput");
    group.measurement_time(Duration::from_secs(10));

    group.bench_function("tasks_per_second", |b| {
        b.iter_batched(
            || {
                let config = PoolConfig::new(1, 8, 8).with_monitor_interval(Duration::from_millis(10));
                let pool = Pool::with_config(config).expect("Failed to create pool");
                pool.start().expect("Failed to start pool");
                let counter = Arc::new(AtomicU64::new(0));
                (pool, counter)
            },
            |(pool, counter)| {
                let handles: Vec<_> = (0..1000)
                    .map(|_| {
                        let counter = Arc::clone(&counter);
                        pool.submit(move || {
                            counter.fetch_add(1, Ordering::Relaxed);
                        })
                        .expect("Failed to submit task")
                    })
                    .collect();
                for handle in handles {
                    handle.wait().expect("Task failed");
                }
                pool.stop().expect("Failed to stop pool");

                // Verify all tasks completed
                let total = counter.load(Ordering::Relaxed);
                assert_eq!(total, 1000, "Not all tasks completed");
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

fn benchmark_autoscaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("autoscaling");
    group.sample_size(10);

    group.bench_function("burst_from_one_worker", |b| {
        b.iter_batched(
            || {
                let config = PoolConfig::new(1, 1, 8).with_monitor_interval(Duration::from_millis(5));
                let pool = Pool::with_config(config).expect("Failed to create pool");
                pool.start().expect("Failed to start pool");
                pool
            },
            |pool| {
                let handles: Vec<_> = (0..200)
                    .map(|_| {
                        pool.submit(|| std::thread::sleep(Duration::from_micros(200)))
                            .expect("Failed to submit task")
                    })
                    .collect();
                for handle in handles {
                    handle.wait().expect("Task failed");
                }
                black_box(pool.worker_count());
                pool.stop().expect("Failed to stop pool");
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_pool_lifecycle,
    benchmark_priority_queue,
    benchmark_task_submission,
    benchmark_concurrent_submission,
    benchmark_throughput,
    benchmark_autoscaling
);
criterion_main!(benches);
