//! Basic pool usage example
//!
//! Demonstrates pool creation, prioritized submission, pause/resume and
//! statistics tracking.
//!
//! Run with: cargo run --example basic_usage

use adaptive_thread_system::prelude::*;
use std::thread;
use std::time::Duration;

fn main() -> Result<()> {
    env_logger::init();
    println!("=== Adaptive Thread System - Basic Usage Example ===\n");

    // Between 1 and 4 workers, starting with 2
    let pool = Pool::with_workers(1, 2, 4)?;

    println!("1. Starting pool with {} initial workers", pool.config().initial_workers);
    pool.start()?;
    println!("   Status: {}", pool.status());

    println!("\n2. Submitting tasks with results:");
    let handles: Vec<_> = (1..=5u64)
        .map(|n| pool.submit(move || (1..=n).product::<u64>()))
        .collect::<Result<_>>()?;
    for (n, handle) in (1..=5).zip(handles) {
        println!("   {}! = {}", n, handle.wait()?);
    }

    println!("\n3. Priorities while paused:");
    pool.pause();
    println!("   Status: {}", pool.status());
    let handles: Vec<_> = [Priority::Low, Priority::Highest, Priority::Normal]
        .into_iter()
        .map(|priority| {
            pool.submit_with_priority(priority, move || {
                println!("   -> {:?} task on {:?}", priority, thread::current().name());
            })
        })
        .collect::<Result<_>>()?;
    println!("   Pending while paused: {}", pool.pending_task_count());
    thread::sleep(Duration::from_millis(200));
    pool.resume();
    for handle in handles {
        handle.wait()?;
    }

    println!("\n4. Payload failures stay in their handle:");
    let failing = pool.submit(|| -> u32 { panic!("bad record") })?;
    match failing.wait() {
        Err(e) => println!("   Got error: {}", e),
        Ok(v) => println!("   Unexpected value {}", v),
    }

    println!("\n5. Per-worker statistics:");
    for (i, stat) in pool.get_stats().iter().enumerate() {
        println!(
            "   Worker {}: {} executed, {} panicked, avg time: {:.2}μs",
            i,
            stat.get_tasks_executed(),
            stat.get_tasks_panicked(),
            stat.get_average_processing_time_us()
        );
    }

    println!("\n6. Stopping pool...");
    pool.stop()?;
    let stats = pool.stats();
    println!(
        "   Submitted: {}, executed: {}, status: {}",
        stats.tasks_submitted, stats.tasks_executed, stats.status
    );

    println!("\n=== Example completed successfully ===");
    Ok(())
}
