//! Autoscaling example
//!
//! Sends a burst of slow tasks at a single worker and prints the roster size
//! as the pool grows under backlog and shrinks again once idle.
//!
//! Run with: RUST_LOG=adaptive_thread_system=debug cargo run --example autoscaling

use adaptive_thread_system::prelude::*;
use std::thread;
use std::time::{Duration, Instant};

fn main() -> Result<()> {
    env_logger::init();
    println!("=== Adaptive Thread System - Autoscaling Example ===\n");

    let config = PoolConfig::new(1, 1, 6)
        .with_monitor_interval(Duration::from_millis(50))
        .with_thread_name_prefix("scaler");
    let pool = Pool::with_config(config)?;
    pool.start()?;

    let handles: Vec<_> = (0..120)
        .map(|_| pool.submit(|| thread::sleep(Duration::from_millis(25))))
        .collect::<Result<_>>()?;

    let start = Instant::now();
    while handles.iter().any(|h| !h.is_ready()) {
        println!(
            "   t={:>5}ms workers={} pending={}",
            start.elapsed().as_millis(),
            pool.worker_count(),
            pool.pending_task_count()
        );
        thread::sleep(Duration::from_millis(100));
    }
    println!("   Burst finished in {}ms", start.elapsed().as_millis());

    for _ in 0..5 {
        thread::sleep(Duration::from_millis(100));
        println!("   idle: workers={}", pool.worker_count());
    }

    pool.stop()?;
    println!("\n   {}", serde_json::to_string(&pool.stats()).unwrap_or_default());
    Ok(())
}
