//! Performance mode example
//!
//! Demonstrates moving formatting and output to the background worker, with
//! several threads logging at once.
//!
//! Run with: cargo run --example async_logging

use rust_unit_logging::prelude::*;
use std::thread;
use std::time::Duration;

fn main() -> Result<()> {
    println!("=== Rust Unit Logging - Performance Mode Example ===\n");

    let registry = Registry::builder()
        .performance_interval(Duration::from_millis(50))
        .build();
    registry.enable_global_performance_mode()?;

    let logger = registry.logger("worker")?;
    logger.attach_stream(ConsoleSink::stdout());
    #[cfg(feature = "file")]
    logger.attach_stream(FileSink::new("async_test.log")?);

    println!("1. Log calls only enqueue:");

    for i in 0..100 {
        logger.li("Message #[]", vec![arg(i)]);
    }

    println!("   Queued: {}", registry.queued());

    println!("\n2. Multi-threaded logging:");

    thread::scope(|s| {
        for thread_id in 0..5 {
            let logger = logger.clone();
            s.spawn(move || {
                for i in 0..20 {
                    logger.li("Thread [] - Message []", vec![arg(thread_id), arg(i)]);
                    thread::sleep(Duration::from_millis(10));
                }
            });
        }
    });

    println!("   5 threads logged 20 messages each");

    // Drains the queue, exits every log and stops the worker
    registry.close_all()?;

    println!(
        "\n   Delivered: {}, queued overall: {}",
        logger.metrics().total_logged(),
        logger.metrics().queued()
    );

    println!("\n=== Example completed successfully! ===");

    Ok(())
}
