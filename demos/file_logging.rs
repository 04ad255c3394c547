//! File logging example
//!
//! Demonstrates one log writing to the console and to a file, each sink
//! with its own line format.
//!
//! Run with: cargo run --example file_logging

use rust_unit_logging::prelude::*;

fn main() -> Result<()> {
    println!("=== Rust Unit Logging - File Logging Example ===\n");

    let registry = Registry::new();
    let logger = registry.logger("service")?;

    // Console gets the short format, the file also gets a detailed timestamp
    logger.attach_stream(ConsoleSink::stdout());
    logger.attach_stream(FileSink::new("application.log")?);

    println!("1. Logging to both console and file:");

    logger.info("Application started");
    logger.trace("Loading configuration...");
    logger.info("Configuration loaded successfully");
    logger.warn("Using default settings for some options");
    logger.error("Failed to load optional plugin");

    println!("\n2. Performing some operations:");

    for i in 1..=5 {
        logger.li("Processing item []/5", vec![arg(i)]);
        if i == 3 {
            logger.lw("Item [] took longer than expected", vec![arg(i)]);
        }
    }

    logger.info("All operations completed");

    // Exiting flushes and closes the file
    logger.exit(true)?;

    println!("\n=== Example completed successfully! ===");
    println!("Check 'application.log' for the full log output");

    Ok(())
}
