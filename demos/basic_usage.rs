//! Basic registry usage example
//!
//! Demonstrates named logs on the console, level filtering, level
//! propagation from a parent unit and cascading exits.
//!
//! Run with: cargo run --example basic_usage

use rust_unit_logging::prelude::*;
use rust_unit_logging::{le, li};

fn main() -> Result<()> {
    println!("=== Rust Unit Logging - Basic Usage Example ===\n");

    let registry = Registry::new();

    // Logs without a sink get a console sink at their first message
    let app = registry.get_or_create("app", None, false, Some(LogLevel::Trace))?;
    let db = registry.get_or_create("db", Some("app"), false, None)?;
    db.add_parent(&app);

    println!("1. Logging at different levels:");
    app.trace("This is a trace message");
    app.info("This is an info message");
    app.warn("This is a warning message");
    app.error("This is an error message");

    println!("\n2. Arguments fill the [] markers:");
    li!(db, "pool of [] connections ready on []", 8, "localhost:5432");
    le!(db, "query failed", 1205, "lock wait timeout");

    println!("\n3. Level set on the parent reaches the child:");
    app.set_level(LogLevel::Warn);
    db.info("Info message (hidden)");
    db.warn("Warning message (visible)");

    println!("\n4. Highlighting one log indents the others:");
    db.set_highlighted(true);
    db.warn("highlighted");
    app.warn("indented");
    db.set_highlighted(false);

    println!("\n5. Exiting the parent exits the child first:");
    app.set_level(LogLevel::Trace);
    registry.exit("app", true)?;
    println!("   Logs left in the registry: {}", registry.len());

    println!("\n=== Example completed successfully! ===");

    Ok(())
}
