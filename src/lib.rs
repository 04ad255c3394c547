//! # Rust Unit Logging
//!
//! A registry of named logs with level inheritance between units, fan-out to
//! several sinks with independent formats and update cadences, and an
//! optional performance mode that moves formatting and output to a
//! background worker.
//!
//! ## Features
//!
//! - **Named logs**: create-or-get by name, cascading exits from parent to
//!   child logs
//! - **Level propagation**: a level set on a unit reaches every child that
//!   has no level of its own
//! - **Multiple sinks**: console, file, JSON lines, in-memory and reporting
//!   buffers, or your own
//! - **Batched updates**: buffer sinks can be updated on a cadence instead
//!   of per record
//! - **Performance mode**: log calls only enqueue; one worker formats and
//!   writes
//!
//! ## Example
//!
//! ```
//! use rust_unit_logging::prelude::*;
//!
//! let registry = Registry::builder().default_sink("null").build();
//! let app = registry.get_or_create("app", None, false, Some(LogLevel::Info)).unwrap();
//! let db = registry.get_or_create("db", Some("app"), false, None).unwrap();
//! db.add_parent(&app);
//!
//! app.set_level(LogLevel::Warn);
//! assert_eq!(db.level(), Some(LogLevel::Warn));
//!
//! db.lw("pool at [] connections", vec![arg(95)]);
//! registry.exit("app", true).unwrap();
//! ```

pub mod core;
pub mod macros;
pub mod sinks;

pub mod prelude {
    pub use crate::core::{
        arg, Argument, BufferSink, DebugItem, DumbLog, FormatFlags, LogCalls, LogFacade,
        LogLevel, Logger, LoggerError, LoggerMetrics, LoggerState, Registry, RegistryBuilder,
        RegistryConfig, Result, Sink, SinkHandle, SinkId, StreamSink, DEFAULT_SHUTDOWN_TIMEOUT,
    };
    #[cfg(feature = "file")]
    pub use crate::sinks::FileSink;
    pub use crate::sinks::{ConsoleSink, MemoryLog, MemorySink, NullSink};
}

pub use core::{
    arg, compose, is_displayed, Argument, BufferSink, DebugItem, DumbLog, FormatFlags, LevelState,
    LogCalls, LogFacade, LogLevel, Logger, LoggerError, LoggerMetrics, LoggerState, Registry,
    RegistryBuilder, RegistryConfig, Result, Sink, SinkFactory, SinkHandle, SinkId, StreamSink,
    UnitGraph, UnitId, DEFAULT_PERFORMANCE_INTERVAL, DEFAULT_SHUTDOWN_TIMEOUT, MASTER_LOG_NAME,
};
#[cfg(feature = "file")]
pub use sinks::FileSink;
pub use sinks::{ConsoleSink, JsonSink, MemoryLog, MemorySink, NullSink};
