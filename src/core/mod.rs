//! Core registry, logger and dispatch types

pub mod adapters;
pub mod config;
mod dispatcher;
pub mod error;
mod fanout;
pub mod format;
pub mod hierarchy;
pub mod log_level;
pub mod logger;
pub mod metrics;
pub mod registry;
pub mod scheduler;
pub mod sink;

pub use adapters::{DebugItem, DumbLog, LogCalls, LogFacade};
pub use config::{
    RegistryConfig, DEFAULT_HIGHLIGHT_INDENT, DEFAULT_PERFORMANCE_INTERVAL,
    DEFAULT_SHUTDOWN_TIMEOUT, DEFAULT_SINK_TYPE,
};
pub use error::{LoggerError, Result};
pub use format::{arg, compose, Argument, FormatFlags};
pub use hierarchy::{LevelState, UnitGraph, UnitId};
pub use log_level::{is_displayed, LogLevel};
pub use logger::{Logger, LoggerState};
pub use metrics::LoggerMetrics;
pub use registry::{Registry, RegistryBuilder, SinkFactory, MASTER_LOG_NAME};
pub use scheduler::FlushScheduler;
pub use sink::{BufferSink, Sink, SinkHandle, SinkId, StreamSink};
