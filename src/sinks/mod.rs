//! Sink implementations

pub mod console;
#[cfg(feature = "file")]
pub mod file;
pub mod json;
pub mod memory;
pub mod null;
pub mod reporting;

pub use console::ConsoleSink;
#[cfg(feature = "file")]
pub use file::FileSink;
pub use json::JsonSink;
pub use memory::{MemoryLog, MemorySink};
pub use null::NullSink;
pub use reporting::{Display, DisplaySink, Reporter, ReportingSink};

// Re-export traits for implementing custom sinks
pub use crate::core::{BufferSink, Sink, StreamSink};
