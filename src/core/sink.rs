//! Sink traits for log output destinations
//!
//! A sink is either stream-backed ([`StreamSink`]: formatted bytes are written
//! as they come) or buffer-backed ([`BufferSink`]: formatted text is handed
//! over as a string, immediately or in batches).

use super::error::Result;
use super::format::FormatFlags;
use super::log_level::LogLevel;
use chrono::{DateTime, Utc};
use std::fmt;

/// Settings every sink declares
pub trait Sink: Send {
    fn name(&self) -> &str;

    /// Milliseconds between batched updates; `<= 0` updates on every record
    fn update_cadence_millis(&self) -> i64 {
        0
    }

    fn format_flags(&self) -> FormatFlags {
        FormatFlags::INCLUDE_NAME
    }

    /// When `true`, [`Sink::format`] replaces the default line format
    fn uses_custom_format(&self) -> bool {
        false
    }

    fn format(&self, level: LogLevel, source: &str, message: &str) -> String {
        let _ = (level, source);
        message.to_string()
    }

    /// [`Sink::format`] given the time the record was logged, which in
    /// performance mode precedes the moment it is formatted. Override it
    /// when the custom format shows a timestamp.
    fn format_at(
        &self,
        level: LogLevel,
        source: &str,
        message: &str,
        timestamp: DateTime<Utc>,
    ) -> String {
        let _ = timestamp;
        self.format(level, source, message)
    }

    /// Last touch on a line built by the default formatter, e.g. coloring
    fn decorate(&self, level: LogLevel, line: String) -> String {
        let _ = level;
        line
    }

    /// Called exactly once, when the sink is detached or its log exits.
    ///
    /// Releases resources the sink owns; must not close shared streams such
    /// as standard output.
    fn on_detach(&mut self) -> Result<()> {
        Ok(())
    }
}

pub trait StreamSink: Sink {
    fn write(&mut self, formatted: &[u8]) -> Result<()>;

    fn flush_now(&mut self) -> Result<()>;
}

pub trait BufferSink: Sink {
    /// Receives one update carrying one or more formatted records
    fn update(&mut self, text: &str) -> Result<()>;

    /// `true`: every update carries the whole log so far.
    /// `false`: every update carries only what is new since the last one.
    fn retain_full_history(&self) -> bool {
        false
    }
}

/// A sink ready to be attached to a log
pub enum SinkHandle {
    Stream(Box<dyn StreamSink>),
    Buffer(Box<dyn BufferSink>),
}

impl SinkHandle {
    pub fn stream<S: StreamSink + 'static>(sink: S) -> Self {
        SinkHandle::Stream(Box::new(sink))
    }

    pub fn buffer<B: BufferSink + 'static>(sink: B) -> Self {
        SinkHandle::Buffer(Box::new(sink))
    }

    pub fn name(&self) -> &str {
        match self {
            SinkHandle::Stream(s) => s.name(),
            SinkHandle::Buffer(b) => b.name(),
        }
    }

    pub fn update_cadence_millis(&self) -> i64 {
        match self {
            SinkHandle::Stream(s) => s.update_cadence_millis(),
            SinkHandle::Buffer(b) => b.update_cadence_millis(),
        }
    }

    pub fn format_flags(&self) -> FormatFlags {
        match self {
            SinkHandle::Stream(s) => s.format_flags(),
            SinkHandle::Buffer(b) => b.format_flags(),
        }
    }

    pub fn uses_custom_format(&self) -> bool {
        match self {
            SinkHandle::Stream(s) => s.uses_custom_format(),
            SinkHandle::Buffer(b) => b.uses_custom_format(),
        }
    }

    pub fn format(&self, level: LogLevel, source: &str, message: &str) -> String {
        match self {
            SinkHandle::Stream(s) => s.format(level, source, message),
            SinkHandle::Buffer(b) => b.format(level, source, message),
        }
    }

    pub fn format_at(
        &self,
        level: LogLevel,
        source: &str,
        message: &str,
        timestamp: DateTime<Utc>,
    ) -> String {
        match self {
            SinkHandle::Stream(s) => s.format_at(level, source, message, timestamp),
            SinkHandle::Buffer(b) => b.format_at(level, source, message, timestamp),
        }
    }

    pub fn decorate(&self, level: LogLevel, line: String) -> String {
        match self {
            SinkHandle::Stream(s) => s.decorate(level, line),
            SinkHandle::Buffer(b) => b.decorate(level, line),
        }
    }

    pub fn on_detach(&mut self) -> Result<()> {
        match self {
            SinkHandle::Stream(s) => s.on_detach(),
            SinkHandle::Buffer(b) => b.on_detach(),
        }
    }

    pub fn is_stream(&self) -> bool {
        matches!(self, SinkHandle::Stream(_))
    }
}

impl fmt::Debug for SinkHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.is_stream() { "Stream" } else { "Buffer" };
        f.debug_struct("SinkHandle")
            .field("kind", &kind)
            .field("name", &self.name())
            .finish()
    }
}

/// Identifies an attached sink within its log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SinkId(pub(crate) u64);

impl SinkId {
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sink#{}", self.0)
    }
}
