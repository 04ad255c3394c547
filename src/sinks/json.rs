//! JSON-lines sink
//!
//! Writes each record as a single-line JSON object (JSONL format), through
//! a custom format. Compatible with log aggregation tools like ELK, Loki,
//! etc.

use crate::core::{LogLevel, LoggerError, Result, Sink, StreamSink};
use chrono::{DateTime, Utc};
use serde_json::json;
use std::io::Write;

/// Stream sink writing JSON lines to any writer it owns
pub struct JsonSink<W: Write + Send> {
    writer: Option<W>,
    pretty: bool,
}

impl<W: Write + Send> JsonSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Some(writer),
            pretty: false,
        }
    }

    /// One indented object per record instead of one line
    #[must_use]
    pub fn pretty(mut self) -> Self {
        self.pretty = true;
        self
    }

    /// Give the writer back, flushing it first
    pub fn into_inner(mut self) -> Option<W> {
        let mut writer = self.writer.take()?;
        let _ = writer.flush();
        Some(writer)
    }
}

#[cfg(feature = "file")]
impl JsonSink<std::io::BufWriter<std::fs::File>> {
    /// Append JSON lines to the file at `path`
    pub fn create<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        Ok(Self::new(std::io::BufWriter::new(file)))
    }
}

impl<W: Write + Send> Sink for JsonSink<W> {
    fn name(&self) -> &str {
        "json"
    }

    fn uses_custom_format(&self) -> bool {
        true
    }

    fn format(&self, level: LogLevel, source: &str, message: &str) -> String {
        self.format_at(level, source, message, Utc::now())
    }

    fn format_at(
        &self,
        level: LogLevel,
        source: &str,
        message: &str,
        timestamp: DateTime<Utc>,
    ) -> String {
        let record = json!({
            "timestamp": timestamp.timestamp_millis(),
            "level": level.to_str(),
            "source": source,
            "message": message,
        });

        let mut line = if self.pretty {
            serde_json::to_string_pretty(&record).unwrap_or_else(|_| record.to_string())
        } else {
            record.to_string()
        };
        line.push('\n');
        line
    }

    fn on_detach(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }
        Ok(())
    }
}

impl<W: Write + Send> StreamSink for JsonSink<W> {
    fn write(&mut self, formatted: &[u8]) -> Result<()> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| LoggerError::sink("json", "writer already closed"))?;
        writer.write_all(formatted)?;
        Ok(())
    }

    fn flush_now(&mut self) -> Result<()> {
        if let Some(writer) = self.writer.as_mut() {
            writer.flush()?;
        }
        Ok(())
    }
}
