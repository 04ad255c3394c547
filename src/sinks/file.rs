//! File sink implementation

use crate::core::{FormatFlags, LoggerError, Result, Sink, StreamSink};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Appends records to a file it owns.
///
/// Output is buffered; the buffer is flushed after every record, or on the
/// configured cadence. Detaching flushes and closes the file.
pub struct FileSink {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
    flags: FormatFlags,
    cadence_millis: i64,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| {
                LoggerError::io_operation(
                    "opening log file",
                    format!("cannot open {}", path.display()),
                    e,
                )
            })?;

        Ok(Self {
            path,
            writer: Some(BufWriter::new(file)),
            flags: FormatFlags::INCLUDE_NAME | FormatFlags::INCLUDE_DETAILED_TIME,
            cadence_millis: 0,
        })
    }

    /// Set the line format flags
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use rust_unit_logging::sinks::FileSink;
    /// use rust_unit_logging::FormatFlags;
    ///
    /// let sink = FileSink::new("/var/log/app.log")
    ///     .unwrap()
    ///     .with_flags(FormatFlags::INCLUDE_TIMESTAMP | FormatFlags::INCLUDE_NAME);
    /// ```
    #[must_use]
    pub fn with_flags(mut self, flags: FormatFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Flush the file buffer at most every `millis` milliseconds instead of
    /// after every record
    #[must_use]
    pub fn with_cadence(mut self, millis: i64) -> Self {
        self.cadence_millis = millis;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_open(&self) -> bool {
        self.writer.is_some()
    }

    fn writer(&mut self) -> Result<&mut BufWriter<File>> {
        self.writer
            .as_mut()
            .ok_or_else(|| LoggerError::sink("file", "file already closed"))
    }
}

impl Sink for FileSink {
    fn name(&self) -> &str {
        "file"
    }

    fn update_cadence_millis(&self) -> i64 {
        self.cadence_millis
    }

    fn format_flags(&self) -> FormatFlags {
        self.flags
    }

    fn on_detach(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }
        Ok(())
    }
}

impl StreamSink for FileSink {
    fn write(&mut self, formatted: &[u8]) -> Result<()> {
        self.writer()?.write_all(formatted)?;
        Ok(())
    }

    fn flush_now(&mut self) -> Result<()> {
        self.writer()?.flush()?;
        Ok(())
    }
}

impl Drop for FileSink {
    fn drop(&mut self) {
        // Ensure all buffered data is flushed to disk
        let _ = self.on_detach();
    }
}
