//! In-memory buffer sink

use crate::core::format::RECORD_SEPARATOR;
use crate::core::{BufferSink, FormatFlags, Result, Sink};
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Debug, Default)]
struct Collected {
    updates: Vec<String>,
    detached: usize,
}

/// Shared view of what one or more [`MemorySink`]s received
#[derive(Debug, Clone, Default)]
pub struct MemoryLog {
    inner: Arc<Mutex<Collected>>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every update, in arrival order
    pub fn updates(&self) -> Vec<String> {
        self.inner.lock().updates.clone()
    }

    pub fn update_count(&self) -> usize {
        self.inner.lock().updates.len()
    }

    /// The most recent update; for a full-history sink, the whole log
    pub fn latest(&self) -> Option<String> {
        self.inner.lock().updates.last().cloned()
    }

    /// All updates concatenated
    pub fn contents(&self) -> String {
        self.inner.lock().updates.concat()
    }

    /// Records of [`contents`](Self::contents), without terminators
    pub fn lines(&self) -> Vec<String> {
        self.contents()
            .split(['\n', RECORD_SEPARATOR])
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// How many sinks sharing this log were detached
    pub fn detach_count(&self) -> usize {
        self.inner.lock().detached
    }

    pub fn clear(&self) {
        self.inner.lock().updates.clear();
    }
}

/// Buffer sink keeping every update in a [`MemoryLog`]
///
/// # Example
///
/// ```
/// use rust_unit_logging::sinks::MemorySink;
///
/// let sink = MemorySink::new("memory").with_cadence(100);
/// let contents = sink.log();
/// assert!(contents.updates().is_empty());
/// ```
pub struct MemorySink {
    name: String,
    log: MemoryLog,
    cadence_millis: i64,
    retain_full_history: bool,
    flags: FormatFlags,
}

impl MemorySink {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_log(name, MemoryLog::new())
    }

    /// A sink adding to an existing log
    pub fn with_log(name: impl Into<String>, log: MemoryLog) -> Self {
        Self {
            name: name.into(),
            log,
            cadence_millis: 0,
            retain_full_history: false,
            flags: FormatFlags::INCLUDE_NAME,
        }
    }

    pub fn log(&self) -> MemoryLog {
        self.log.clone()
    }

    #[must_use]
    pub fn with_cadence(mut self, millis: i64) -> Self {
        self.cadence_millis = millis;
        self
    }

    #[must_use]
    pub fn with_full_history(mut self, retain: bool) -> Self {
        self.retain_full_history = retain;
        self
    }

    #[must_use]
    pub fn with_flags(mut self, flags: FormatFlags) -> Self {
        self.flags = flags;
        self
    }
}

impl Sink for MemorySink {
    fn name(&self) -> &str {
        &self.name
    }

    fn update_cadence_millis(&self) -> i64 {
        self.cadence_millis
    }

    fn format_flags(&self) -> FormatFlags {
        self.flags
    }

    fn on_detach(&mut self) -> Result<()> {
        self.log.inner.lock().detached += 1;
        Ok(())
    }
}

impl BufferSink for MemorySink {
    fn update(&mut self, text: &str) -> Result<()> {
        self.log.inner.lock().updates.push(text.to_string());
        Ok(())
    }

    fn retain_full_history(&self) -> bool {
        self.retain_full_history
    }
}
