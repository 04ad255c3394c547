//! Named logs

use super::adapters::LogCalls;
use super::dispatcher::QueuedEntry;
use super::error::{LoggerError, Result};
use super::fanout::{AttachedSink, Record};
use super::format::{compose, Argument, LineContext};
use super::hierarchy::{LevelState, UnitId};
use super::log_level::LogLevel;
use super::metrics::LoggerMetrics;
use super::registry::Shared;
use super::sink::{BufferSink, SinkHandle, SinkId, StreamSink};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;

/// Lifecycle of a log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoggerState {
    /// Configured, no sink instantiated yet
    Unbuilt,
    /// Accepting log calls
    Active,
    /// Terminal; log calls are ignored
    Exited,
}

impl LoggerState {
    const fn as_u8(self) -> u8 {
        match self {
            LoggerState::Unbuilt => 0,
            LoggerState::Active => 1,
            LoggerState::Exited => 2,
        }
    }

    const fn from_u8(raw: u8) -> Self {
        match raw {
            0 => LoggerState::Unbuilt,
            1 => LoggerState::Active,
            _ => LoggerState::Exited,
        }
    }
}

pub(crate) struct LoggerInner {
    name: String,
    unit: UnitId,
    levels: Arc<LevelState>,
    highlighted: AtomicBool,
    performance_mode: AtomicBool,
    state: AtomicU8,
    /// Fan-out order is attach order
    sinks: Mutex<Vec<AttachedSink>>,
    default_sink_type: Mutex<String>,
    metrics: Arc<LoggerMetrics>,
    shared: Arc<Shared>,
}

/// A named log
///
/// Handles are cheap to clone; all clones refer to the same log. Logs are
/// created through a [`Registry`].
///
/// # Example
///
/// ```
/// use rust_unit_logging::prelude::*;
///
/// let registry = Registry::new();
/// let log = registry.logger("net").unwrap();
/// let memory = MemorySink::new("memory");
/// let contents = memory.log();
/// log.attach_buffer(memory);
///
/// log.li("connected to []", vec![arg("db-1")]);
/// assert_eq!(contents.lines(), vec!["> [ net ] connected to [db-1]"]);
/// ```
#[derive(Clone)]
pub struct Logger {
    inner: Arc<LoggerInner>,
}

impl Logger {
    pub(crate) fn new(
        name: &str,
        unit: UnitId,
        levels: Arc<LevelState>,
        default_sink_type: String,
        shared: Arc<Shared>,
    ) -> Self {
        Self {
            inner: Arc::new(LoggerInner {
                name: name.to_string(),
                unit,
                levels,
                highlighted: AtomicBool::new(false),
                performance_mode: AtomicBool::new(true),
                state: AtomicU8::new(LoggerState::Unbuilt.as_u8()),
                sinks: Mutex::new(Vec::new()),
                default_sink_type: Mutex::new(default_sink_type),
                metrics: Arc::new(LoggerMetrics::new()),
                shared,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn state(&self) -> LoggerState {
        LoggerState::from_u8(self.inner.state.load(Ordering::Acquire))
    }

    pub fn unit(&self) -> UnitId {
        self.inner.unit
    }

    /// Effective level threshold, pinned or inherited
    pub fn level(&self) -> Option<LogLevel> {
        self.inner.levels.effective()
    }

    /// Level set directly on this log, if any
    pub fn pinned_level(&self) -> Option<LogLevel> {
        self.inner.levels.pinned()
    }

    /// Whether a message at `level` would currently reach the sinks
    #[inline]
    pub fn is_enabled(&self, level: LogLevel) -> bool {
        self.state() != LoggerState::Exited && self.inner.levels.displays(level)
    }

    pub fn metrics(&self) -> &LoggerMetrics {
        &self.inner.metrics
    }

    pub fn is_highlighted(&self) -> bool {
        self.inner.highlighted.load(Ordering::Relaxed)
    }

    /// `true` when calls on this log currently go through the queue
    pub fn is_performance_mode(&self) -> bool {
        self.inner.shared.performance_enabled() && self.inner.performance_mode.load(Ordering::Relaxed)
    }

    /// Pin `level` on this log and push it to child logs without a level of
    /// their own.
    pub fn set_level(&self, level: LogLevel) -> &Self {
        self.inner.shared.units.lock().set_level(self.inner.unit, level);
        self
    }

    /// While any log is highlighted, the output of the others is indented
    pub fn set_highlighted(&self, highlighted: bool) -> &Self {
        self.inner.highlighted.store(highlighted, Ordering::Relaxed);
        self.inner.shared.highlights.set(&self.inner.name, highlighted);
        self
    }

    /// Opt this log in or out of the performance-mode queue (in by
    /// default). Has no effect until performance mode is enabled on the
    /// registry.
    pub fn set_performance_mode(&self, enabled: bool) -> &Self {
        self.inner.performance_mode.store(enabled, Ordering::Relaxed);
        self
    }

    /// Sink type instantiated at the first log call when no sink is
    /// attached. Only allowed before the log is active.
    pub fn set_default_sink_type(&self, tag: impl Into<String>) -> &Self {
        let mut current = self.inner.default_sink_type.lock();
        if self.state() == LoggerState::Unbuilt {
            *current = tag.into();
            return self;
        }
        drop(current);

        let err = LoggerError::configuration_locked(&self.inner.name, "default sink type");
        self.log(LogLevel::Error, &err.to_string(), Vec::new());
        self
    }

    /// Make the log active now instead of at its first log call
    pub fn build(&self) -> &Self {
        self.activate();
        self
    }

    pub fn attach_sink(&self, handle: SinkHandle) -> SinkId {
        let attached = self.inner.shared.attach(&self.inner.name, handle, &self.inner.metrics);
        let id = attached.id();
        self.inner.sinks.lock().push(attached);
        id
    }

    pub fn attach_stream<S: StreamSink + 'static>(&self, sink: S) -> SinkId {
        self.attach_sink(SinkHandle::stream(sink))
    }

    pub fn attach_buffer<B: BufferSink + 'static>(&self, sink: B) -> SinkId {
        self.attach_sink(SinkHandle::buffer(sink))
    }

    /// Detach one sink, delivering what it still has pending. Returns
    /// `false` when no such sink is attached.
    pub fn detach_sink(&self, id: SinkId) -> bool {
        self.drain_queued();
        let removed = {
            let mut sinks = self.inner.sinks.lock();
            sinks
                .iter()
                .position(|s| s.id() == id)
                .map(|index| sinks.remove(index))
        };

        match removed {
            Some(sink) => {
                sink.detach(&self.inner.shared.scheduler);
                true
            }
            None => false,
        }
    }

    /// Detach every sink. Returns how many were attached.
    pub fn detach_all(&self) -> usize {
        self.drain_queued();
        let removed = std::mem::take(&mut *self.inner.sinks.lock());
        for sink in &removed {
            sink.detach(&self.inner.shared.scheduler);
        }
        removed.len()
    }

    /// Queued entries of a sink about to leave still reach it
    fn drain_queued(&self) {
        if let Some(dispatcher) = self.inner.shared.dispatcher() {
            dispatcher.drain();
        }
    }

    pub fn sink_count(&self) -> usize {
        self.inner.sinks.lock().len()
    }

    pub fn sink_names(&self) -> Vec<String> {
        self.inner.sinks.lock().iter().map(AttachedSink::name).collect()
    }

    /// Log `template` at `level`, substituting `args` into its `[]` markers.
    ///
    /// The level check happens before anything is formatted. In performance
    /// mode the raw call is queued and formatted on the worker thread.
    pub fn log(&self, level: LogLevel, template: &str, args: Vec<Argument>) {
        let inner = &self.inner;
        match self.state() {
            LoggerState::Unbuilt => self.activate(),
            LoggerState::Active => {}
            LoggerState::Exited => return,
        }

        if !inner.levels.displays(level) {
            inner.metrics.record_filtered();
            return;
        }

        let timestamp = Utc::now();
        let mut args = args;

        if self.is_performance_mode() {
            if let Some(dispatcher) = inner.shared.dispatcher() {
                let entry = QueuedEntry {
                    logger: self.clone(),
                    sinks: inner.sinks.lock().clone(),
                    level,
                    template: template.to_string(),
                    args,
                    timestamp,
                };
                match dispatcher.try_enqueue(entry) {
                    Ok(()) => {
                        inner.metrics.record_queued();
                        return;
                    }
                    // Worker already stopped: deliver on this thread
                    Err(entry) => args = entry.args,
                }
            }
        }

        let message = compose(template, &args);
        self.dispatch(level, &message, timestamp);
    }

    /// Deliver pending batched output now; in performance mode, first
    /// dispatch everything queued.
    pub fn flush(&self) {
        if self.is_performance_mode() {
            if let Some(dispatcher) = self.inner.shared.dispatcher() {
                dispatcher.drain();
            }
        }
        for sink in self.inner.sinks.lock().iter() {
            sink.flush(&self.inner.shared.scheduler);
        }
    }

    /// Exit this log and, through the registry, every log registered with it
    /// as parent. Exiting an already exited log does nothing.
    pub fn exit(&self, flush_first: bool) -> Result<()> {
        self.inner.shared.exit_logger(self, flush_first)
    }

    /// Make `parent` a level parent of this log. Returns `false` when the
    /// edge exists already or the logs belong to different registries.
    pub fn add_parent(&self, parent: &Logger) -> bool {
        if !Arc::ptr_eq(&self.inner.shared, &parent.inner.shared) {
            return false;
        }
        self.inner
            .shared
            .units
            .lock()
            .add_parent(self.inner.unit, parent.inner.unit)
    }

    pub(crate) fn same_as(&self, other: &Logger) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Hand a composed message to every attached sink, in attach order
    pub(crate) fn dispatch(&self, level: LogLevel, message: &str, timestamp: DateTime<Utc>) {
        let sinks = self.inner.sinks.lock();
        self.dispatch_to(&sinks, level, message, timestamp);
    }

    /// Hand a composed message to `sinks`, the sinks that were attached when
    /// the message was logged
    pub(crate) fn dispatch_to(
        &self,
        sinks: &[AttachedSink],
        level: LogLevel,
        message: &str,
        timestamp: DateTime<Utc>,
    ) {
        let inner = &self.inner;
        let shared = &inner.shared;
        let indent = if shared.highlights.any() && !self.is_highlighted() {
            shared.config.highlight_indent.as_str()
        } else {
            ""
        };

        let record = Record {
            context: LineContext {
                level,
                source: &inner.name,
                name_width: shared.name_width(),
                indent,
                timestamp,
            },
            message,
        };

        for sink in sinks {
            sink.deliver(&record, &shared.scheduler);
        }
        inner.metrics.record_logged();
    }

    /// Terminal teardown. Idempotent.
    pub(crate) fn teardown(&self) {
        let inner = &self.inner;
        let previous = inner
            .state
            .swap(LoggerState::Exited.as_u8(), Ordering::AcqRel);
        if LoggerState::from_u8(previous) == LoggerState::Exited {
            return;
        }

        // Queued entries of this log still go to its sinks
        if let Some(dispatcher) = inner.shared.dispatcher() {
            dispatcher.drain();
        }
        self.detach_all();

        inner.shared.units.lock().remove_unit(inner.unit);
        if self.is_highlighted() {
            inner.highlighted.store(false, Ordering::Relaxed);
            inner.shared.highlights.set(&inner.name, false);
        }
    }

    fn activate(&self) {
        let inner = &self.inner;
        // Sinks stay locked until the default sink is in place, so that no
        // concurrent call dispatches to an empty list
        let mut sinks = inner.sinks.lock();
        let activated = inner.state.compare_exchange(
            LoggerState::Unbuilt.as_u8(),
            LoggerState::Active.as_u8(),
            Ordering::AcqRel,
            Ordering::Acquire,
        );
        if activated.is_err() || !sinks.is_empty() {
            return;
        }

        let tag = inner.default_sink_type.lock().clone();
        match inner.shared.create_sink(&tag) {
            Ok(handle) => sinks.push(inner.shared.attach(&inner.name, handle, &inner.metrics)),
            Err(e) => eprintln!(
                "[LOGGER ERROR] Could not attach default sink to log [{}]: {}",
                inner.name, e
            ),
        }
    }
}

impl LogCalls for Logger {
    fn log(&self, level: LogLevel, template: &str, args: Vec<Argument>) {
        Logger::log(self, level, template, args)
    }

    fn is_enabled(&self, level: LogLevel) -> bool {
        Logger::is_enabled(self, level)
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.inner.name)
            .field("state", &self.state())
            .field("level", &self.level())
            .field("pinned_level", &self.pinned_level())
            .field("sinks", &self.sink_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::format::arg;
    use crate::core::registry::Registry;
    use crate::sinks::MemorySink;

    fn memory_log(registry: &Registry, name: &str) -> (Logger, crate::sinks::MemoryLog) {
        let logger = registry.logger(name).expect("fresh name");
        let sink = MemorySink::new("memory");
        let contents = sink.log();
        logger.attach_buffer(sink);
        (logger, contents)
    }

    #[test]
    fn test_state_transitions() {
        let registry = Registry::new();
        let (logger, _) = memory_log(&registry, "a");
        assert_eq!(logger.state(), LoggerState::Unbuilt);

        logger.info("first");
        assert_eq!(logger.state(), LoggerState::Active);

        logger.exit(false).expect("registered");
        assert_eq!(logger.state(), LoggerState::Exited);
        assert!(!logger.is_enabled(LogLevel::Error));

        // Exit is idempotent
        logger.exit(false).expect("already exited");
    }

    #[test]
    fn test_filtered_messages_are_counted() {
        let registry = Registry::new();
        let (logger, contents) = memory_log(&registry, "a");
        logger.set_level(LogLevel::Warn);

        logger.info("hidden");
        logger.error("shown");

        assert_eq!(contents.lines(), vec!["# [ a ] shown"]);
        assert_eq!(logger.metrics().filtered(), 1);
        assert_eq!(logger.metrics().total_logged(), 1);
    }

    #[test]
    fn test_default_sink_attached_on_first_call() {
        let registry = Registry::new();
        let logger = registry.logger("quiet").expect("fresh name");
        logger.set_default_sink_type("null");

        assert_eq!(logger.sink_count(), 0);
        logger.info("goes nowhere");
        assert_eq!(logger.sink_names(), vec!["null".to_string()]);
    }

    #[test]
    fn test_default_sink_type_locked_after_activation() {
        let registry = Registry::new();
        let (logger, contents) = memory_log(&registry, "a");
        logger.build();

        logger.set_default_sink_type("stderr");

        let lines = contents.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("# [ a ] configuration of log [a] is locked"));
    }

    #[test]
    fn test_detach_sink_by_id() {
        let registry = Registry::new();
        let (logger, first) = memory_log(&registry, "a");
        let second = MemorySink::new("second");
        let second_contents = second.log();
        let id = logger.attach_buffer(second);

        logger.info("both");
        assert!(logger.detach_sink(id));
        assert!(!logger.detach_sink(id));
        logger.info("first only");

        assert_eq!(first.lines().len(), 2);
        assert_eq!(second_contents.lines(), vec!["> [ a ] both"]);
        assert_eq!(second_contents.detach_count(), 1);
    }

    #[test]
    fn test_highlight_indents_other_logs() {
        let registry = Registry::new();
        let (plain, plain_contents) = memory_log(&registry, "p");
        let (loud, loud_contents) = memory_log(&registry, "l");

        loud.set_highlighted(true);
        plain.info("indented");
        loud.info("not indented");
        loud.set_highlighted(false);
        plain.info("back");

        assert_eq!(plain_contents.lines(), vec!["    > [ p ] indented", "> [ p ] back"]);
        assert_eq!(loud_contents.lines(), vec!["> [ l ] not indented"]);
    }

    #[test]
    fn test_arguments_are_composed() {
        let registry = Registry::new();
        let (logger, contents) = memory_log(&registry, "a");

        logger.log(LogLevel::Info, "[] of []", vec![arg(1), arg(2), arg("extra")]);
        assert_eq!(contents.lines(), vec!["> [ a ] [1] of [2][extra]"]);
    }

    #[test]
    fn test_queued_entries_keep_their_sinks() {
        let registry = Registry::builder()
            .default_sink("null")
            .performance_interval(std::time::Duration::from_secs(60))
            .global_performance_mode()
            .build();
        let logger = registry.logger("p").expect("fresh name");
        let first = MemorySink::new("first");
        let first_contents = first.log();
        let id = logger.attach_buffer(first);

        logger.info("while attached");
        assert!(logger.detach_sink(id));

        let second = MemorySink::new("second");
        let second_contents = second.log();
        logger.attach_buffer(second);
        logger.info("after swap");
        registry.drain_queue();

        assert_eq!(first_contents.lines(), vec!["> [ p ] while attached"]);
        assert_eq!(second_contents.lines(), vec!["> [ p ] after swap"]);
    }

    #[test]
    fn test_sink_attached_later_misses_earlier_queued_entries() {
        let registry = Registry::builder()
            .default_sink("null")
            .performance_interval(std::time::Duration::from_secs(60))
            .global_performance_mode()
            .build();
        let (logger, early) = memory_log(&registry, "p");

        logger.info("before");
        let late = MemorySink::new("late");
        let late_contents = late.log();
        logger.attach_buffer(late);
        registry.drain_queue();

        assert_eq!(early.lines(), vec!["> [ p ] before"]);
        assert!(late_contents.lines().is_empty());
    }
}
