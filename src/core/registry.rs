//! Registry of named logs
//!
//! The registry maps names to logs and remembers, for every log created
//! with a parent name, which log it belongs to. Exiting a log exits the logs
//! registered under it first, children before parents.
//!
//! It also owns what all its logs share: the unit graph for level
//! propagation, the set of highlighted logs, the flush scheduler, the sink
//! factory table and, once performance mode is on, the dispatch worker.
//!
//! Every log is linked under the registry's master unit, so
//! [`Registry::set_level`] reaches all logs without a level of their own.
//! The master log, named [`MASTER_LOG_NAME`], reports registry-wide events.

use super::adapters::LogCalls;
use super::config::RegistryConfig;
use super::dispatcher::Dispatcher;
use super::error::{LoggerError, Result};
use super::fanout::AttachedSink;
use super::format::arg;
use super::hierarchy::{LevelState, UnitGraph, UnitId};
use super::log_level::LogLevel;
use super::logger::Logger;
use super::metrics::LoggerMetrics;
use super::scheduler::FlushScheduler;
use super::sink::{SinkHandle, SinkId};
use crate::sinks::{ConsoleSink, NullSink};
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

/// Name the master log writes under
pub const MASTER_LOG_NAME: &str = "M-Log";

/// Builds a fresh sink for a registered sink type
pub type SinkFactory = Arc<dyn Fn() -> Result<SinkHandle> + Send + Sync>;

/// Names of the currently highlighted logs
#[derive(Default)]
pub(crate) struct Highlights {
    names: Mutex<HashSet<String>>,
    count: AtomicUsize,
}

impl Highlights {
    pub(crate) fn set(&self, name: &str, highlighted: bool) {
        let mut names = self.names.lock();
        if highlighted {
            names.insert(name.to_string());
        } else {
            names.remove(name);
        }
        self.count.store(names.len(), Ordering::Release);
    }

    #[inline]
    pub(crate) fn any(&self) -> bool {
        self.count() > 0
    }

    #[inline]
    pub(crate) fn count(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }
}

#[derive(Default)]
struct RegistryState {
    loggers: HashMap<String, Logger>,
    /// child name -> parent name, for cascading exits
    parents: HashMap<String, String>,
}

impl RegistryState {
    /// `root` and every registered log below it, children first
    fn cascade_order(&self, root: &str) -> Vec<String> {
        let mut visited = HashSet::new();
        let mut order = Vec::new();
        self.collect(root, &mut visited, &mut order);
        order
    }

    fn collect(&self, name: &str, visited: &mut HashSet<String>, order: &mut Vec<String>) {
        if !visited.insert(name.to_string()) {
            return;
        }

        let mut children: Vec<&String> = self
            .parents
            .iter()
            .filter(|(child, parent)| parent.as_str() == name && self.loggers.contains_key(*child))
            .map(|(child, _)| child)
            .collect();
        children.sort();

        for child in children {
            self.collect(child, visited, order);
        }
        order.push(name.to_string());
    }

    /// Logs whose parent is not registered
    fn roots(&self) -> Vec<String> {
        let mut roots: Vec<String> = self
            .loggers
            .keys()
            .filter(|name| {
                self.parents
                    .get(*name)
                    .map_or(true, |parent| !self.loggers.contains_key(parent))
            })
            .cloned()
            .collect();
        roots.sort();
        roots
    }
}

pub(crate) struct Shared {
    pub(crate) config: RegistryConfig,
    state: Mutex<RegistryState>,
    pub(crate) units: Mutex<UnitGraph>,
    master_unit: UnitId,
    master_levels: Arc<LevelState>,
    /// Created on first use; holds an `Arc` back to this struct until
    /// `close_all` takes it
    master: Mutex<Option<Logger>>,
    pub(crate) highlights: Highlights,
    pub(crate) scheduler: FlushScheduler,
    name_width: AtomicUsize,
    default_level: RwLock<LogLevel>,
    performance: AtomicBool,
    dispatcher: OnceLock<Dispatcher>,
    factories: RwLock<HashMap<String, SinkFactory>>,
    next_sink_id: AtomicU64,
}

impl Shared {
    fn new(config: RegistryConfig) -> Self {
        let mut factories: HashMap<String, SinkFactory> = HashMap::new();
        factories.insert(
            "console".to_string(),
            Arc::new(|| Ok(SinkHandle::stream(ConsoleSink::stdout()))),
        );
        factories.insert(
            "stderr".to_string(),
            Arc::new(|| Ok(SinkHandle::stream(ConsoleSink::stderr()))),
        );
        factories.insert(
            "null".to_string(),
            Arc::new(|| Ok(SinkHandle::stream(NullSink::new()))),
        );

        let mut units = UnitGraph::new();
        let master_levels = Arc::new(LevelState::new(
            Some(config.default_level),
            Some(config.default_level),
        ));
        let master_unit = units.add_unit_with(Arc::clone(&master_levels));

        Self {
            default_level: RwLock::new(config.default_level),
            config,
            state: Mutex::new(RegistryState::default()),
            units: Mutex::new(units),
            master_unit,
            master_levels,
            master: Mutex::new(None),
            highlights: Highlights::default(),
            scheduler: FlushScheduler::new(),
            name_width: AtomicUsize::new(0),
            performance: AtomicBool::new(false),
            dispatcher: OnceLock::new(),
            factories: RwLock::new(factories),
            next_sink_id: AtomicU64::new(1),
        }
    }

    #[inline]
    pub(crate) fn name_width(&self) -> usize {
        self.name_width.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn performance_enabled(&self) -> bool {
        self.performance.load(Ordering::Acquire)
    }

    #[inline]
    pub(crate) fn dispatcher(&self) -> Option<&Dispatcher> {
        self.dispatcher.get()
    }

    /// The master log, created at first use. Never queued.
    fn master(self: &Arc<Self>) -> Logger {
        let mut master = self.master.lock();
        master
            .get_or_insert_with(|| {
                let logger = Logger::new(
                    MASTER_LOG_NAME,
                    self.master_unit,
                    Arc::clone(&self.master_levels),
                    self.config.default_sink.clone(),
                    Arc::clone(self),
                );
                logger.set_performance_mode(false);
                logger
            })
            .clone()
    }

    pub(crate) fn create_sink(&self, tag: &str) -> Result<SinkHandle> {
        let factory = self
            .factories
            .read()
            .get(tag)
            .cloned()
            .ok_or_else(|| LoggerError::UnknownSinkType(tag.to_string()))?;
        factory()
    }

    pub(crate) fn attach(
        &self,
        owner: &str,
        handle: SinkHandle,
        metrics: &Arc<LoggerMetrics>,
    ) -> AttachedSink {
        let id = SinkId(self.next_sink_id.fetch_add(1, Ordering::Relaxed));
        AttachedSink::new(id, handle, owner, Arc::clone(metrics))
    }

    fn get_or_create(
        self: &Arc<Self>,
        name: &str,
        parent: Option<&str>,
        ensure_new: bool,
        level: Option<LogLevel>,
    ) -> Result<Logger> {
        let mut state = self.state.lock();
        if let Some(existing) = state.loggers.get(name) {
            if ensure_new {
                return Err(LoggerError::name_collision(name));
            }
            return Ok(existing.clone());
        }

        let levels = Arc::new(match level {
            Some(level) => LevelState::new(Some(level), Some(level)),
            None => LevelState::new(Some(*self.default_level.read()), None),
        });
        // Linking keeps the level chosen above
        let unit = {
            let mut units = self.units.lock();
            let unit = units.add_unit_with(Arc::clone(&levels));
            units.add_parent_keeping_level(unit, self.master_unit);
            unit
        };
        self.name_width
            .fetch_max(name.chars().count(), Ordering::Relaxed);

        let logger = Logger::new(
            name,
            unit,
            levels,
            self.config.default_sink.clone(),
            Arc::clone(self),
        );
        state.loggers.insert(name.to_string(), logger.clone());
        if let Some(parent) = parent {
            state.parents.insert(name.to_string(), parent.to_string());
        }
        Ok(logger)
    }

    fn exit(&self, name: &str, flush_first: bool) -> Result<()> {
        let doomed: Vec<(Logger, usize)> = {
            let mut state = self.state.lock();
            if !state.loggers.contains_key(name) {
                return Err(LoggerError::not_found(name));
            }

            let order = state.cascade_order(name);
            order
                .iter()
                .filter_map(|n| {
                    state.parents.remove(n);
                    let logger = state.loggers.remove(n)?;
                    Some((logger, state.loggers.len()))
                })
                .collect()
        };

        for (logger, remaining) in doomed {
            logger.log(
                LogLevel::Trace,
                "log out (logs remaining []).",
                vec![arg(remaining)],
            );
            if flush_first {
                logger.flush();
            }
            logger.teardown();
        }
        Ok(())
    }

    pub(crate) fn exit_logger(&self, logger: &Logger, flush_first: bool) -> Result<()> {
        let registered = self
            .state
            .lock()
            .loggers
            .get(logger.name())
            .is_some_and(|current| current.same_as(logger));

        if registered {
            match self.exit(logger.name(), flush_first) {
                // Exited concurrently
                Err(LoggerError::NotFound { .. }) => Ok(()),
                other => other,
            }
        } else {
            if flush_first {
                logger.flush();
            }
            logger.teardown();
            Ok(())
        }
    }

    fn enable_performance_mode(self: &Arc<Self>) -> Result<()> {
        let first = {
            // Serializes first-time creation of the dispatcher
            let _state = self.state.lock();
            if self.dispatcher.get().is_none() {
                let dispatcher = Dispatcher::start(self.config.performance_interval())?;
                let _ = self.dispatcher.set(dispatcher);
            }
            !self.performance.swap(true, Ordering::AcqRel)
        };

        if first {
            self.master().trace("Global performance mode active");
        }
        Ok(())
    }

    fn close_all(&self) -> Result<()> {
        if let Some(dispatcher) = self.dispatcher.get() {
            dispatcher.drain();
        }

        let roots = self.state.lock().roots();
        for root in roots {
            let _ = self.exit(&root, true);
        }
        // Parent links forming a loop leave logs without a root
        loop {
            let next = self.state.lock().loggers.keys().min().cloned();
            match next {
                Some(name) => {
                    let _ = self.exit(&name, true);
                }
                None => break,
            }
        }

        let master = self.master.lock().take();
        if let Some(master) = master {
            master.flush();
            master.detach_all();
        }

        let timeout = self.config.shutdown_timeout();
        let dispatcher_result = match self.dispatcher.get() {
            Some(dispatcher) => dispatcher.shutdown(timeout),
            None => Ok(()),
        };
        let scheduler_result = self.scheduler.shutdown(timeout);
        dispatcher_result.and(scheduler_result)
    }
}

/// Directory of named logs
///
/// Dropping the registry closes every log it still holds and stops its
/// background workers. [`Registry::global`] gives a process-wide instance.
///
/// # Example
///
/// ```
/// use rust_unit_logging::{LogLevel, Registry};
///
/// let registry = Registry::new();
/// let parent = registry.get_or_create("app", None, false, Some(LogLevel::Info)).unwrap();
/// let child = registry.get_or_create("app.db", Some("app"), false, None).unwrap();
///
/// registry.exit("app", false).unwrap();
/// assert!(registry.is_empty());
/// ```
pub struct Registry {
    shared: Arc<Shared>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    #[must_use]
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            shared: Arc::new(Shared::new(config)),
        }
    }

    #[must_use]
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Process-wide registry, created on first use
    ///
    /// The instance lives in a static and is never dropped, so nothing
    /// closes it at process exit. Call [`Registry::close_all`] before
    /// exiting, or output still batched by a sink cadence or waiting in the
    /// performance queue is lost.
    pub fn global() -> &'static Registry {
        static GLOBAL: OnceLock<Registry> = OnceLock::new();
        GLOBAL.get_or_init(Registry::new)
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.shared.config
    }

    /// Return the log registered as `name`, creating it when absent.
    ///
    /// For an existing log every other parameter is ignored, unless
    /// `ensure_new` is set, in which case the call fails with
    /// [`LoggerError::NameCollision`]. A new log records `parent` for
    /// cascading exits and pins `level` when one is given; otherwise it
    /// starts at the registry's default level.
    pub fn get_or_create(
        &self,
        name: &str,
        parent: Option<&str>,
        ensure_new: bool,
        level: Option<LogLevel>,
    ) -> Result<Logger> {
        self.shared.get_or_create(name, parent, ensure_new, level)
    }

    /// Shorthand for `get_or_create(name, None, false, None)`
    pub fn logger(&self, name: &str) -> Result<Logger> {
        self.get_or_create(name, None, false, None)
    }

    pub fn get(&self, name: &str) -> Option<Logger> {
        self.shared.state.lock().loggers.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.shared.state.lock().loggers.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.shared.state.lock().loggers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.shared.state.lock().loggers.keys().cloned().collect();
        names.sort();
        names
    }

    /// Parent name recorded when `name` was created
    pub fn parent_of(&self, name: &str) -> Option<String> {
        self.shared.state.lock().parents.get(name).cloned()
    }

    /// Exit `name` and, first, every log registered under it.
    ///
    /// Each exiting log receives a final trace message, is flushed when
    /// `flush_first` is set, and has all its sinks detached. Its name can be
    /// registered again afterwards.
    pub fn exit(&self, name: &str, flush_first: bool) -> Result<()> {
        self.shared.exit(name, flush_first)
    }

    /// Forget every log without tearing any down.
    ///
    /// Sinks stay attached and their pending output is not delivered until
    /// the logs are exited through their handles. Only meant for a process
    /// that is going away anyway.
    pub fn reset_all(&self) {
        let mut state = self.shared.state.lock();
        state.loggers.clear();
        state.parents.clear();
    }

    /// Exit every log, then stop the performance worker and the flush
    /// scheduler. Nothing queued is discarded.
    pub fn close_all(&self) -> Result<()> {
        self.shared.close_all()
    }

    /// Route log calls through the background queue from now on. Cannot be
    /// turned off again.
    pub fn enable_global_performance_mode(&self) -> Result<()> {
        self.shared.enable_performance_mode()
    }

    pub fn is_performance_mode(&self) -> bool {
        self.shared.performance_enabled()
    }

    /// Dispatch every queued entry on the calling thread
    pub fn drain_queue(&self) -> usize {
        self.shared.dispatcher().map_or(0, Dispatcher::drain)
    }

    /// Entries waiting for the performance worker
    pub fn queued(&self) -> usize {
        self.shared.dispatcher().map_or(0, Dispatcher::pending)
    }

    pub fn is_worker_running(&self) -> bool {
        self.shared.dispatcher().is_some_and(Dispatcher::is_running)
    }

    /// Pin `level` on the master unit. Every log without a level of its
    /// own follows it, including logs created earlier. Returns how many
    /// logs were updated.
    pub fn set_level(&self, level: LogLevel) -> usize {
        self.shared
            .units
            .lock()
            .set_level(self.shared.master_unit, level)
    }

    /// Level of the master log
    pub fn level(&self) -> Option<LogLevel> {
        self.shared.master_levels.effective()
    }

    /// The log registry-wide events are reported through. It is not
    /// registered under its name.
    pub fn master_log(&self) -> Logger {
        self.shared.master()
    }

    /// Level of logs created from now on without an explicit level.
    /// Logs that already exist keep theirs. Returns the previous default.
    pub fn set_default_level(&self, level: LogLevel) -> LogLevel {
        std::mem::replace(&mut *self.shared.default_level.write(), level)
    }

    pub fn default_level(&self) -> LogLevel {
        *self.shared.default_level.read()
    }

    /// Register (or replace) the factory for a sink type tag
    pub fn register_sink_type<F>(&self, tag: impl Into<String>, factory: F)
    where
        F: Fn() -> Result<SinkHandle> + Send + Sync + 'static,
    {
        self.shared
            .factories
            .write()
            .insert(tag.into(), Arc::new(factory));
    }

    /// Instantiate a sink of a registered type
    pub fn create_sink(&self, tag: &str) -> Result<SinkHandle> {
        self.shared.create_sink(tag)
    }

    pub fn sink_types(&self) -> Vec<String> {
        let mut tags: Vec<String> = self.shared.factories.read().keys().cloned().collect();
        tags.sort();
        tags
    }

    /// Make `parent` a level parent of `child`. Both must be registered.
    pub fn add_parent(&self, child: &str, parent: &str) -> Result<bool> {
        let child = self.get(child).ok_or_else(|| LoggerError::not_found(child))?;
        let parent = self
            .get(parent)
            .ok_or_else(|| LoggerError::not_found(parent))?;
        Ok(child.add_parent(&parent))
    }

    pub fn highlighted_count(&self) -> usize {
        self.shared.highlights.count()
    }

    /// Width source names are padded to
    pub fn name_width(&self) -> usize {
        self.shared.name_width()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Registry {
    fn drop(&mut self) {
        if let Err(e) = self.shared.close_all() {
            eprintln!("[LOGGER WARNING] Registry shutdown incomplete: {}", e);
        }
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("logs", &self.names())
            .field("performance_mode", &self.is_performance_mode())
            .finish()
    }
}

/// Builder for [`Registry`] with a fluent API
///
/// # Example
///
/// ```
/// use rust_unit_logging::{LogLevel, Registry};
/// use std::time::Duration;
///
/// let registry = Registry::builder()
///     .default_level(LogLevel::Info)
///     .default_sink("null")
///     .performance_interval(Duration::from_millis(20))
///     .build();
/// assert_eq!(registry.default_level(), LogLevel::Info);
/// ```
#[must_use]
pub struct RegistryBuilder {
    config: RegistryConfig,
    factories: Vec<(String, SinkFactory)>,
    performance_mode: bool,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self {
            config: RegistryConfig::default(),
            factories: Vec::new(),
            performance_mode: false,
        }
    }

    /// Replace the whole configuration
    pub fn config(mut self, config: RegistryConfig) -> Self {
        self.config = config;
        self
    }

    pub fn default_level(mut self, level: LogLevel) -> Self {
        self.config.default_level = level;
        self
    }

    pub fn default_sink(mut self, tag: impl Into<String>) -> Self {
        self.config.default_sink = tag.into();
        self
    }

    pub fn performance_interval(mut self, interval: Duration) -> Self {
        self.config.performance_interval_ms = interval.as_millis() as u64;
        self
    }

    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.config.shutdown_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn highlight_indent(mut self, indent: impl Into<String>) -> Self {
        self.config.highlight_indent = indent.into();
        self
    }

    pub fn sink_type<F>(mut self, tag: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Result<SinkHandle> + Send + Sync + 'static,
    {
        self.factories.push((tag.into(), Arc::new(factory)));
        self
    }

    /// Start with performance mode enabled
    pub fn global_performance_mode(mut self) -> Self {
        self.performance_mode = true;
        self
    }

    /// Build the registry. If the performance worker cannot be started,
    /// the registry logs synchronously.
    pub fn build(self) -> Registry {
        let registry = Registry::with_config(self.config);
        {
            let mut factories = registry.shared.factories.write();
            for (tag, factory) in self.factories {
                factories.insert(tag, factory);
            }
        }

        if self.performance_mode {
            if let Err(e) = registry.enable_global_performance_mode() {
                eprintln!("[LOGGER ERROR] Could not start performance worker: {}", e);
            }
        }
        registry
    }
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}
