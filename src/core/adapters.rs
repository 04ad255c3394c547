//! The logging capability and its thin adapters
//!
//! [`LogCalls`] is implemented by [`Logger`]. Code that should only be able
//! to log, not reconfigure, gets a [`LogFacade`] instead. [`DumbLog`] is a
//! stand-in for places that need a log before any registry exists.

use super::format::{arg, compose, Argument};
use super::log_level::LogLevel;
use super::logger::Logger;
use std::fmt;

/// A switch deciding whether a debug call produces output
pub trait DebugItem {
    fn enabled(&self) -> bool;
}

impl DebugItem for bool {
    fn enabled(&self) -> bool {
        *self
    }
}

/// Logging calls shared by every kind of log
///
/// Only [`log`](LogCalls::log) and [`is_enabled`](LogCalls::is_enabled) are
/// required; the shorthands delegate to them.
pub trait LogCalls {
    fn log(&self, level: LogLevel, template: &str, args: Vec<Argument>);

    fn is_enabled(&self, level: LogLevel) -> bool;

    fn le(&self, template: &str, args: Vec<Argument>) {
        self.log(LogLevel::Error, template, args);
    }

    fn lw(&self, template: &str, args: Vec<Argument>) {
        self.log(LogLevel::Warn, template, args);
    }

    fn li(&self, template: &str, args: Vec<Argument>) {
        self.log(LogLevel::Info, template, args);
    }

    fn lf(&self, template: &str, args: Vec<Argument>) {
        self.log(LogLevel::Trace, template, args);
    }

    fn error(&self, message: &str) {
        self.log(LogLevel::Error, message, Vec::new());
    }

    fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, message, Vec::new());
    }

    fn info(&self, message: &str) {
        self.log(LogLevel::Info, message, Vec::new());
    }

    fn trace(&self, message: &str) {
        self.log(LogLevel::Trace, message, Vec::new());
    }

    /// Log `ret` at TRACE, followed by the message if one is given, and
    /// return it. Meant for `return log.lr(value, ...)`.
    fn lr<T>(&self, ret: T, template: &str, args: Vec<Argument>) -> T
    where
        Self: Sized,
        T: fmt::Display + Clone + Send + 'static,
    {
        if !self.is_enabled(LogLevel::Trace) {
            return ret;
        }
        let mut all = Vec::with_capacity(args.len() + 1);
        all.push(arg(ret.clone()));
        all.extend(args);
        if template.is_empty() {
            self.log(LogLevel::Trace, "[]", all);
        } else {
            self.log(LogLevel::Trace, &format!("[]: {}", template), all);
        }
        ret
    }

    /// Log at ERROR and return `ret`. Meant for `return log.ler(false, ...)`.
    fn ler(&self, ret: bool, template: &str, args: Vec<Argument>) -> bool {
        self.le(template, args);
        ret
    }

    /// Log at TRACE only while `item` is enabled
    fn dbg(&self, item: &dyn DebugItem, template: &str, args: Vec<Argument>) {
        if item.enabled() {
            self.lf(template, args);
        }
    }
}

impl<T: LogCalls + ?Sized> LogCalls for &T {
    fn log(&self, level: LogLevel, template: &str, args: Vec<Argument>) {
        (**self).log(level, template, args);
    }

    fn is_enabled(&self, level: LogLevel) -> bool {
        (**self).is_enabled(level)
    }
}

/// Logging calls of a [`Logger`] without access to its configuration
#[derive(Debug, Clone)]
pub struct LogFacade {
    logger: Logger,
}

impl LogFacade {
    pub fn new(logger: Logger) -> Self {
        Self { logger }
    }

    pub fn name(&self) -> &str {
        self.logger.name()
    }
}

impl From<Logger> for LogFacade {
    fn from(logger: Logger) -> Self {
        Self::new(logger)
    }
}

impl LogCalls for LogFacade {
    fn log(&self, level: LogLevel, template: &str, args: Vec<Argument>) {
        self.logger.log(level, template, args);
    }

    fn is_enabled(&self, level: LogLevel) -> bool {
        self.logger.is_enabled(level)
    }
}

/// Prints `<preamble> <message>` to stdout, whatever the level
#[derive(Debug, Clone)]
pub struct DumbLog {
    preamble: String,
}

impl DumbLog {
    pub const DEFAULT_PREAMBLE: &'static str = "#";

    pub fn new() -> Self {
        Self::with_preamble(Self::DEFAULT_PREAMBLE)
    }

    pub fn with_preamble(preamble: impl Into<String>) -> Self {
        Self {
            preamble: preamble.into(),
        }
    }

    pub fn render(&self, template: &str, args: &[Argument]) -> String {
        format!("{} {}", self.preamble, compose(template, args))
    }
}

impl Default for DumbLog {
    fn default() -> Self {
        Self::new()
    }
}

impl LogCalls for DumbLog {
    fn log(&self, _level: LogLevel, template: &str, args: Vec<Argument>) {
        println!("{}", self.render(template, &args));
    }

    fn is_enabled(&self, _level: LogLevel) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::registry::Registry;
    use crate::sinks::MemorySink;

    fn setup(registry: &Registry) -> (LogFacade, crate::sinks::MemoryLog) {
        let logger = registry.logger("calls").expect("fresh name");
        let sink = MemorySink::new("memory");
        let contents = sink.log();
        logger.attach_buffer(sink);
        (LogFacade::new(logger), contents)
    }

    #[test]
    fn test_shorthand_levels() {
        let registry = Registry::new();
        let (log, contents) = setup(&registry);

        log.le("e []", vec![arg(1)]);
        log.lw("w", Vec::new());
        log.info("i");
        log.trace("t");

        assert_eq!(
            contents.lines(),
            vec![
                "# [ calls ] e [1]",
                "* [ calls ] w",
                "> [ calls ] i",
                ". [ calls ] t",
            ]
        );
    }

    #[test]
    fn test_lr_returns_value() {
        let registry = Registry::new();
        let (log, contents) = setup(&registry);

        assert_eq!(log.lr(7, "", Vec::new()), 7);
        assert_eq!(log.lr("ok", "done with []", vec![arg("job")]), "ok");

        assert_eq!(
            contents.lines(),
            vec![". [ calls ] [7]", ". [ calls ] [ok]: done with [job]"]
        );
    }

    #[test]
    fn test_ler_logs_error() {
        let registry = Registry::new();
        let (log, contents) = setup(&registry);

        assert!(!log.ler(false, "failed", Vec::new()));
        assert_eq!(contents.lines(), vec!["# [ calls ] failed"]);
    }

    #[test]
    fn test_dbg_follows_item() {
        let registry = Registry::new();
        let (log, contents) = setup(&registry);

        log.dbg(&false, "hidden", Vec::new());
        log.dbg(&true, "shown", Vec::new());
        assert_eq!(contents.lines(), vec![". [ calls ] shown"]);
    }

    #[test]
    fn test_dumb_log_render() {
        let dumb = DumbLog::new();
        assert_eq!(dumb.render("x=[]", &[arg(3)]), "# x=[3]");
        assert!(dumb.is_enabled(LogLevel::Trace));
    }
}
