//! Integration tests for the logging registry
//!
//! These tests verify:
//! - Level filtering and message composition
//! - Registry reuse, name collisions and cascading exits
//! - Level propagation between units
//! - Performance-mode ordering and shutdown draining
//! - Sink isolation, batching and detaching
//! - File, JSON and reporting sinks

use rust_unit_logging::prelude::*;
use rust_unit_logging::sinks::{Display, DisplaySink, JsonSink, ReportingSink};
use std::fs;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;

fn quiet_registry() -> Registry {
    Registry::builder().default_sink("null").build()
}

fn with_memory(logger: &Logger) -> MemoryLog {
    let sink = MemorySink::new("memory");
    let contents = sink.log();
    logger.attach_buffer(sink);
    contents
}

fn wait_for(timeout: Duration, condition: impl Fn() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    condition()
}

struct FailingSink;

impl Sink for FailingSink {
    fn name(&self) -> &str {
        "failing"
    }
}

impl StreamSink for FailingSink {
    fn write(&mut self, _formatted: &[u8]) -> Result<()> {
        Err(LoggerError::sink("failing", "stream closed"))
    }

    fn flush_now(&mut self) -> Result<()> {
        Ok(())
    }
}

struct PanickingSink;

impl Sink for PanickingSink {
    fn name(&self) -> &str {
        "panicking"
    }
}

impl BufferSink for PanickingSink {
    fn update(&mut self, _text: &str) -> Result<()> {
        panic!("display went away");
    }
}

#[test]
fn test_level_filtering() {
    let registry = quiet_registry();
    let logger = registry
        .get_or_create("levels", None, false, Some(LogLevel::Info))
        .expect("fresh name");
    let contents = with_memory(&logger);

    logger.trace("hidden");
    logger.info("info");
    logger.warn("warn");
    logger.error("error");

    assert_eq!(
        contents.lines(),
        vec![
            "> [ levels ] info",
            "* [ levels ] warn",
            "# [ levels ] error"
        ]
    );

    logger.set_level(LogLevel::Off);
    logger.error("never");
    assert_eq!(contents.lines().len(), 3);

    logger.set_level(LogLevel::All);
    logger.trace("everything");
    assert_eq!(contents.lines().len(), 4);
}

#[test]
fn test_placeholder_substitution() {
    let registry = quiet_registry();
    let logger = registry.logger("sub").expect("fresh name");
    let contents = with_memory(&logger);

    logger.li("i am [] here", vec![arg("standing")]);
    logger.li("[]", vec![arg("a"), arg("b")]);
    logger.li("[] and []", vec![arg("one")]);

    assert_eq!(
        contents.lines(),
        vec![
            "> [ sub ] i am [standing] here",
            "> [ sub ] [a][b]",
            "> [ sub ] [one] and []",
        ]
    );
}

#[test]
fn test_registry_reuse_and_collision() {
    let registry = quiet_registry();
    let first = registry
        .get_or_create("X", None, false, Some(LogLevel::Warn))
        .expect("created");
    let second = registry
        .get_or_create("X", Some("ignored"), false, Some(LogLevel::Trace))
        .expect("existing returned");

    // Same underlying log: a sink attached through one handle serves both
    let contents = with_memory(&first);
    second.error("through second");
    assert_eq!(contents.lines(), vec!["# [ X ] through second"]);
    assert_eq!(second.level(), Some(LogLevel::Warn));

    let err = registry
        .get_or_create("X", None, true, None)
        .expect_err("ensure_new on a taken name");
    assert!(matches!(err, LoggerError::NameCollision { ref name } if name == "X"));
}

#[test]
fn test_cascade_close() {
    let registry = quiet_registry();
    let shared = MemoryLog::new();

    let parent = registry.logger("parent").expect("fresh name");
    parent.attach_buffer(MemorySink::with_log("p", shared.clone()));
    let child = registry
        .get_or_create("child", Some("parent"), true, None)
        .expect("fresh name");
    child.attach_buffer(MemorySink::with_log("c", shared.clone()));

    registry.exit("parent", true).expect("registered");

    assert!(!registry.contains("parent"));
    assert!(!registry.contains("child"));
    assert_eq!(
        shared.lines(),
        vec![
            ". [ child  ] log out (logs remaining [1]).",
            ". [ parent ] log out (logs remaining [0]).",
        ]
    );
    assert_eq!(shared.detach_count(), 2);
    assert_eq!(child.state(), LoggerState::Exited);

    let err = registry.exit("parent", false).expect_err("already gone");
    assert!(matches!(err, LoggerError::NotFound { .. }));
}

#[test]
fn test_level_propagation_with_pin() {
    let registry = quiet_registry();
    let a = registry.logger("A").expect("fresh name");
    let b = registry.logger("B").expect("fresh name");
    assert!(b.add_parent(&a));

    a.set_level(LogLevel::Warn);
    assert_eq!(b.level(), Some(LogLevel::Warn));
    assert_eq!(b.pinned_level(), None);

    b.set_level(LogLevel::Trace);
    a.set_level(LogLevel::Error);
    assert_eq!(a.level(), Some(LogLevel::Error));
    assert_eq!(b.level(), Some(LogLevel::Trace));
}

#[test]
fn test_add_parent_adopts_current_level() {
    let registry = quiet_registry();
    let a = registry
        .get_or_create("A", None, false, Some(LogLevel::Error))
        .expect("fresh name");
    let b = registry.logger("B").expect("fresh name");

    registry.add_parent("B", "A").expect("both registered");
    assert_eq!(b.level(), Some(LogLevel::Error));

    let contents = with_memory(&b);
    b.info("filtered by inherited level");
    assert!(contents.lines().is_empty());
    assert!(a.is_enabled(LogLevel::Error));
}

#[test]
fn test_performance_mode_preserves_order() {
    let registry = Registry::builder()
        .default_sink("null")
        .performance_interval(Duration::from_secs(60))
        .build();
    registry
        .enable_global_performance_mode()
        .expect("worker starts");
    let logger = registry.logger("perf").expect("fresh name");
    let contents = with_memory(&logger);

    const N: usize = 200;
    for i in 0..N {
        logger.li("message []", vec![arg(i)]);
    }

    // Nothing formatted on the calling thread
    assert!(contents.lines().is_empty());
    assert_eq!(logger.metrics().queued(), N as u64);
    assert_eq!(registry.queued(), N);

    registry.close_all().expect("worker stops");

    let lines = contents.lines();
    // The final line is the exit message
    assert_eq!(lines.len(), N + 1);
    for (i, line) in lines.iter().take(N).enumerate() {
        assert_eq!(line, &format!("> [ perf ] message [{}]", i));
    }
}

#[test]
fn test_performance_worker_drains_on_its_own() {
    let registry = Registry::builder()
        .default_sink("null")
        .performance_interval(Duration::from_millis(10))
        .global_performance_mode()
        .build();
    assert!(registry.is_performance_mode());
    assert!(registry.is_worker_running());

    let logger = registry.logger("perf").expect("fresh name");
    let contents = with_memory(&logger);
    for i in 0..20 {
        logger.li("[]", vec![arg(i)]);
    }

    assert!(wait_for(Duration::from_secs(5), || {
        logger.metrics().total_logged() == 20
    }));
    assert_eq!(contents.lines().len(), 20);
    assert_eq!(registry.queued(), 0);
}

#[test]
fn test_performance_mode_opt_out() {
    let registry = Registry::builder()
        .default_sink("null")
        .performance_interval(Duration::from_secs(60))
        .global_performance_mode()
        .build();
    let logger = registry.logger("sync").expect("fresh name");
    logger.set_performance_mode(false);
    let contents = with_memory(&logger);

    logger.info("immediate");
    assert_eq!(contents.lines(), vec!["> [ sync ] immediate"]);
    assert!(!logger.is_performance_mode());
}

#[test]
fn test_exit_in_performance_mode_delivers_queued() {
    let registry = Registry::builder()
        .default_sink("null")
        .performance_interval(Duration::from_secs(60))
        .global_performance_mode()
        .build();
    let logger = registry.logger("q").expect("fresh name");
    let contents = with_memory(&logger);

    logger.info("queued");
    logger.exit(false).expect("registered");

    assert_eq!(
        contents.lines(),
        vec!["> [ q ] queued", ". [ q ] log out (logs remaining [0])."]
    );
}

#[test]
fn test_sink_isolation() {
    let registry = quiet_registry();
    let logger = registry.logger("iso").expect("fresh name");
    logger.attach_stream(FailingSink);
    logger.attach_buffer(PanickingSink);
    let contents = with_memory(&logger);

    logger.info("still delivered");
    logger.info("again");

    assert_eq!(
        contents.lines(),
        vec!["> [ iso ] still delivered", "> [ iso ] again"]
    );
    assert_eq!(logger.metrics().sink_failures(), 4);
    assert_eq!(logger.metrics().total_logged(), 2);
}

#[test]
fn test_immediate_buffer_sink_receives_separate_updates() {
    let registry = quiet_registry();
    let logger = registry.logger("buf").expect("fresh name");
    let sink = MemorySink::new("memory")
        .with_cadence(0)
        .with_full_history(false)
        .with_flags(FormatFlags::NONE);
    let contents = sink.log();
    logger.attach_buffer(sink);

    logger.info("a");
    logger.info("b");

    assert_eq!(contents.updates(), vec!["> a\n", "> b\n"]);
}

#[test]
fn test_cadence_batches_updates() {
    let registry = quiet_registry();
    let logger = registry.logger("batch").expect("fresh name");
    let sink = MemorySink::new("memory").with_cadence(50);
    let contents = sink.log();
    logger.attach_buffer(sink);

    for i in 0..5 {
        logger.li("[]", vec![arg(i)]);
    }
    assert_eq!(contents.update_count(), 0);

    assert!(wait_for(Duration::from_secs(5), || contents.update_count() == 1));
    assert_eq!(contents.lines().len(), 5);

    // A later record gets a new scheduled update
    logger.info("next");
    assert!(wait_for(Duration::from_secs(5), || contents.update_count() == 2));
    assert_eq!(contents.updates()[1], "> [ batch ] next\n");
}

#[test]
fn test_flush_delivers_pending_batch() {
    let registry = quiet_registry();
    let logger = registry.logger("flush").expect("fresh name");
    let sink = MemorySink::new("memory").with_cadence(60_000);
    let contents = sink.log();
    logger.attach_buffer(sink);

    logger.info("one");
    logger.info("two");
    logger.flush();

    assert_eq!(contents.update_count(), 1);
    assert_eq!(contents.lines().len(), 2);
}

#[test]
fn test_detach_cancels_and_delivers() {
    let registry = quiet_registry();
    let logger = registry.logger("det").expect("fresh name");
    let sink = MemorySink::new("memory").with_cadence(60_000);
    let contents = sink.log();
    let id = logger.attach_buffer(sink);

    logger.info("pending");
    assert!(logger.detach_sink(id));

    assert_eq!(contents.lines(), vec!["> [ det ] pending"]);
    assert_eq!(contents.detach_count(), 1);
    assert_eq!(logger.sink_count(), 0);
}

#[test]
fn test_file_sink() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let log_file = temp_dir.path().join("units.log");

    let registry = quiet_registry();
    let logger = registry.logger("disk").expect("fresh name");
    let sink = FileSink::new(&log_file)
        .expect("Failed to create sink")
        .with_flags(FormatFlags::INCLUDE_NAME);
    logger.attach_stream(sink);

    logger.li("written []", vec![arg(1)]);
    logger.warn("second");
    logger.exit(true).expect("registered");

    let content = fs::read_to_string(&log_file).expect("Failed to read log file");
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(
        lines,
        vec![
            "> [ disk ] written [1]",
            "* [ disk ] second",
            ". [ disk ] log out (logs remaining [0]).",
        ]
    );
}

#[test]
fn test_file_sink_record_separator() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let log_file = temp_dir.path().join("records.log");

    let registry = quiet_registry();
    let logger = registry
        .get_or_create("rs", None, false, Some(LogLevel::Info))
        .expect("fresh name");
    logger.attach_stream(
        FileSink::new(&log_file)
            .expect("Failed to create sink")
            .with_flags(FormatFlags::REPLACE_LINE_BREAKS),
    );

    logger.info("multi\nline");
    logger.info("next");
    logger.exit(true).expect("registered");

    let content = fs::read_to_string(&log_file).expect("Failed to read log file");
    let records: Vec<&str> = content.split('\u{1e}').filter(|r| !r.is_empty()).collect();
    assert_eq!(records, vec!["> multi\nline", "> next"]);
}

#[test]
fn test_json_sink() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let log_file = temp_dir.path().join("units.jsonl");

    let registry = quiet_registry();
    let logger = registry.logger("json").expect("fresh name");
    logger.attach_stream(JsonSink::create(&log_file).expect("Failed to create sink"));

    logger.lw("disk at []%", vec![arg(91)]);
    logger.exit(true).expect("registered");

    let content = fs::read_to_string(&log_file).expect("Failed to read log file");
    let first: serde_json::Value =
        serde_json::from_str(content.lines().next().expect("one line")).expect("valid JSON");
    assert_eq!(first["source"], "json");
    assert_eq!(first["message"], "disk at [91]%");
    assert_eq!(first["level"], LogLevel::Warn.to_str());
}

#[test]
fn test_reporting_sink_retries_refused_batch() {
    let registry = quiet_registry();
    let logger = registry.logger("rep").expect("fresh name");
    let received = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let seen = Arc::clone(&received);
    let mut calls = 0;

    logger.attach_buffer(
        ReportingSink::new("reporter", move |text: &str| {
            calls += 1;
            seen.lock().push(text.to_string());
            calls > 1
        })
        .with_cadence(0)
        .with_flags(FormatFlags::NONE),
    );

    logger.info("a");
    logger.info("b");
    logger.info("c");

    assert_eq!(*received.lock(), vec!["> a\n", "> a\n> b\n", "> c\n"]);
}

#[test]
fn test_display_sink_gets_full_history() {
    struct Screen(Arc<parking_lot::Mutex<Vec<String>>>);

    impl Display for Screen {
        fn output(&mut self, text: &str) {
            self.0.lock().push(text.to_string());
        }
    }

    let registry = quiet_registry();
    let logger = registry.logger("ui").expect("fresh name");
    let shown = Arc::new(parking_lot::Mutex::new(Vec::new()));
    logger.attach_buffer(
        DisplaySink::new("screen", Screen(Arc::clone(&shown)))
            .with_cadence(20)
            .with_flags(FormatFlags::NONE),
    );

    logger.info("first");
    assert!(wait_for(Duration::from_secs(5), || shown.lock().len() == 1));
    logger.info("second");
    assert!(wait_for(Duration::from_secs(5), || shown.lock().len() == 2));

    let shown = shown.lock();
    assert_eq!(shown[0], "> first\n");
    assert_eq!(shown[1], "> first\n> second\n");
}

#[test]
fn test_configuration_locked_is_logged_not_returned() {
    let registry = quiet_registry();
    let logger = registry.logger("cfg").expect("fresh name");
    let contents = with_memory(&logger);

    logger.info("active now");
    logger.set_default_sink_type("console");

    let lines = contents.lines();
    assert_eq!(lines.len(), 2);
    assert!(lines[1].starts_with("# [ cfg ] configuration of log [cfg] is locked"));
}

#[test]
fn test_log_facade_only_logs() {
    let registry = quiet_registry();
    let logger = registry.logger("facade").expect("fresh name");
    let contents = with_memory(&logger);

    let facade = LogFacade::from(logger.clone());
    facade.li("via facade []", vec![arg(true)]);
    assert_eq!(facade.name(), "facade");
    assert_eq!(contents.lines(), vec!["> [ facade ] via facade [true]"]);
}

#[test]
fn test_global_registry() {
    let registry = Registry::global();
    let logger = registry
        .get_or_create("integration-global", None, false, None)
        .expect("created");
    logger.set_default_sink_type("null");
    logger.info("into the void");

    assert!(Registry::global().contains("integration-global"));
    Registry::global()
        .exit("integration-global", false)
        .expect("registered");
}

#[test]
fn test_reset_all_keeps_handles_working() {
    let registry = quiet_registry();
    let logger = registry.logger("orphan").expect("fresh name");
    let contents = with_memory(&logger);

    registry.reset_all();
    assert!(registry.is_empty());

    logger.info("still logging");
    assert_eq!(contents.lines(), vec!["> [ orphan ] still logging"]);

    // The name is free again
    registry
        .get_or_create("orphan", None, true, None)
        .expect("name released");
}
