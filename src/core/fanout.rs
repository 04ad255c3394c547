//! Per-sink delivery
//!
//! Every attached sink lives in its own slot together with the text that is
//! waiting for its next batched update. A slot owns at most one scheduled
//! flush at a time: while one is pending, further records only extend the
//! pending text.
//!
//! Every call into sink code runs under `catch_unwind`, so a failing or
//! panicking sink never keeps the other sinks of the log from receiving a
//! record. The first failure of a sink is reported on stderr; later ones are
//! only counted.

use super::error::{LoggerError, Result};
use super::format::{format_line, LineContext};
use super::metrics::LoggerMetrics;
use super::scheduler::{panic_message, FlushScheduler, TaskId};
use super::sink::{SinkHandle, SinkId};
use parking_lot::Mutex;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Weak};
use std::time::Duration;

struct SinkSlot {
    handle: SinkHandle,
    /// Formatted text not yet handed to a buffer sink. With full history
    /// retained this is the whole log so far.
    pending: String,
    /// Something arrived since the last update or flush
    dirty: bool,
    scheduled: Option<TaskId>,
    detached: bool,
    failure_reported: bool,
    owner: String,
    metrics: Arc<LoggerMetrics>,
}

impl SinkSlot {
    fn write(&mut self, formatted: &str) -> bool {
        self.dirty = true;
        let result = match &mut self.handle {
            SinkHandle::Stream(s) => guarded(|| s.write(formatted.as_bytes())),
            SinkHandle::Buffer(_) => {
                self.pending.push_str(formatted);
                return true;
            }
        };
        self.settle("write", result)
    }

    /// Hand everything pending to the sink
    fn flush_pending(&mut self) -> bool {
        if !self.dirty {
            return true;
        }

        let result = match &mut self.handle {
            SinkHandle::Stream(s) => guarded(|| s.flush_now()),
            SinkHandle::Buffer(b) => {
                let text = &self.pending;
                guarded(|| b.update(text))
            }
        };

        let delivered = self.settle("update", result);
        if delivered {
            self.dirty = false;
            if let SinkHandle::Buffer(b) = &self.handle {
                if !b.retain_full_history() {
                    self.pending.clear();
                }
            }
        }
        delivered
    }

    fn settle(&mut self, operation: &str, result: Result<()>) -> bool {
        match result {
            Ok(()) => true,
            Err(e) => {
                self.metrics.record_sink_failure();
                if !self.failure_reported {
                    self.failure_reported = true;
                    match e {
                        LoggerError::WorkerPanicked(msg) => eprintln!(
                            "[LOGGER CRITICAL] Sink '{}' of log [{}] panicked during {}: {}. \
                             Other sinks continue to function.",
                            self.handle.name(),
                            self.owner,
                            operation,
                            msg
                        ),
                        e => eprintln!(
                            "[LOGGER ERROR] Sink '{}' of log [{}] failed during {}: {}",
                            self.handle.name(),
                            self.owner,
                            operation,
                            e
                        ),
                    }
                }
                false
            }
        }
    }
}

fn guarded<F: FnOnce() -> Result<()>>(f: F) -> Result<()> {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(panic_info) => Err(LoggerError::WorkerPanicked(panic_message(
            panic_info.as_ref(),
        ))),
    }
}

/// One record on its way to the sinks of a log
pub(crate) struct Record<'a> {
    pub context: LineContext<'a>,
    pub message: &'a str,
}

/// A sink attached to a log
#[derive(Clone)]
pub(crate) struct AttachedSink {
    id: SinkId,
    slot: Arc<Mutex<SinkSlot>>,
}

impl AttachedSink {
    pub(crate) fn new(
        id: SinkId,
        handle: SinkHandle,
        owner: &str,
        metrics: Arc<LoggerMetrics>,
    ) -> Self {
        Self {
            id,
            slot: Arc::new(Mutex::new(SinkSlot {
                handle,
                pending: String::new(),
                dirty: false,
                scheduled: None,
                detached: false,
                failure_reported: false,
                owner: owner.to_string(),
                metrics,
            })),
        }
    }

    pub(crate) fn id(&self) -> SinkId {
        self.id
    }

    pub(crate) fn name(&self) -> String {
        self.slot.lock().handle.name().to_string()
    }

    /// Format `record` for this sink and deliver it, now or on the sink's
    /// cadence. Returns `false` when the sink failed.
    pub(crate) fn deliver(&self, record: &Record<'_>, scheduler: &FlushScheduler) -> bool {
        let mut slot = self.slot.lock();
        if slot.detached {
            return false;
        }

        let ctx = &record.context;
        let handle = &slot.handle;
        let formatted = catch_unwind(AssertUnwindSafe(|| {
            if handle.uses_custom_format() {
                handle.format_at(ctx.level, ctx.source, record.message, ctx.timestamp)
            } else {
                let line = format_line(handle.format_flags(), ctx, record.message);
                handle.decorate(ctx.level, line)
            }
        }));
        let formatted = match formatted {
            Ok(text) => text,
            Err(panic_info) => {
                let err = LoggerError::WorkerPanicked(panic_message(panic_info.as_ref()));
                return slot.settle("format", Err(err));
            }
        };

        if !slot.write(&formatted) {
            return false;
        }

        let cadence = slot.handle.update_cadence_millis();
        if cadence <= 0 {
            return slot.flush_pending();
        }

        if slot.scheduled.is_none() {
            let weak = Arc::downgrade(&self.slot);
            let delay = Duration::from_millis(cadence as u64);
            slot.scheduled = scheduler.schedule(delay, Box::new(move || run_scheduled(weak)));
            if slot.scheduled.is_none() {
                // Scheduler is gone: deliver now rather than never
                return slot.flush_pending();
            }
        }
        true
    }

    /// Deliver pending text immediately and drop the scheduled flush
    pub(crate) fn flush(&self, scheduler: &FlushScheduler) {
        let mut slot = self.slot.lock();
        if slot.detached {
            return;
        }
        if let Some(task) = slot.scheduled.take() {
            scheduler.cancel(task);
        }
        slot.flush_pending();
    }

    /// Cancel the scheduled flush, deliver what is pending and release the
    /// sink. Runs `on_detach` exactly once.
    pub(crate) fn detach(&self, scheduler: &FlushScheduler) {
        let mut slot = self.slot.lock();
        if slot.detached {
            return;
        }
        if let Some(task) = slot.scheduled.take() {
            scheduler.cancel(task);
        }
        slot.flush_pending();
        slot.detached = true;

        let result = guarded(|| slot.handle.on_detach());
        slot.settle("detach", result);
    }
}

fn run_scheduled(slot: Weak<Mutex<SinkSlot>>) {
    let Some(slot) = slot.upgrade() else {
        return;
    };
    let mut slot = slot.lock();
    slot.scheduled = None;
    if !slot.detached {
        slot.flush_pending();
    }
}
