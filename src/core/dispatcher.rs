//! Performance-mode dispatch
//!
//! Producers push raw entries (template and unformatted arguments) onto one
//! unbounded queue and return at once. A single worker wakes up every
//! interval and drains the queue, composing each message and handing it to
//! the sinks its log had when the call was made. Entries are dispatched in
//! enqueue order: whoever drains (the worker, a flushing log or shutdown)
//! holds the drain lock for the whole pass.

use super::error::Result;
use super::fanout::AttachedSink;
use super::format::{compose, Argument};
use super::log_level::LogLevel;
use super::logger::Logger;
use super::scheduler::{join_with_timeout, panic_message};
use chrono::{DateTime, Utc};
use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// A log call waiting for the worker
pub(crate) struct QueuedEntry {
    pub logger: Logger,
    /// Sinks attached when the call was made
    pub sinks: Vec<AttachedSink>,
    pub level: LogLevel,
    pub template: String,
    pub args: Vec<Argument>,
    /// Taken on the calling thread, before the entry was queued
    pub timestamp: DateTime<Utc>,
}

impl QueuedEntry {
    fn dispatch(self) {
        let message = compose(&self.template, &self.args);
        self.logger
            .dispatch_to(&self.sinks, self.level, &message, self.timestamp);
    }
}

struct Queue {
    receiver: Receiver<QueuedEntry>,
    drain_lock: Mutex<()>,
}

impl Queue {
    fn drain(&self) -> usize {
        let _guard = self.drain_lock.lock();
        let mut count = 0;

        while let Ok(entry) = self.receiver.try_recv() {
            let logger = entry.logger.name().to_string();
            if let Err(panic_info) = catch_unwind(AssertUnwindSafe(|| entry.dispatch())) {
                eprintln!(
                    "[LOGGER CRITICAL] Queued entry of log [{}] panicked: {}",
                    logger,
                    panic_message(panic_info.as_ref())
                );
            }
            count += 1;
        }

        count
    }
}

struct Worker {
    stop: Sender<()>,
    handle: thread::JoinHandle<()>,
}

pub(crate) struct Dispatcher {
    sender: Sender<QueuedEntry>,
    queue: Arc<Queue>,
    worker: Mutex<Option<Worker>>,
    stopped: AtomicBool,
}

impl Dispatcher {
    /// Create the queue and start the worker
    pub(crate) fn start(interval: Duration) -> Result<Self> {
        let (sender, receiver) = unbounded();
        let queue = Arc::new(Queue {
            receiver,
            drain_lock: Mutex::new(()),
        });

        let (stop, stop_rx) = bounded::<()>(1);
        let worker_queue = Arc::clone(&queue);
        let handle = thread::Builder::new()
            .name("log-performance-worker".to_string())
            .spawn(move || loop {
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {
                        worker_queue.drain();
                    }
                    // Stop signal or every sender gone
                    _ => {
                        worker_queue.drain();
                        break;
                    }
                }
            })?;

        Ok(Self {
            sender,
            queue,
            worker: Mutex::new(Some(Worker { stop, handle })),
            stopped: AtomicBool::new(false),
        })
    }

    /// Queue an entry. Hands it back when the dispatcher has been shut down.
    pub(crate) fn try_enqueue(&self, entry: QueuedEntry) -> std::result::Result<(), QueuedEntry> {
        if self.stopped.load(Ordering::SeqCst) {
            return Err(entry);
        }

        self.sender.send(entry).map_err(|e| e.into_inner())?;

        // Lost the race against shutdown's final drain
        if self.stopped.load(Ordering::SeqCst) {
            self.queue.drain();
        }
        Ok(())
    }

    /// Dispatch everything queued so far on the calling thread
    pub(crate) fn drain(&self) -> usize {
        self.queue.drain()
    }

    pub(crate) fn pending(&self) -> usize {
        self.queue.receiver.len()
    }

    pub(crate) fn is_running(&self) -> bool {
        self.worker.lock().is_some()
    }

    /// Drain the queue, stop the worker and wait at most `timeout` for it.
    pub(crate) fn shutdown(&self, timeout: Duration) -> Result<()> {
        self.queue.drain();
        self.stopped.store(true, Ordering::SeqCst);

        let Some(worker) = self.worker.lock().take() else {
            return Ok(());
        };
        let _ = worker.stop.send(());
        drop(worker.stop);

        // The worker itself may drop the last handle to the registry
        if worker.handle.thread().id() == thread::current().id() {
            return Ok(());
        }

        let joined = join_with_timeout(worker.handle, "performance worker", timeout);
        self.queue.drain();
        joined
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown(super::config::DEFAULT_SHUTDOWN_TIMEOUT) {
            eprintln!("[LOGGER WARNING] {}", e);
        }
    }
}
