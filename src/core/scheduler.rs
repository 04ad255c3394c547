//! Deferred flush scheduling
//!
//! One timer thread per registry keeps a min-heap of pending tasks ordered by
//! deadline. Producers talk to it over a channel, so scheduling never waits
//! on the timer thread. The thread is started on the first `schedule` call.

use super::error::{LoggerError, Result};
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};

pub type Task = Box<dyn FnOnce() + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

enum Command {
    Schedule {
        id: TaskId,
        deadline: Instant,
        task: Task,
    },
    Cancel(TaskId),
    Shutdown,
}

struct Worker {
    sender: Sender<Command>,
    handle: thread::JoinHandle<()>,
}

pub struct FlushScheduler {
    worker: Mutex<Option<Worker>>,
    next_id: AtomicU64,
    stopped: AtomicBool,
}

impl FlushScheduler {
    pub fn new() -> Self {
        Self {
            worker: Mutex::new(None),
            next_id: AtomicU64::new(1),
            stopped: AtomicBool::new(false),
        }
    }

    /// Run `task` once, `delay` from now.
    ///
    /// Returns `None` when the scheduler was shut down; the task is dropped
    /// without running.
    pub fn schedule(&self, delay: Duration, task: Task) -> Option<TaskId> {
        if self.stopped.load(Ordering::Acquire) {
            return None;
        }

        let id = TaskId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let command = Command::Schedule {
            id,
            deadline: Instant::now() + delay,
            task,
        };

        let mut worker = self.worker.lock();
        if worker.is_none() {
            match Self::spawn() {
                Ok(spawned) => *worker = Some(spawned),
                Err(e) => {
                    eprintln!("[LOGGER ERROR] Could not start flush scheduler: {}", e);
                    return None;
                }
            }
        }

        worker
            .as_ref()
            .and_then(|w| w.sender.send(command).ok())
            .map(|()| id)
    }

    /// Drop a pending task. Unknown or already-run tasks are ignored.
    pub fn cancel(&self, id: TaskId) {
        if let Some(worker) = self.worker.lock().as_ref() {
            let _ = worker.sender.send(Command::Cancel(id));
        }
    }

    pub fn is_running(&self) -> bool {
        self.worker.lock().is_some()
    }

    /// Run every pending task now, then stop the timer thread.
    ///
    /// Waits at most `timeout` for the thread to finish.
    pub fn shutdown(&self, timeout: Duration) -> Result<()> {
        self.stopped.store(true, Ordering::Release);

        let Some(worker) = self.worker.lock().take() else {
            return Ok(());
        };
        let _ = worker.sender.send(Command::Shutdown);
        drop(worker.sender);

        join_with_timeout(worker.handle, "flush scheduler", timeout)
    }

    fn spawn() -> std::io::Result<Worker> {
        let (sender, receiver) = unbounded();
        let handle = thread::Builder::new()
            .name("log-flush-scheduler".to_string())
            .spawn(move || Self::run(receiver))?;
        Ok(Worker { sender, handle })
    }

    fn run(receiver: Receiver<Command>) {
        let mut deadlines: BinaryHeap<Reverse<(Instant, TaskId)>> = BinaryHeap::new();
        let mut tasks: HashMap<TaskId, Task> = HashMap::new();

        loop {
            let received = match deadlines.peek() {
                Some(Reverse((deadline, _))) => match receiver.recv_deadline(*deadline) {
                    Ok(command) => Some(command),
                    Err(RecvTimeoutError::Timeout) => None,
                    Err(RecvTimeoutError::Disconnected) => Some(Command::Shutdown),
                },
                None => Some(receiver.recv().unwrap_or(Command::Shutdown)),
            };

            match received {
                Some(Command::Schedule { id, deadline, task }) => {
                    tasks.insert(id, task);
                    deadlines.push(Reverse((deadline, id)));
                }
                Some(Command::Cancel(id)) => {
                    tasks.remove(&id);
                }
                Some(Command::Shutdown) => {
                    // Pending flushes still carry buffered records
                    while let Some(Reverse((_, id))) = deadlines.pop() {
                        if let Some(task) = tasks.remove(&id) {
                            run_task(task);
                        }
                    }
                    break;
                }
                None => {}
            }

            let now = Instant::now();
            while let Some(Reverse((deadline, id))) = deadlines.peek().copied() {
                if deadline > now {
                    break;
                }
                deadlines.pop();
                if let Some(task) = tasks.remove(&id) {
                    run_task(task);
                }
            }
        }
    }
}

impl Default for FlushScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for FlushScheduler {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown(super::config::DEFAULT_SHUTDOWN_TIMEOUT) {
            eprintln!("[LOGGER WARNING] {}", e);
        }
    }
}

fn run_task(task: Task) {
    if let Err(panic_info) = std::panic::catch_unwind(std::panic::AssertUnwindSafe(task)) {
        eprintln!(
            "[LOGGER CRITICAL] Scheduled flush panicked: {}",
            panic_message(panic_info.as_ref())
        );
    }
}

/// Extract a readable message from a panic payload
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

/// Join `handle`, giving up after `timeout`
pub(crate) fn join_with_timeout(
    handle: thread::JoinHandle<()>,
    worker: &str,
    timeout: Duration,
) -> Result<()> {
    let start = Instant::now();

    loop {
        if handle.is_finished() {
            return handle
                .join()
                .map_err(|_| LoggerError::WorkerPanicked(worker.to_string()));
        }

        if start.elapsed() >= timeout {
            return Err(LoggerError::shutdown_timeout(worker, timeout));
        }

        // Small sleep to avoid busy-waiting
        thread::sleep(Duration::from_millis(5));
    }
}
