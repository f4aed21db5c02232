//! Single-consumer background task queue.
//!
//! Each queue owns one worker thread, started on demand, that executes tasks
//! in FIFO order. A queue moves one way through `Idle -> Running -> Dead`.
//! Sending to a dead queue is not an error: the task is logged and dropped.
//! Shutting a dead queue down again is.
//!
//! ```rust
//! use finite_machine::queue::{DispatchQueue, Task};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let queue = DispatchQueue::new("jobs");
//! let done = Arc::new(AtomicUsize::new(0));
//! queue.start().unwrap();
//!
//! let counter = Arc::clone(&done);
//! queue.enqueue(Task::new("count", move || {
//!     counter.fetch_add(1, Ordering::SeqCst);
//!     Ok(())
//! }));
//!
//! assert!(queue.wait_until_idle(Duration::from_secs(5)));
//! assert_eq!(done.load(Ordering::SeqCst), 1);
//!
//! queue.shutdown().unwrap();
//! assert!(queue.shutdown().is_err());
//! ```

mod error;
mod task;

pub use error::QueueError;
pub use task::Task;

use crate::logger::{Logger, TracingLogger};
use parking_lot::{Condvar, Mutex, MutexGuard, RwLock};
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Observer called with each task right before it runs.
pub type Listener = Arc<dyn Fn(&Task) + Send + Sync>;

/// Lifecycle of a queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueueStatus {
    Idle,
    Running,
    Dead,
}

struct Inner {
    tasks: VecDeque<Task>,
    status: QueueStatus,
    busy: bool,
    worker_exited: bool,
}

struct Shared {
    name: String,
    inner: Mutex<Inner>,
    available: Condvar,
    settled: Condvar,
    listeners: RwLock<Vec<Listener>>,
    logger: Arc<dyn Logger>,
}

impl Shared {
    /// Wait for a `settled` notification. Returns `false` once `deadline`
    /// has passed; no deadline waits untimed.
    fn wait_settled(
        &self,
        inner: &mut MutexGuard<'_, Inner>,
        deadline: Option<Instant>,
    ) -> bool {
        match deadline {
            Some(deadline) => !self.settled.wait_until(inner, deadline).timed_out(),
            None => {
                self.settled.wait(inner);
                true
            }
        }
    }

    fn work(&self) {
        loop {
            let task = {
                let mut inner = self.inner.lock();
                loop {
                    if inner.status == QueueStatus::Dead {
                        inner.busy = false;
                        inner.worker_exited = true;
                        self.settled.notify_all();
                        return;
                    }
                    if let Some(task) = inner.tasks.pop_front() {
                        inner.busy = true;
                        break task;
                    }
                    self.available.wait(&mut inner);
                }
            };

            self.deliver(task);

            let mut inner = self.inner.lock();
            inner.busy = false;
            if inner.tasks.is_empty() {
                self.settled.notify_all();
            }
        }
    }

    fn deliver(&self, task: Task) {
        let listeners = self.listeners.read().clone();
        for listener in &listeners {
            if panic::catch_unwind(AssertUnwindSafe(|| listener(&task))).is_err() {
                self.logger.error(&format!(
                    "queue '{}': listener panicked on task {}",
                    self.name,
                    task.id()
                ));
            }
        }

        let id = task.id();
        let label = task.label().to_string();
        self.logger.debug(&format!(
            "queue '{}': running task {} ({}) after {}ms",
            self.name,
            id,
            label,
            task.waited().num_milliseconds()
        ));
        match panic::catch_unwind(AssertUnwindSafe(move || task.run())) {
            Ok(Ok(())) => {}
            Ok(Err(err)) => self.logger.error(&format!(
                "queue '{}': task {} ({}) failed: {:#}",
                self.name, id, label, err
            )),
            Err(_) => self.logger.error(&format!(
                "queue '{}': task {} ({}) panicked",
                self.name, id, label
            )),
        }
    }
}

/// FIFO of tasks drained by one dedicated worker thread.
pub struct DispatchQueue {
    shared: Arc<Shared>,
}

impl DispatchQueue {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_logger(name, Arc::new(TracingLogger))
    }

    pub fn with_logger(name: impl Into<String>, logger: Arc<dyn Logger>) -> Self {
        Self {
            shared: Arc::new(Shared {
                name: name.into(),
                inner: Mutex::new(Inner {
                    tasks: VecDeque::new(),
                    status: QueueStatus::Idle,
                    busy: false,
                    worker_exited: false,
                }),
                available: Condvar::new(),
                settled: Condvar::new(),
                listeners: RwLock::new(Vec::new()),
                logger,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Spawn the worker. Calling it on a running queue does nothing.
    pub fn start(&self) -> Result<(), QueueError> {
        let mut inner = self.shared.inner.lock();
        match inner.status {
            QueueStatus::Running => return Ok(()),
            QueueStatus::Dead => {
                return Err(QueueError::Dead {
                    queue: self.shared.name.clone(),
                })
            }
            QueueStatus::Idle => {}
        }

        let shared = Arc::clone(&self.shared);
        thread::Builder::new()
            .name(format!("finite-machine-{}", self.shared.name))
            .spawn(move || shared.work())
            .map_err(|err| QueueError::Spawn {
                queue: self.shared.name.clone(),
                message: err.to_string(),
            })?;
        inner.status = QueueStatus::Running;
        Ok(())
    }

    /// Append a task. Tasks sent to a dead queue are logged and dropped.
    pub fn enqueue(&self, task: Task) {
        let mut inner = self.shared.inner.lock();
        if inner.status == QueueStatus::Dead {
            drop(inner);
            self.shared.logger.warn(&format!(
                "queue '{}' is dead, discarding task {} ({})",
                self.shared.name,
                task.id(),
                task.label()
            ));
            return;
        }
        inner.tasks.push_back(task);
        self.shared.available.notify_one();
    }

    /// Register an observer for every dequeued task.
    pub fn subscribe<F>(&self, listener: F)
    where
        F: Fn(&Task) + Send + Sync + 'static,
    {
        self.shared.listeners.write().push(Arc::new(listener));
    }

    /// Stop the queue, discarding tasks not yet started.
    pub fn shutdown(&self) -> Result<(), QueueError> {
        let drained: Vec<Task> = {
            let mut inner = self.shared.inner.lock();
            if inner.status == QueueStatus::Dead {
                return Err(QueueError::Dead {
                    queue: self.shared.name.clone(),
                });
            }
            if inner.status == QueueStatus::Idle {
                inner.worker_exited = true;
            }
            inner.status = QueueStatus::Dead;
            let drained = inner.tasks.drain(..).collect();
            self.shared.available.notify_all();
            self.shared.settled.notify_all();
            drained
        };

        for task in &drained {
            self.shared.logger.warn(&format!(
                "queue '{}' shut down, discarding task {} ({})",
                self.shared.name,
                task.id(),
                task.label()
            ));
        }
        Ok(())
    }

    /// Wait for the worker to exit. Returns `false` on timeout.
    ///
    /// A queue that never started has no worker and joins at once.
    pub fn join(&self, timeout: Duration) -> bool {
        // Timeouts too large to represent as an instant wait without a deadline.
        let deadline = Instant::now().checked_add(timeout);
        let mut inner = self.shared.inner.lock();
        while !inner.worker_exited && inner.status != QueueStatus::Idle {
            if !self.shared.wait_settled(&mut inner, deadline) {
                return inner.worker_exited;
            }
        }
        true
    }

    /// Wait until nothing is queued or running. Returns `false` on timeout.
    pub fn wait_until_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now().checked_add(timeout);
        let mut inner = self.shared.inner.lock();
        while !inner.tasks.is_empty() || inner.busy {
            if !self.shared.wait_settled(&mut inner, deadline) {
                return inner.tasks.is_empty() && !inner.busy;
            }
        }
        true
    }

    pub fn size(&self) -> usize {
        self.shared.inner.lock().tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.inner.lock().tasks.is_empty()
    }

    pub fn is_alive(&self) -> bool {
        self.status() != QueueStatus::Dead
    }

    pub fn status(&self) -> QueueStatus {
        self.shared.inner.lock().status
    }
}

impl Drop for DispatchQueue {
    fn drop(&mut self) {
        if self.is_alive() {
            let _ = self.shutdown();
        }
    }
}

impl std::fmt::Debug for DispatchQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.shared.inner.lock();
        f.debug_struct("DispatchQueue")
            .field("name", &self.shared.name)
            .field("status", &inner.status)
            .field("size", &inner.tasks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::testing::RecordingLogger;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const WAIT: Duration = Duration::from_secs(5);

    #[test]
    fn new_queue_is_idle_and_empty() {
        let queue = DispatchQueue::new("idle");
        assert_eq!(queue.status(), QueueStatus::Idle);
        assert!(queue.is_empty());
        assert!(queue.is_alive());
        assert!(queue.join(Duration::from_millis(10)));
    }

    #[test]
    fn tasks_wait_until_started() {
        let queue = DispatchQueue::new("deferred");
        queue.enqueue(Task::new("a", || Ok(())));
        queue.enqueue(Task::new("b", || Ok(())));
        assert_eq!(queue.size(), 2);

        queue.start().unwrap();
        assert!(queue.wait_until_idle(WAIT));
        assert!(queue.is_empty());
    }

    #[test]
    fn start_is_idempotent() {
        let queue = DispatchQueue::new("twice");
        queue.start().unwrap();
        queue.start().unwrap();
        assert_eq!(queue.status(), QueueStatus::Running);
    }

    #[test]
    fn failing_task_does_not_stop_worker() {
        let queue = DispatchQueue::with_logger("resilient", Arc::new(RecordingLogger::default()));
        let ran = Arc::new(AtomicUsize::new(0));
        queue.start().unwrap();

        queue.enqueue(Task::new("fails", || Err(anyhow::anyhow!("boom"))));
        queue.enqueue(Task::new("panics", || panic!("kaboom")));
        let counter = Arc::clone(&ran);
        queue.enqueue(Task::new("counts", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }));

        assert!(queue.wait_until_idle(WAIT));
        assert_eq!(ran.load(Ordering::SeqCst), 1);
        assert_eq!(queue.status(), QueueStatus::Running);
    }

    #[test]
    fn failures_are_logged() {
        let logger = Arc::new(RecordingLogger::default());
        let queue = DispatchQueue::with_logger("logged", logger.clone());
        queue.start().unwrap();
        queue.enqueue(Task::new("fails", || Err(anyhow::anyhow!("boom"))));
        assert!(queue.wait_until_idle(WAIT));

        assert!(logger
            .lines()
            .iter()
            .any(|line| line.starts_with("error:") && line.contains("boom")));
    }

    #[test]
    fn listeners_see_tasks_in_order() {
        let queue = DispatchQueue::new("observed");
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        queue.subscribe(move |task| sink.lock().push(task.label().to_string()));

        for label in ["one", "two", "three"] {
            queue.enqueue(Task::new(label, || Ok(())));
        }
        queue.start().unwrap();
        assert!(queue.wait_until_idle(WAIT));

        assert_eq!(*seen.lock(), vec!["one", "two", "three"]);
    }

    #[test]
    fn shutdown_discards_pending_tasks() {
        let logger = Arc::new(RecordingLogger::default());
        let queue = DispatchQueue::with_logger("drained", logger.clone());
        let ran = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ran);
        queue.enqueue(Task::new("never", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }));

        queue.shutdown().unwrap();
        assert!(queue.is_empty());
        assert_eq!(ran.load(Ordering::SeqCst), 0);
        assert!(logger.lines().iter().any(|line| line.contains("discarding task")));
    }

    #[test]
    fn enqueue_after_shutdown_is_discarded() {
        let logger = Arc::new(RecordingLogger::default());
        let queue = DispatchQueue::with_logger("dead", logger.clone());
        queue.start().unwrap();
        queue.shutdown().unwrap();

        queue.enqueue(Task::new("late", || Ok(())));
        assert!(queue.is_empty());
        assert!(logger.lines().iter().any(|line| line.starts_with("warn:")));
    }

    #[test]
    fn second_shutdown_fails() {
        let queue = DispatchQueue::new("twice-dead");
        queue.start().unwrap();
        assert!(queue.shutdown().is_ok());
        assert_eq!(
            queue.shutdown(),
            Err(QueueError::Dead {
                queue: "twice-dead".to_string()
            })
        );
        assert!(queue.start().is_err());
    }

    #[test]
    fn join_returns_after_worker_exits() {
        let queue = DispatchQueue::new("joined");
        queue.start().unwrap();
        assert!(!queue.join(Duration::from_millis(20)));

        queue.shutdown().unwrap();
        assert!(queue.join(WAIT));
    }

    #[test]
    fn unbounded_timeouts_do_not_overflow() {
        let queue = DispatchQueue::new("unbounded");
        queue.start().unwrap();
        queue.enqueue(Task::new("quick", || Ok(())));
        assert!(queue.wait_until_idle(Duration::MAX));

        queue.shutdown().unwrap();
        assert!(queue.join(Duration::MAX));
    }
}
