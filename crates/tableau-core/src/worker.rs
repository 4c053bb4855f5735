//! Dedicated background thread for long-running user-triggered work.
//!
//! A [`Worker`] owns one thread and a bounded task queue. Tasks run sequentially.
//! Results that need to touch UI state are delivered with
//! [`send_to_ui`](Worker::send_to_ui), which runs the task on the worker and posts
//! the completion through a [`UiHandle`] so it executes on the UI thread.
//!
//! # Example
//!
//! ```
//! use tableau_core::dispatch::UiDispatcher;
//! use tableau_core::worker::WorkerBuilder;
//!
//! struct Feed { items: Vec<u32> }
//!
//! let dispatcher = UiDispatcher::<Feed>::new();
//! let worker = WorkerBuilder::new().name("feed-loader").build().unwrap();
//!
//! worker
//!     .send_to_ui(|| vec![1u32, 2, 3], &dispatcher.handle(), |feed: &mut Feed, page| {
//!         feed.items.extend(page);
//!     })
//!     .unwrap();
//! worker.stop_and_join();
//!
//! let mut feed = Feed { items: Vec::new() };
//! dispatcher.drain(&mut feed);
//! assert_eq!(feed.items, vec![1, 2, 3]);
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError, bounded};
use parking_lot::Mutex;

use crate::dispatch::UiHandle;
use crate::error::{CoreError, Result};
use crate::logging::targets;

/// Default capacity for the worker's task queue.
const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// Configuration for creating a [`Worker`].
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Name for the worker thread.
    pub name: String,
    /// Stack size in bytes. `None` uses the platform default.
    pub stack_size: Option<usize>,
    /// Capacity of the task queue.
    pub queue_capacity: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            name: "tableau-worker".to_string(),
            stack_size: None,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl WorkerConfig {
    /// Configuration with the given thread name and default limits.
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Builder for [`Worker`]s.
#[derive(Debug, Default)]
pub struct WorkerBuilder {
    config: WorkerConfig,
}

impl WorkerBuilder {
    /// Start from the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the thread name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    /// Set the thread stack size.
    pub fn stack_size(mut self, size: usize) -> Self {
        self.config.stack_size = Some(size);
        self
    }

    /// Set the task queue capacity.
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.config.queue_capacity = capacity.max(1);
        self
    }

    /// Spawn the worker thread.
    pub fn build(self) -> Result<Worker> {
        Worker::with_config(self.config)
    }
}

type Task = Box<dyn FnOnce() + Send + 'static>;

enum Message {
    Run(Task),
    Shutdown,
}

struct WorkerState {
    running: AtomicBool,
    pending: AtomicUsize,
}

/// A dedicated worker thread with a bounded task queue.
pub struct Worker {
    name: String,
    capacity: usize,
    sender: Sender<Message>,
    handle: Mutex<Option<JoinHandle<()>>>,
    state: Arc<WorkerState>,
}

impl std::fmt::Debug for Worker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Worker")
            .field("name", &self.name)
            .field("running", &self.is_running())
            .field("pending", &self.pending_tasks())
            .finish()
    }
}

impl Worker {
    /// Spawn a worker with the default configuration.
    pub fn new() -> Result<Self> {
        Self::with_config(WorkerConfig::default())
    }

    /// Spawn a worker with `config`.
    pub fn with_config(config: WorkerConfig) -> Result<Self> {
        let capacity = config.queue_capacity.max(1);
        let (sender, receiver) = bounded(capacity);
        let state = Arc::new(WorkerState {
            running: AtomicBool::new(true),
            pending: AtomicUsize::new(0),
        });

        let mut builder = thread::Builder::new().name(config.name.clone());
        if let Some(size) = config.stack_size {
            builder = builder.stack_size(size);
        }

        let thread_state = state.clone();
        let handle = builder
            .spawn(move || {
                worker_loop(receiver, &thread_state);
                thread_state.running.store(false, Ordering::Release);
            })
            .map_err(|e| CoreError::Spawn(e.to_string()))?;

        tracing::debug!(target: targets::WORKER, name = %config.name, capacity, "worker started");

        Ok(Self {
            name: config.name,
            capacity,
            sender,
            handle: Mutex::new(Some(handle)),
            state,
        })
    }

    /// The worker thread's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the worker still accepts tasks.
    pub fn is_running(&self) -> bool {
        self.state.running.load(Ordering::Acquire)
    }

    /// Tasks queued or executing.
    pub fn pending_tasks(&self) -> usize {
        self.state.pending.load(Ordering::Acquire)
    }

    /// Queue a task on the worker thread.
    pub fn send<F>(&self, task: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        if !self.is_running() {
            return Err(CoreError::WorkerStopped(self.name.clone()));
        }
        self.state.pending.fetch_add(1, Ordering::AcqRel);
        match self.sender.try_send(Message::Run(Box::new(task))) {
            Ok(()) => Ok(()),
            Err(err) => {
                self.state.pending.fetch_sub(1, Ordering::AcqRel);
                Err(match err {
                    TrySendError::Full(_) => CoreError::QueueFull {
                        name: self.name.clone(),
                        capacity: self.capacity,
                    },
                    TrySendError::Disconnected(_) => CoreError::WorkerStopped(self.name.clone()),
                })
            }
        }
    }

    /// Run `task` on the worker, then run `on_done` with its result on the UI thread.
    ///
    /// If the UI dispatcher is closed by the time the task finishes, the result is
    /// dropped and `on_done` never runs.
    pub fn send_to_ui<T, C, F, D>(&self, task: F, ui: &UiHandle<C>, on_done: D) -> Result<()>
    where
        T: Send + 'static,
        C: 'static,
        F: FnOnce() -> T + Send + 'static,
        D: FnOnce(&mut C, T) + Send + 'static,
    {
        let ui = ui.clone();
        self.send(move || {
            let result = task();
            if ui.post(move |ctx: &mut C| on_done(ctx, result)).is_err() {
                tracing::trace!(target: targets::WORKER, "UI target gone, dropping completion");
            }
        })
    }

    /// Stop accepting tasks. Already queued tasks still run.
    pub fn stop(&self) {
        if self.state.running.swap(false, Ordering::AcqRel) {
            let _ = self.sender.try_send(Message::Shutdown);
            tracing::debug!(target: targets::WORKER, name = %self.name, "worker stopping");
        }
    }

    /// Wait for the worker thread to exit. Returns `false` if already joined or
    /// the thread panicked.
    pub fn join(&self) -> bool {
        match self.handle.lock().take() {
            Some(handle) => handle.join().is_ok(),
            None => false,
        }
    }

    /// [`stop`](Self::stop) followed by [`join`](Self::join).
    pub fn stop_and_join(&self) -> bool {
        self.stop();
        self.join()
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn worker_loop(receiver: Receiver<Message>, state: &WorkerState) {
    loop {
        match receiver.recv_timeout(Duration::from_millis(100)) {
            Ok(Message::Run(task)) => {
                task();
                state.pending.fetch_sub(1, Ordering::AcqRel);
            }
            Ok(Message::Shutdown) => {
                while let Ok(message) = receiver.try_recv() {
                    if let Message::Run(task) = message {
                        task();
                        state.pending.fetch_sub(1, Ordering::AcqRel);
                    }
                }
                break;
            }
            Err(RecvTimeoutError::Timeout) => {
                if !state.running.load(Ordering::Acquire) && state.pending.load(Ordering::Acquire) == 0
                {
                    break;
                }
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
}

static_assertions::assert_impl_all!(Worker: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::UiDispatcher;

    #[test]
    fn test_worker_creation() {
        let worker = Worker::new().unwrap();
        assert!(worker.is_running());
        assert_eq!(worker.pending_tasks(), 0);
        assert!(worker.stop_and_join());
        assert!(!worker.is_running());
    }

    #[test]
    fn test_builder_name() {
        let worker = WorkerBuilder::new()
            .name("test-worker")
            .queue_capacity(8)
            .build()
            .unwrap();
        assert_eq!(worker.name(), "test-worker");
        worker.stop_and_join();
    }

    #[test]
    fn test_tasks_run_sequentially() {
        let worker = Worker::new().unwrap();
        let order = Arc::new(Mutex::new(Vec::new()));
        for i in 0..5 {
            let order = order.clone();
            worker.send(move || order.lock().push(i)).unwrap();
        }
        worker.stop_and_join();
        assert_eq!(*order.lock(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_send_after_stop() {
        let worker = Worker::new().unwrap();
        worker.stop_and_join();
        assert!(matches!(
            worker.send(|| {}),
            Err(CoreError::WorkerStopped(_))
        ));
    }

    #[test]
    fn test_send_to_ui_marshals_completion() {
        let dispatcher = UiDispatcher::<Vec<String>>::new();
        let worker = Worker::new().unwrap();
        let ui_thread = std::thread::current().id();
        let worker_thread = Arc::new(Mutex::new(None));

        let seen = worker_thread.clone();
        worker
            .send_to_ui(
                move || {
                    *seen.lock() = Some(std::thread::current().id());
                    "page".to_string()
                },
                &dispatcher.handle(),
                move |log: &mut Vec<String>, page| {
                    assert_eq!(std::thread::current().id(), ui_thread);
                    log.push(page);
                },
            )
            .unwrap();
        worker.stop_and_join();

        assert_ne!(*worker_thread.lock(), Some(ui_thread));
        let mut log = Vec::new();
        assert_eq!(dispatcher.drain(&mut log), 1);
        assert_eq!(log, vec!["page".to_string()]);
    }

    #[test]
    fn test_completion_dropped_after_close() {
        let dispatcher = UiDispatcher::<u32>::new();
        dispatcher.close();
        let worker = Worker::new().unwrap();
        worker
            .send_to_ui(|| 5u32, &dispatcher.handle(), |n: &mut u32, v| *n = v)
            .unwrap();
        worker.stop_and_join();

        let mut n = 0;
        assert_eq!(dispatcher.drain(&mut n), 0);
        assert_eq!(n, 0);
    }
}
