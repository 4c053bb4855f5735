//! Error types for the Tableau plumbing layer.

use thiserror::Error;

/// Errors raised by the UI-thread plumbing (dispatch queue and workers).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// The worker has been stopped and no longer accepts tasks.
    #[error("worker `{0}` has been stopped")]
    WorkerStopped(String),
    /// The worker task queue is at capacity.
    #[error("worker `{name}` queue is full ({capacity} pending tasks)")]
    QueueFull {
        /// Name of the worker thread.
        name: String,
        /// Configured queue capacity.
        capacity: usize,
    },
    /// The UI dispatcher has been closed (its owning session was torn down).
    #[error("UI dispatcher has been closed")]
    DispatcherClosed,
    /// Failed to spawn the worker thread.
    #[error("failed to spawn worker thread: {0}")]
    Spawn(String),
}

/// A specialized Result type for plumbing operations.
pub type Result<T> = std::result::Result<T, CoreError>;
