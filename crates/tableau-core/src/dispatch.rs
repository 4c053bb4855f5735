//! Marshaling work back onto the UI thread.
//!
//! A [`UiDispatcher`] is owned by whatever lives on the UI thread (a presentation
//! session). Background code gets a cloneable [`UiHandle`] and posts closures that
//! receive `&mut C` once the UI thread drains the queue. The queue is a channel,
//! not a lock around UI state: posting never blocks and never waits for the UI
//! thread.
//!
//! # Example
//!
//! ```
//! use tableau_core::dispatch::UiDispatcher;
//!
//! struct Screen { loaded: usize }
//!
//! let dispatcher = UiDispatcher::<Screen>::new();
//! let handle = dispatcher.handle();
//!
//! std::thread::spawn(move || {
//!     handle.post(|screen: &mut Screen| screen.loaded += 20).unwrap();
//! })
//! .join()
//! .unwrap();
//!
//! let mut screen = Screen { loaded: 0 };
//! assert_eq!(dispatcher.drain(&mut screen), 1);
//! assert_eq!(screen.loaded, 20);
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam_channel::{Receiver, Sender, unbounded};

use crate::error::{CoreError, Result};
use crate::logging::targets;
use crate::thread_check::ThreadAffinity;

/// A job executed on the UI thread against the dispatcher's context.
pub type UiJob<C> = Box<dyn FnOnce(&mut C) + Send + 'static>;

/// Queue of jobs waiting to run on the UI thread.
pub struct UiDispatcher<C> {
    sender: Sender<UiJob<C>>,
    receiver: Receiver<UiJob<C>>,
    closed: Arc<AtomicBool>,
    affinity: ThreadAffinity,
}

/// Cloneable, `Send` handle used by other threads to post UI jobs.
pub struct UiHandle<C> {
    sender: Sender<UiJob<C>>,
    closed: Arc<AtomicBool>,
}

impl<C> Clone for UiHandle<C> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            closed: self.closed.clone(),
        }
    }
}

impl<C> std::fmt::Debug for UiHandle<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UiHandle")
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl<C> UiHandle<C> {
    /// Queue `job` for the UI thread.
    ///
    /// Fails with [`CoreError::DispatcherClosed`] once the owning dispatcher has
    /// been closed; the job is dropped without running.
    pub fn post<F>(&self, job: F) -> Result<()>
    where
        F: FnOnce(&mut C) + Send + 'static,
    {
        if self.is_closed() {
            tracing::trace!(target: targets::DISPATCH, "dispatcher closed, dropping job");
            return Err(CoreError::DispatcherClosed);
        }
        self.sender
            .send(Box::new(job))
            .map_err(|_| CoreError::DispatcherClosed)
    }

    /// Whether the owning dispatcher has been closed.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl<C> Default for UiDispatcher<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> UiDispatcher<C> {
    /// Create a dispatcher bound to the calling (UI) thread.
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        Self {
            sender,
            receiver,
            closed: Arc::new(AtomicBool::new(false)),
            affinity: ThreadAffinity::current(),
        }
    }

    /// A handle for posting jobs from any thread.
    pub fn handle(&self) -> UiHandle<C> {
        UiHandle {
            sender: self.sender.clone(),
            closed: self.closed.clone(),
        }
    }

    /// Number of jobs waiting to run.
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }

    /// Remove every queued job without running it.
    ///
    /// Used when the context that owns the dispatcher is also the job target, so
    /// the caller can run the jobs itself without a double borrow.
    pub fn take_pending(&self) -> Vec<UiJob<C>> {
        self.affinity.debug_assert_same_thread();
        self.receiver.try_iter().collect()
    }

    /// Run every queued job against `ctx`. Returns how many ran.
    pub fn drain(&self, ctx: &mut C) -> usize {
        let jobs = self.take_pending();
        let count = jobs.len();
        for job in jobs {
            job(ctx);
        }
        if count > 0 {
            tracing::trace!(target: targets::DISPATCH, count, "drained UI jobs");
        }
        count
    }

    /// Close the dispatcher: queued jobs are discarded and later posts fail.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        let dropped = self.receiver.try_iter().count();
        tracing::debug!(target: targets::DISPATCH, dropped, "dispatcher closed");
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

static_assertions::assert_impl_all!(UiHandle<Vec<u8>>: Send, Sync, Clone);
