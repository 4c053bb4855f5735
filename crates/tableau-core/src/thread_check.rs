//! UI-thread affinity checks.
//!
//! Every source and cell owned by a presentation session is mutated on the thread
//! that created the session. Background work (for example a "load more" command)
//! runs on a [`Worker`](crate::worker::Worker) and must come back through a
//! [`UiDispatcher`](crate::dispatch::UiDispatcher) before it touches that state.
//! [`ThreadAffinity`] makes violations loud in debug builds:
//!
//! ```
//! use tableau_core::thread_check::ThreadAffinity;
//!
//! struct Screen {
//!     affinity: ThreadAffinity,
//!     rows: usize,
//! }
//!
//! impl Screen {
//!     fn reload(&mut self) {
//!         self.affinity.debug_assert_same_thread();
//!         self.rows += 1;
//!     }
//! }
//!
//! let mut screen = Screen { affinity: ThreadAffinity::current(), rows: 0 };
//! screen.reload();
//! ```

use std::thread::ThreadId;

/// Records the thread an object belongs to and verifies later accesses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadAffinity {
    thread_id: ThreadId,
}

impl Default for ThreadAffinity {
    fn default() -> Self {
        Self::current()
    }
}

impl ThreadAffinity {
    /// Bind to the calling thread.
    #[inline]
    pub fn current() -> Self {
        Self {
            thread_id: std::thread::current().id(),
        }
    }

    /// The thread this affinity is bound to.
    #[inline]
    pub fn thread_id(&self) -> ThreadId {
        self.thread_id
    }

    /// Whether the calling thread is the bound thread.
    #[inline]
    pub fn is_same_thread(&self) -> bool {
        std::thread::current().id() == self.thread_id
    }

    /// Panic unless called on the bound thread. Active in every build.
    #[inline]
    pub fn assert_same_thread(&self) {
        self.assert_same_thread_with_msg("UI state accessed off the UI thread")
    }

    /// Panic with `msg` unless called on the bound thread.
    pub fn assert_same_thread_with_msg(&self, msg: &str) {
        if !self.is_same_thread() {
            self.panic_wrong_thread(msg);
        }
    }

    /// Debug-only variant of [`assert_same_thread`](Self::assert_same_thread).
    #[inline]
    pub fn debug_assert_same_thread(&self) {
        #[cfg(debug_assertions)]
        self.assert_same_thread();
    }

    #[cold]
    #[inline(never)]
    fn panic_wrong_thread(&self, msg: &str) -> ! {
        let current = std::thread::current();
        let current_name = current.name().unwrap_or("<unnamed>");
        crate::tableau_warn!(
            ui_thread = ?self.thread_id,
            current_thread = current_name,
            "{msg}"
        );
        panic!(
            "{msg}\n\
             UI thread: {:?}\n\
             current thread: \"{current_name}\" ({:?})\n\
             Post the work through a UiDispatcher handle instead of touching session state directly.",
            self.thread_id,
            current.id(),
        )
    }
}
