//! UI-thread plumbing for Tableau.
//!
//! This crate holds the pieces of the binder that are not about view models at all:
//!
//! - **Signals**: [`Signal`] notifications emitted by sessions
//! - **Thread affinity**: [`ThreadAffinity`] checks that session state stays on the UI thread
//! - **Dispatch**: [`UiDispatcher`]/[`UiHandle`] for marshaling completions back to the UI thread
//! - **Workers**: a dedicated [`Worker`] thread for long-running commands such as "load more"
//! - **Logging**: tracing targets, [`PerfSpan`] and the `tableau_*!` macros
//!
//! # Example
//!
//! ```
//! use tableau_core::{UiDispatcher, Worker};
//!
//! struct Rows(usize);
//!
//! let dispatcher = UiDispatcher::<Rows>::new();
//! let worker = Worker::new().unwrap();
//! worker
//!     .send_to_ui(|| 25, &dispatcher.handle(), |rows: &mut Rows, n| rows.0 += n)
//!     .unwrap();
//! worker.stop_and_join();
//!
//! let mut rows = Rows(0);
//! dispatcher.drain(&mut rows);
//! assert_eq!(rows.0, 25);
//! ```

pub mod dispatch;
mod error;
pub mod logging;
pub mod signal;
pub mod thread_check;
pub mod worker;

pub use dispatch::{UiDispatcher, UiHandle, UiJob};
pub use error::{CoreError, Result};
pub use logging::PerfSpan;
pub use signal::{ConnectionId, Signal};
pub use thread_check::ThreadAffinity;
pub use worker::{Worker, WorkerBuilder, WorkerConfig};
