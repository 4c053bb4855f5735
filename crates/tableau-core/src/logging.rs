//! Logging facilities for Tableau.
//!
//! Tableau is instrumented with the `tracing` crate. Nothing is printed unless the
//! application installs a subscriber:
//!
//! ```ignore
//! fn main() {
//!     tracing_subscriber::fmt()
//!         .with_env_filter("tableau=debug,tableau_core=info")
//!         .init();
//! }
//! ```
//!
//! Every subsystem logs under its own target (see [`targets`]) so a single binder
//! concern can be turned up without flooding the output. Degraded mappings (a member
//! with no registered view, a missing caption) are reported at `debug`; navigation
//! edge cases that are absorbed as no-ops are reported at `trace`.

/// Span names used throughout Tableau.
pub mod span_names {
    /// A full parse pass over a view model.
    pub const PARSE: &str = "tableau::parse";
    /// Row selection handling.
    pub const SELECT: &str = "tableau::select";
    /// Draining deferred post-selection actions.
    pub const POST_ACTIONS: &str = "tableau::post_actions";
}

/// Target names for log filtering.
pub mod targets {
    /// Plumbing crate target.
    pub const CORE: &str = "tableau_core";
    /// Signal/slot target.
    pub const SIGNAL: &str = "tableau_core::signal";
    /// UI dispatcher target.
    pub const DISPATCH: &str = "tableau_core::dispatch";
    /// Background worker target.
    pub const WORKER: &str = "tableau_core::worker";
    /// Member parser target.
    pub const PARSER: &str = "tableau::parser";
    /// List source target.
    pub const LIST: &str = "tableau::list";
    /// View registry target.
    pub const REGISTRY: &str = "tableau::registry";
    /// Command adapter target.
    pub const COMMAND: &str = "tableau::command";
    /// Presentation session target.
    pub const SESSION: &str = "tableau::session";
    /// Source arena target.
    pub const SOURCE: &str = "tableau::source";
    /// Performance span target.
    pub const PERF: &str = "tableau::perf";
}

/// A guard that keeps a tracing span entered until dropped.
///
/// Used to time whole operations such as a parse pass.
#[derive(Debug)]
pub struct PerfSpan {
    #[allow(dead_code)]
    span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Create and enter a performance span for `name`.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::info_span!(target: targets::PERF, "perf", operation = name);
        Self {
            span: span.entered(),
        }
    }
}

/// Trace-level event under the core target.
#[macro_export]
macro_rules! tableau_trace {
    ($($arg:tt)*) => {
        tracing::trace!(target: $crate::logging::targets::CORE, $($arg)*)
    };
}

/// Debug-level event under the core target.
#[macro_export]
macro_rules! tableau_debug {
    ($($arg:tt)*) => {
        tracing::debug!(target: $crate::logging::targets::CORE, $($arg)*)
    };
}

/// Warn-level event under the core target.
#[macro_export]
macro_rules! tableau_warn {
    ($($arg:tt)*) => {
        tracing::warn!(target: $crate::logging::targets::CORE, $($arg)*)
    };
}
