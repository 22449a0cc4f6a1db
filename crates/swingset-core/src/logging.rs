//! Tracing targets and spans.
//!
//! SwingSet logs through `tracing` and leaves subscriber setup to the host:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("swingset::navigator=debug,swingset=warn")
//!     .init();
//! ```
//!
//! Levels: `warn` for lookup misses and duplicate mappings, `error` for cursor
//! and conversion failures, `debug` for navigator and store transitions,
//! `trace` for signal and task plumbing.

/// Names of spans opened around multi-step operations.
pub mod span_names {
    /// A navigator transition (commit, state refresh).
    pub const NAVIGATOR: &str = "swingset::navigator";
    /// A store remodel session, from `remodel()` until the session drops.
    pub const REMODEL: &str = "swingset::remodel";
}

/// One target per subsystem, for `RUST_LOG`-style filtering.
pub mod targets {
    pub const SIGNAL: &str = "swingset::signal";
    pub const TASK: &str = "swingset::task";
    pub const STORE: &str = "swingset::store";
    pub const SELECTION: &str = "swingset::selection";
    pub const FIELD: &str = "swingset::field";
    pub const NAVIGATOR: &str = "swingset::navigator";
    pub const CURSOR: &str = "swingset::cursor";
    pub const CONFIG: &str = "swingset::config";
    /// Notices routed to the log by `LogNotifier`.
    pub const NOTICE: &str = "swingset::notice";
    /// Timing spans from [`PerfSpan`](super::PerfSpan).
    pub const PERF: &str = "swingset::perf";
}

/// Keeps a debug span open for the duration of a cursor round trip.
///
/// ```
/// use swingset_core::PerfSpan;
///
/// let _timing = PerfSpan::new("populate_from_cursor");
/// // ... read every row ...
/// ```
#[derive(Debug)]
#[must_use = "the span closes as soon as the guard is dropped"]
pub struct PerfSpan {
    _entered: tracing::span::EnteredSpan,
}

impl PerfSpan {
    pub fn new(operation: &'static str) -> Self {
        let span = tracing::debug_span!(target: targets::PERF, "perf", operation);
        Self {
            _entered: span.entered(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perf_span_enters_under_a_subscriber() {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_test_writer()
            .finish();
        tracing::subscriber::with_default(subscriber, || {
            let _timing = PerfSpan::new("commit");
            tracing::debug!(target: targets::NAVIGATOR, row = 3, "committed");
            assert!(!tracing::Span::current().is_disabled());
        });
    }

    #[test]
    fn every_target_shares_the_prefix() {
        for target in [
            targets::SIGNAL,
            targets::TASK,
            targets::STORE,
            targets::SELECTION,
            targets::FIELD,
            targets::NAVIGATOR,
            targets::CURSOR,
            targets::CONFIG,
            targets::NOTICE,
            targets::PERF,
        ] {
            assert!(target.starts_with("swingset::"), "{target}");
        }
    }
}
