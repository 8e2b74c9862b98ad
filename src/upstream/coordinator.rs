//! Seam for adapting fetch parallelism to observed upstream behavior.
//!
//! The fetcher reports retry-eligible successes and failures through this
//! trait so an outer policy (e.g. additive-increase / multiplicative-decrease
//! against 429/503 rates) can adjust its fan-out. The default wiring uses a
//! fixed fan-out cap with [`NullCoordinator`], which adapts nothing.

pub trait ConcurrencyCoordinator: Send + Sync {
    fn report_success(&self);
    fn report_failure(&self);
}

/// Coordinator that ignores every signal.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullCoordinator;

impl ConcurrencyCoordinator for NullCoordinator {
    fn report_success(&self) {}
    fn report_failure(&self) {}
}
