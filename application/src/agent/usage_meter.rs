//! Thread-safe usage counter shared between an instance, its backend and
//! its tool aggregator.

use relay_domain::Usage;
use std::sync::Mutex;

/// Accumulates [`Usage`] from concurrent writers.
///
/// Lock poisoning is tolerated: a panicking writer cannot have left a
/// `Usage` half-updated, because every update is a single `merge`.
#[derive(Debug, Default)]
pub struct UsageMeter {
    inner: Mutex<Usage>,
}

impl UsageMeter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add counters to the meter.
    pub fn record(&self, usage: &Usage) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.merge(usage);
    }

    /// Count one tool invocation.
    pub fn record_tool_call(&self) {
        self.record(&Usage::default().with_tool_calls(1));
    }

    /// Current totals.
    pub fn snapshot(&self) -> Usage {
        *self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}
