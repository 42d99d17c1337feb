//! Port for structured dispatch event logging.
//!
//! Defines the [`DispatchLogger`] trait for recording what happened to every
//! call of a batch (spawns, completions, cleanup failures) in a
//! machine-readable log.
//!
//! This is separate from `tracing`-based operation logs: tracing handles
//! human-readable diagnostic messages, while this port captures one record
//! per event (JSONL in the infrastructure adapter).

use serde_json::Value;

/// A structured dispatch event.
pub struct DispatchEvent {
    /// Event type identifier (e.g., "batch_started", "instance_completed").
    pub event_type: &'static str,
    /// JSON payload with event-specific data.
    pub payload: Value,
}

impl DispatchEvent {
    pub fn new(event_type: &'static str, payload: Value) -> Self {
        Self {
            event_type,
            payload,
        }
    }
}

/// Port for logging dispatch events.
///
/// The `log` method is synchronous and non-fallible so that logging never
/// disturbs a running batch. Failures are ignored by implementations.
pub trait DispatchLogger: Send + Sync {
    /// Record a dispatch event.
    fn log(&self, event: DispatchEvent);
}

/// No-op implementation for tests and when event logging is disabled.
pub struct NoDispatchLogger;

impl DispatchLogger for NoDispatchLogger {
    fn log(&self, _event: DispatchEvent) {}
}
