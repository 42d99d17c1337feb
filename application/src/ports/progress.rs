//! Progress notification port
//!
//! Defines the interface for reporting progress while a batch of agent
//! calls is dispatched.

use relay_domain::{ToolCallOutcome, Usage};

/// Callback for progress updates during dispatch
///
/// Implementations live in the outer layers and can display progress in
/// whatever way they like. Callbacks arrive from concurrently running
/// instances, in completion order.
pub trait DispatchProgressNotifier: Send + Sync {
    /// Called once validation has split the batch
    fn on_batch_start(&self, total: usize, valid: usize);

    /// Called when an instance has been spawned for a call
    fn on_instance_start(&self, _label: &str, _correlation_id: &str) {}

    /// Called after an instance has produced its result and shut down
    fn on_instance_complete(&self, label: &str, correlation_id: &str, success: bool, usage: &Usage);

    /// Called with the ordered results of the batch
    fn on_batch_complete(&self, _outcomes: &[ToolCallOutcome]) {}
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoDispatchProgress;

impl DispatchProgressNotifier for NoDispatchProgress {
    fn on_batch_start(&self, _total: usize, _valid: usize) {}
    fn on_instance_complete(&self, _label: &str, _correlation_id: &str, _success: bool, _usage: &Usage) {}
}
