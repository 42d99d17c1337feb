//! Dispatch domain: call descriptors and batch ordering.

pub mod batch;
pub mod descriptor;

pub use batch::{
    RequestedCall, ToolCallOutcome, ValidatedBatch, finalize, unknown_tool_result, validate,
};
pub use descriptor::{CallStatus, ToolCallDescriptor};
