//! Batch partitioning and order-preserving reassembly.
//!
//! A turn's tool calls go through two pure steps around the concurrent part:
//!
//! 1. [`validate`] splits the batch into descriptors worth running and
//!    immediate `UnknownTool` results, without spawning anything.
//! 2. [`finalize`] merges every produced outcome back into request order,
//!    one outcome per requested call.

use super::descriptor::ToolCallDescriptor;
use crate::tool::entities::ToolCall;
use crate::tool::value_objects::{CallToolResult, ErrorKind};
use serde::{Deserialize, Serialize};

/// Result of one call, tagged with where it belongs in the turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallOutcome {
    #[serde(skip)]
    pub position: usize,
    #[serde(rename = "id")]
    pub correlation_id: String,
    #[serde(rename = "name")]
    pub tool_name: String,
    pub result: CallToolResult,
}

impl ToolCallOutcome {
    pub fn for_descriptor(descriptor: &ToolCallDescriptor, result: CallToolResult) -> Self {
        Self {
            position: descriptor.position,
            correlation_id: descriptor.correlation_id.clone(),
            tool_name: descriptor.tool_name.clone(),
            result,
        }
    }
}

/// Identity of a requested call, indexed by its position in the turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestedCall {
    pub correlation_id: String,
    pub tool_name: String,
}

impl From<&ToolCall> for RequestedCall {
    fn from(call: &ToolCall) -> Self {
        Self {
            correlation_id: call.correlation_id.clone(),
            tool_name: call.tool_name.clone(),
        }
    }
}

/// Output of [`validate`].
#[derive(Debug, Default)]
pub struct ValidatedBatch {
    /// Calls naming an exposed tool, in request order, all `Pending`
    pub valid: Vec<ToolCallDescriptor>,
    /// Calls answered immediately with an `UnknownTool` error
    pub rejected: Vec<ToolCallOutcome>,
    /// Every call of the original batch, in request order
    pub requested: Vec<RequestedCall>,
}

impl ValidatedBatch {
    /// Number of calls in the original batch
    pub fn total(&self) -> usize {
        self.requested.len()
    }
}

/// Error result for a name that is not currently exposed.
pub fn unknown_tool_result(tool_name: &str) -> CallToolResult {
    CallToolResult::failure(
        ErrorKind::UnknownTool,
        format!("Unknown agent-tool: {}", tool_name),
    )
}

/// Partition a batch into runnable descriptors and immediate errors.
///
/// `is_exposed` answers whether a requested name is in the current tool
/// snapshot.
pub fn validate<F>(calls: Vec<ToolCall>, is_exposed: F) -> ValidatedBatch
where
    F: Fn(&str) -> bool,
{
    let mut batch = ValidatedBatch {
        requested: calls.iter().map(RequestedCall::from).collect(),
        ..Default::default()
    };

    for (position, call) in calls.into_iter().enumerate() {
        let mut descriptor = ToolCallDescriptor::new(position, call);
        if is_exposed(&descriptor.tool_name) {
            batch.valid.push(descriptor);
        } else {
            let result = unknown_tool_result(&descriptor.tool_name);
            descriptor.mark_rejected(result.text_content());
            batch
                .rejected
                .push(ToolCallOutcome::for_descriptor(&descriptor, result));
        }
    }

    batch
}

/// Reassemble outcomes in request order.
///
/// One outcome is returned per entry of `requested`. A position with no
/// outcome (which only happens if a producer lost one) gets an
/// `InvocationFailure` result carrying that call's id and name; if a
/// position was produced twice, the first outcome wins.
pub fn finalize(
    requested: &[RequestedCall],
    outcomes: impl IntoIterator<Item = ToolCallOutcome>,
) -> Vec<ToolCallOutcome> {
    let mut slots: Vec<Option<ToolCallOutcome>> = requested.iter().map(|_| None).collect();

    for outcome in outcomes {
        if let Some(slot) = slots.get_mut(outcome.position)
            && slot.is_none()
        {
            *slot = Some(outcome);
        }
    }

    slots
        .into_iter()
        .zip(requested)
        .enumerate()
        .map(|(position, (slot, call))| {
            slot.unwrap_or_else(|| ToolCallOutcome {
                position,
                correlation_id: call.correlation_id.clone(),
                tool_name: call.tool_name.clone(),
                result: CallToolResult::failure(
                    ErrorKind::InvocationFailure,
                    "Error: no result was produced for this call",
                ),
            })
        })
        .collect()
}
