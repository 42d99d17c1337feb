//! Per-call state machine.
//!
//! Every tool call of a turn is tracked by a [`ToolCallDescriptor`] whose
//! [`CallStatus`] only moves forward:
//!
//! ```text
//! Pending ──> Running ──> Success
//!    │               └──> Error
//!    └──────────────────> Error   (rejected during validation)
//! ```
//!
//! Terminal states are final: transitions out of them are no-ops.

use crate::tool::entities::{ToolArguments, ToolCall};
use crate::tool::value_objects::CallToolResult;
use serde::{Deserialize, Serialize};

/// Status of one call, carrying only the fields valid for that state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CallStatus {
    Pending,
    Running {
        started_at: u64,
    },
    Success {
        started_at: u64,
        completed_at: u64,
    },
    Error {
        /// `None` when the call never started
        started_at: Option<u64>,
        failed_at: u64,
        message: String,
    },
}

impl CallStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success { .. } | Self::Error { .. })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running { .. } => "running",
            Self::Success { .. } => "success",
            Self::Error { .. } => "error",
        }
    }

    /// Duration in milliseconds (only for calls that ran to a terminal state).
    pub fn duration_ms(&self) -> Option<u64> {
        match self {
            Self::Success {
                started_at,
                completed_at,
            } => Some(completed_at.saturating_sub(*started_at)),
            Self::Error {
                started_at: Some(started_at),
                failed_at,
                ..
            } => Some(failed_at.saturating_sub(*started_at)),
            _ => None,
        }
    }
}

/// One requested tool call, as tracked by the dispatcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallDescriptor {
    /// Position of the call in the turn's request order
    pub position: usize,
    pub correlation_id: String,
    pub tool_name: String,
    pub arguments: ToolArguments,
    pub status: CallStatus,
}

impl ToolCallDescriptor {
    pub fn new(position: usize, call: ToolCall) -> Self {
        Self {
            position,
            correlation_id: call.correlation_id,
            tool_name: call.tool_name,
            arguments: call.arguments,
            status: CallStatus::Pending,
        }
    }

    /// Transition from Pending to Running. No-op otherwise.
    pub fn mark_running(&mut self) {
        if matches!(self.status, CallStatus::Pending) {
            self.status = CallStatus::Running {
                started_at: current_timestamp(),
            };
        }
    }

    /// Reject a call that never started. No-op unless Pending.
    pub fn mark_rejected(&mut self, message: impl Into<String>) {
        if matches!(self.status, CallStatus::Pending) {
            self.status = CallStatus::Error {
                started_at: None,
                failed_at: current_timestamp(),
                message: message.into(),
            };
        }
    }

    /// Record the outcome of a running call. No-op unless Running.
    pub fn complete(&mut self, result: &CallToolResult) {
        let CallStatus::Running { started_at } = self.status else {
            return;
        };
        let now = current_timestamp();
        self.status = if result.is_error() {
            CallStatus::Error {
                started_at: Some(started_at),
                failed_at: now,
                message: truncate_preview(&result.text_content(), 200),
            }
        } else {
            CallStatus::Success {
                started_at,
                completed_at: now,
            }
        };
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Error message, for calls that ended in error.
    pub fn error_message(&self) -> Option<&str> {
        match &self.status {
            CallStatus::Error { message, .. } => Some(message),
            _ => None,
        }
    }
}

fn truncate_preview(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}

/// Current timestamp in milliseconds.
fn current_timestamp() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
