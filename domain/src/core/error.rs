//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Agent name must not be empty")]
    EmptyAgentName,

    #[error("Invalid agent name '{0}': must not contain '[' or ']'")]
    InvalidAgentName(String),

    #[error("Invalid instance index {0}: indices are 1-based")]
    InvalidInstanceIndex(usize),

    #[error("Unknown history policy: {0}")]
    UnknownHistoryPolicy(String),

    #[error("Unknown tool source: {0}")]
    UnknownToolSource(String),
}
