//! Domain layer for agent-relay
//!
//! This crate contains the core types of the agents-as-tools dispatcher.
//! It has no dependencies on infrastructure or presentation concerns and
//! performs no I/O.
//!
//! # Core Concepts
//!
//! ## Templates and Clones
//!
//! An agent registered under a stable name is a **Template**. Every tool call
//! that targets it runs on a fresh, single-use **Clone** labelled
//! `Name[i]`, where `i` is a 1-based index unique per template within a turn
//! (see [`agent::identity`]).
//!
//! ## Call results
//!
//! Every call, successful or not, ends as a [`CallToolResult`]. Failures are
//! classified by [`ErrorKind`] and resolved per call; they never abort the
//! rest of the batch.
//!
//! ## Ordering
//!
//! [`dispatch::validate`] and [`dispatch::finalize`] bracket the concurrent
//! part of a turn so that results always come back in request order.

pub mod agent;
pub mod core;
pub mod dispatch;
pub mod tool;
pub mod usage;

// Re-export commonly used types
pub use agent::{
    AgentConfig, AgentName, AgentResponse, DisplayConfig, HistoryPolicy, InstanceIndex, Message,
    Role,
    validation::{ConfigIssue, ConfigIssueCode, Severity},
};
pub use core::error::DomainError;
pub use dispatch::{
    CallStatus, RequestedCall, ToolCallDescriptor, ToolCallOutcome, ValidatedBatch,
};
pub use tool::{
    CallToolResult, ContentBlock, ErrorKind, ProviderError, ToolArguments, ToolCall,
    ToolDefinition, ToolProvider, ToolSource, ToolSpec,
};
pub use usage::Usage;
