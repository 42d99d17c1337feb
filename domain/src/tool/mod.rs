//! Tool domain module
//!
//! This module defines what a tool *is* for the relay: a named capability
//! described by a [`ToolDefinition`], requested through a [`ToolCall`] and
//! answered with a [`CallToolResult`].
//!
//! ```text
//! ┌──────────────┐    ┌──────────────┐    ┌────────────────┐
//! │ ToolSpec     │───▶│ ToolCall     │───▶│ CallToolResult │
//! │ (exposed)    │    │ (id, name,   │    │ (is_error,     │
//! └──────┬───────┘    │  arguments)  │    │  content)      │
//!        │            └──────────────┘    └────────────────┘
//!        ├─ aliases: "Summarizer" → "agent__Summarizer"
//!        └─ tools:   "agent__Summarizer" → ToolDefinition
//! ```
//!
//! # Tool Sources
//!
//! Every tool has a [`ToolSource`]: `mcp` (external tool server), `function`
//! (local callable), `agent` (another agent exposed as a tool) or `runtime`
//! (built-in capability). Hooks branch on it.
//!
//! # Architecture
//!
//! - **Domain** (this module): pure definitions, no I/O
//! - **Application**: `ToolAggregator`, hook chain and dispatcher
//! - **Infrastructure**: concrete providers (functions, shell, filesystem)

pub mod entities;
pub mod provider;
pub mod source;
pub mod value_objects;

pub use entities::{ToolArguments, ToolCall, ToolDefinition, ToolSpec};
pub use provider::{ProviderError, ToolProvider};
pub use source::ToolSource;
pub use value_objects::{CallToolResult, ContentBlock, ErrorKind};
