//! Agent domain module
//!
//! Contains the static side of agents: identity and tool naming, the
//! configuration every spawned instance copies, history entries, the
//! structured response of a `generate` call and argument mapping.

pub mod arguments;
pub mod config;
pub mod history;
pub mod identity;
pub mod response;
pub mod validation;

pub use arguments::{canonical_json, map_arguments};
pub use config::{AgentConfig, DisplayConfig, HistoryPolicy};
pub use history::{Message, Role};
pub use identity::{
    AGENT_TOOL_PREFIX, AgentName, InstanceIndex, agent_tool_schema, is_agent_tool_name,
    template_name_of,
};
pub use response::{AgentResponse, ERROR_CHANNEL};
