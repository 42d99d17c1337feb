//! Where a tool comes from.
//!
//! Hooks receive the source of every call they wrap so they can branch on
//! it (e.g. only audit `runtime` tools) without knowing call-site details.

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Origin of a tool exposed to an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolSource {
    /// A tool served by an external tool server through the connection manager
    Mcp,
    /// A local in-process callable
    Function,
    /// Another agent template exposed as a tool
    Agent,
    /// A built-in capability such as shell or filesystem access
    Runtime,
}

impl ToolSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolSource::Mcp => "mcp",
            ToolSource::Function => "function",
            ToolSource::Agent => "agent",
            ToolSource::Runtime => "runtime",
        }
    }
}

impl std::fmt::Display for ToolSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolSource {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mcp" => Ok(ToolSource::Mcp),
            "function" => Ok(ToolSource::Function),
            "agent" => Ok(ToolSource::Agent),
            "runtime" => Ok(ToolSource::Runtime),
            other => Err(DomainError::UnknownToolSource(other.to_string())),
        }
    }
}
