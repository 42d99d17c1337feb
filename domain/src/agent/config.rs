//! Static agent configuration.
//!
//! [`AgentConfig`] is the part of a template that every spawned instance
//! deep-copies: instruction, model, tool allow-list, display settings and
//! concurrency limits. Transient state (history, usage) is never part of it.

use super::identity::AgentName;
use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// How a spawned instance's history is initialised.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryPolicy {
    /// Start with an empty history (default)
    #[default]
    Fresh,
    /// Start with a copy of the template's canonical history
    Fork,
}

impl HistoryPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryPolicy::Fresh => "fresh",
            HistoryPolicy::Fork => "fork",
        }
    }
}

impl FromStr for HistoryPolicy {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fresh" | "empty" => Ok(HistoryPolicy::Fresh),
            "fork" | "seed" => Ok(HistoryPolicy::Fork),
            other => Err(DomainError::UnknownHistoryPolicy(other.to_string())),
        }
    }
}

impl std::fmt::Display for HistoryPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What an agent echoes to the console while it works.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Echo chat turns
    pub show_chat: bool,
    /// Echo tool calls and results
    pub show_tools: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            show_chat: true,
            show_tools: true,
        }
    }
}

impl DisplayConfig {
    /// Display settings with all echo turned off.
    pub fn suppressed() -> Self {
        Self {
            show_chat: false,
            show_tools: false,
        }
    }

    pub fn is_suppressed(&self) -> bool {
        !self.show_chat && !self.show_tools
    }
}

/// Static configuration of an agent template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    pub name: AgentName,
    /// System instruction of the agent
    pub instruction: String,
    /// Description shown to parent LLMs when the agent is exposed as a tool
    pub description: Option<String>,
    /// Model identifier, opaque to the relay
    pub model: Option<String>,
    /// Allow-list of tool names; `None` exposes every discovered tool
    pub tools: Option<Vec<String>>,
    pub display: DisplayConfig,
    /// History policy override; `None` uses the dispatcher default
    pub history: Option<HistoryPolicy>,
    /// Maximum number of instances of this template running at once
    pub max_parallelism: Option<usize>,
}

impl AgentConfig {
    pub fn new(name: AgentName, instruction: impl Into<String>) -> Self {
        Self {
            name,
            instruction: instruction.into(),
            description: None,
            model: None,
            tools: None,
            display: DisplayConfig::default(),
            history: None,
            max_parallelism: None,
        }
    }

    // ==================== Builder Methods ====================

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_tools(mut self, tools: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.tools = Some(tools.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_display(mut self, display: DisplayConfig) -> Self {
        self.display = display;
        self
    }

    pub fn with_history(mut self, history: HistoryPolicy) -> Self {
        self.history = Some(history);
        self
    }

    pub fn with_max_parallelism(mut self, max: usize) -> Self {
        self.max_parallelism = Some(max);
        self
    }

    /// Whether the allow-list admits `tool_name`.
    pub fn allows_tool(&self, tool_name: &str) -> bool {
        match &self.tools {
            Some(allowed) => allowed.iter().any(|t| t == tool_name),
            None => true,
        }
    }

    /// Description used when exposing the agent as a tool.
    pub fn tool_description(&self) -> String {
        self.description
            .clone()
            .unwrap_or_else(|| format!("Delegate a task to the '{}' agent", self.name))
    }
}
