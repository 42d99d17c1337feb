//! Agent identity and tool naming.
//!
//! A template is registered under a stable name. When it is exposed to a
//! parent LLM it appears as the tool `agent__<name>`; the bare name is also
//! accepted on lookup. Each ephemeral instance spawned for a single call is
//! labelled `<name>[<index>]`, with a 1-based index that is unique among the
//! concurrent calls to the same template within one turn.

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

/// Prefix of tool names that stand for agent templates.
pub const AGENT_TOOL_PREFIX: &str = "agent__";

/// Validated name of an agent template.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AgentName(String);

impl AgentName {
    pub fn new(name: impl Into<String>) -> Result<Self, DomainError> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(DomainError::EmptyAgentName);
        }
        if trimmed.contains('[') || trimmed.contains(']') {
            return Err(DomainError::InvalidAgentName(name));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Tool name under which this agent is exposed (`agent__<name>`).
    pub fn tool_name(&self) -> String {
        format!("{}{}", AGENT_TOOL_PREFIX, self.0)
    }

    /// Display label of the `index`-th instance spawned in a turn.
    pub fn instance_label(&self, index: InstanceIndex) -> String {
        format!("{}[{}]", self.0, index.get())
    }
}

impl std::fmt::Display for AgentName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for AgentName {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<AgentName> for String {
    fn from(name: AgentName) -> Self {
        name.0
    }
}

impl AsRef<str> for AgentName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// 1-based per-turn instance number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstanceIndex(usize);

impl InstanceIndex {
    pub fn new(index: usize) -> Result<Self, DomainError> {
        if index == 0 {
            return Err(DomainError::InvalidInstanceIndex(index));
        }
        Ok(Self(index))
    }

    pub fn first() -> Self {
        Self(1)
    }

    pub fn get(&self) -> usize {
        self.0
    }

    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl std::fmt::Display for InstanceIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Strip the `agent__` prefix from a requested tool name, if present.
///
/// ```
/// use relay_domain::agent::identity::template_name_of;
///
/// assert_eq!(template_name_of("agent__Summarizer"), "Summarizer");
/// assert_eq!(template_name_of("Summarizer"), "Summarizer");
/// ```
pub fn template_name_of(tool_name: &str) -> &str {
    tool_name.strip_prefix(AGENT_TOOL_PREFIX).unwrap_or(tool_name)
}

/// Whether a tool name carries the agent-tool prefix.
pub fn is_agent_tool_name(tool_name: &str) -> bool {
    tool_name.starts_with(AGENT_TOOL_PREFIX)
}

/// Argument schema offered to the parent LLM for every agent tool.
///
/// Intentionally permissive: `text` and `json` are hints, any other key is
/// accepted and forwarded.
pub fn agent_tool_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "text": {
                "type": "string",
                "description": "Plain text input for the agent"
            },
            "json": {
                "type": "object",
                "description": "Structured input for the agent"
            }
        },
        "additionalProperties": true
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_name_validation() {
        assert_eq!(AgentName::new("  Summarizer ").unwrap().as_str(), "Summarizer");
        assert_eq!(AgentName::new(""), Err(DomainError::EmptyAgentName));
        assert!(matches!(
            AgentName::new("Bad[1]"),
            Err(DomainError::InvalidAgentName(_))
        ));
    }

    #[test]
    fn test_tool_name_and_label() {
        let name = AgentName::new("NY-Time").unwrap();
        assert_eq!(name.tool_name(), "agent__NY-Time");
        assert_eq!(name.instance_label(InstanceIndex::first()), "NY-Time[1]");
        assert_eq!(
            name.instance_label(InstanceIndex::first().next().next()),
            "NY-Time[3]"
        );
    }

    #[test]
    fn test_instance_index_is_one_based() {
        assert!(InstanceIndex::new(0).is_err());
        assert_eq!(InstanceIndex::new(2).unwrap().get(), 2);
    }

    #[test]
    fn test_template_name_of() {
        assert_eq!(template_name_of("agent__Ghost"), "Ghost");
        assert_eq!(template_name_of("Ghost"), "Ghost");
        assert!(is_agent_tool_name("agent__Ghost"));
        assert!(!is_agent_tool_name("shell.execute"));
    }

    #[test]
    fn test_schema_is_permissive() {
        let schema = agent_tool_schema();
        assert_eq!(schema["additionalProperties"], true);
        assert_eq!(schema["properties"]["text"]["type"], "string");
        assert_eq!(schema["properties"]["json"]["type"], "object");
        assert!(schema.get("required").is_none());
    }

    #[test]
    fn test_agent_name_serde() {
        let name: AgentName = serde_json::from_str("\"Writer\"").unwrap();
        assert_eq!(name.as_str(), "Writer");
        assert!(serde_json::from_str::<AgentName>("\"\"").is_err());
    }
}
