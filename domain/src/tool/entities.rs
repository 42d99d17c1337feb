//! Tool domain entities

use super::source::ToolSource;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Opaque key-value arguments of a tool call.
pub type ToolArguments = HashMap<String, serde_json::Value>;

/// Definition of a tool that can be offered to an LLM
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Unique name of the tool (e.g., "shell.execute", "agent__Summarizer")
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// Where the tool comes from
    pub source: ToolSource,
    /// Owning tool server, for `mcp` tools
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_name: Option<String>,
    /// JSON schema of the arguments
    pub input_schema: serde_json::Value,
}

impl ToolDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>, source: ToolSource) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            source,
            server_name: None,
            input_schema: serde_json::json!({ "type": "object" }),
        }
    }

    pub fn with_server(mut self, server: impl Into<String>) -> Self {
        self.server_name = Some(server.into());
        self
    }

    pub fn with_schema(mut self, schema: serde_json::Value) -> Self {
        self.input_schema = schema;
        self
    }

    /// Render the definition in the shape tool-calling LLM APIs expect.
    pub fn to_api_tool(&self) -> serde_json::Value {
        serde_json::json!({
            "name": self.name,
            "description": self.description,
            "input_schema": self.input_schema,
        })
    }
}

/// Specification of available tools, with alias resolution
#[derive(Debug, Clone, Default)]
pub struct ToolSpec {
    tools: HashMap<String, ToolDefinition>,
    /// Alias → canonical name mapping (e.g. "Summarizer" → "agent__Summarizer")
    aliases: HashMap<String, String>,
}

impl ToolSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, tool: ToolDefinition) -> Self {
        self.tools.insert(tool.name.clone(), tool);
        self
    }

    /// Register a single alias mapping (builder pattern)
    pub fn register_alias(mut self, alias: impl Into<String>, canonical: impl Into<String>) -> Self {
        self.aliases.insert(alias.into(), canonical.into());
        self
    }

    /// Resolve a name: returns canonical name if it's a registered tool,
    /// or resolves alias, or None if unknown
    pub fn resolve<'a>(&'a self, name: &'a str) -> Option<&'a str> {
        if self.tools.contains_key(name) {
            Some(name)
        } else {
            self.aliases.get(name).map(|s| s.as_str())
        }
    }

    /// Get tool definition by canonical name or alias
    pub fn get_resolved(&self, name: &str) -> Option<&ToolDefinition> {
        self.resolve(name).and_then(|canonical| self.tools.get(canonical))
    }

    pub fn get(&self, name: &str) -> Option<&ToolDefinition> {
        self.tools.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.resolve(name).is_some()
    }

    pub fn all(&self) -> impl Iterator<Item = &ToolDefinition> {
        self.tools.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tools.keys().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// All definitions sorted by name, rendered for an LLM request.
    pub fn to_api_tools(&self) -> Vec<serde_json::Value> {
        let mut tools: Vec<&ToolDefinition> = self.tools.values().collect();
        tools.sort_by(|a, b| a.name.cmp(&b.name));
        tools.into_iter().map(ToolDefinition::to_api_tool).collect()
    }
}

/// A request to call a tool, as parsed from one LLM turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Caller-assigned id, unique within the turn
    #[serde(rename = "id")]
    pub correlation_id: String,
    /// Name of the tool to call
    #[serde(rename = "name")]
    pub tool_name: String,
    /// Arguments passed to the tool
    #[serde(default)]
    pub arguments: ToolArguments,
}

impl ToolCall {
    pub fn new(correlation_id: impl Into<String>, tool_name: impl Into<String>) -> Self {
        Self {
            correlation_id: correlation_id.into(),
            tool_name: tool_name.into(),
            arguments: HashMap::new(),
        }
    }

    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.arguments.insert(key.into(), value.into());
        self
    }

    pub fn with_arguments(mut self, arguments: ToolArguments) -> Self {
        self.arguments = arguments;
        self
    }

    /// Get a string argument
    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.arguments.get(key).and_then(|v| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_definition() {
        let tool = ToolDefinition::new("search", "Search docs", ToolSource::Mcp)
            .with_server("docs")
            .with_schema(serde_json::json!({"type": "object", "properties": {"q": {"type": "string"}}}));

        assert_eq!(tool.name, "search");
        assert_eq!(tool.server_name.as_deref(), Some("docs"));
        let api = tool.to_api_tool();
        assert_eq!(api["name"], "search");
        assert_eq!(api["input_schema"]["properties"]["q"]["type"], "string");
    }

    #[test]
    fn test_tool_spec_aliases() {
        let spec = ToolSpec::new()
            .register(ToolDefinition::new("agent__Summarizer", "Summarize", ToolSource::Agent))
            .register_alias("Summarizer", "agent__Summarizer");

        assert_eq!(spec.resolve("agent__Summarizer"), Some("agent__Summarizer"));
        assert_eq!(spec.resolve("Summarizer"), Some("agent__Summarizer"));
        assert_eq!(spec.resolve("Ghost"), None);
        assert!(spec.contains("Summarizer"));
        assert_eq!(spec.get_resolved("Summarizer").unwrap().source, ToolSource::Agent);
        // get() is exact match only
        assert!(spec.get("Summarizer").is_none());
    }

    #[test]
    fn test_canonical_name_takes_priority_over_alias() {
        let spec = ToolSpec::new()
            .register(ToolDefinition::new("view", "View tool", ToolSource::Function))
            .register(ToolDefinition::new("read", "Read tool", ToolSource::Function))
            .register_alias("view", "read");

        assert_eq!(spec.resolve("view"), Some("view"));
    }

    #[test]
    fn test_api_tools_are_sorted() {
        let spec = ToolSpec::new()
            .register(ToolDefinition::new("b", "", ToolSource::Function))
            .register(ToolDefinition::new("a", "", ToolSource::Function));

        let names: Vec<_> = spec
            .to_api_tools()
            .into_iter()
            .map(|t| t["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_tool_call_deserializes_wire_names() {
        let call: ToolCall = serde_json::from_value(serde_json::json!({
            "id": "c1",
            "name": "agent__Summarizer",
            "arguments": {"text": "hello"}
        }))
        .unwrap();

        assert_eq!(call.correlation_id, "c1");
        assert_eq!(call.tool_name, "agent__Summarizer");
        assert_eq!(call.get_string("text"), Some("hello"));
    }

    #[test]
    fn test_tool_call_arguments_default_to_empty() {
        let call: ToolCall =
            serde_json::from_value(serde_json::json!({"id": "c1", "name": "x"})).unwrap();
        assert!(call.arguments.is_empty());
    }
}
