//! Tool Executor port
//!
//! Defines the interface for executing non-agent tools (tool-server tools,
//! local functions, runtime built-ins).

use async_trait::async_trait;
use relay_domain::{CallToolResult, ToolCall, ToolDefinition};

/// Port for tool execution
///
/// Execution never fails at the type level: unknown tools and failed calls
/// come back as error [`CallToolResult`]s.
#[async_trait]
pub trait ToolExecutorPort: Send + Sync {
    /// Definitions of all available tools
    async fn available_tools(&self) -> Vec<ToolDefinition>;

    /// Check if a tool is available
    async fn has_tool(&self, name: &str) -> bool {
        self.available_tools().await.iter().any(|t| t.name == name)
    }

    /// Execute a tool call
    async fn execute(&self, call: &ToolCall) -> CallToolResult;
}
