//! Tool provider abstraction
//!
//! This module defines the [`ToolProvider`] trait, which abstracts any local
//! source of tools (in-process functions, runtime built-ins, in-process tool
//! servers) that an agent's tool aggregator can route calls to.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                    ToolAggregator                        │
//! │   (per agent, routes by name, wraps calls in hooks)      │
//! └──────────────────────────────────────────────────────────┘
//!        │                  │                     │
//!        ▼                  ▼                     ▼
//!  ┌──────────┐      ┌──────────┐        ┌──────────────────┐
//!  │ Function │      │ Runtime  │        │ ConnectionManager│
//!  │ Provider │      │ Provider │        │  (tool servers)  │
//!  └──────────┘      └──────────┘        └──────────────────┘
//! ```
//!
//! Tools reached through the connection manager do not implement this
//! trait directly; the aggregator talks to them through the connection
//! pool port of the application layer.

use async_trait::async_trait;
use thiserror::Error;

use super::entities::{ToolArguments, ToolDefinition};
use super::source::ToolSource;
use super::value_objects::CallToolResult;

/// Error type for tool provider operations
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Provider is not available (e.g., binary not installed)
    #[error("Provider not available: {0}")]
    NotAvailable(String),

    /// Failed to discover tools from the provider
    #[error("Discovery failed: {0}")]
    DiscoveryFailed(String),

    /// Tool not found in this provider
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Arguments did not fit the tool
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// Tool execution failed
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),
}

/// Tool provider abstraction - a local source of tools
#[async_trait]
pub trait ToolProvider: Send + Sync {
    /// Unique identifier for this provider
    ///
    /// Examples: "functions", "runtime", "server:docs"
    fn id(&self) -> &str;

    /// Origin reported to hooks for tools of this provider
    fn source(&self) -> ToolSource;

    /// Priority for tool resolution (higher = preferred)
    fn priority(&self) -> i32 {
        0
    }

    /// Check if the provider is available and properly configured
    async fn is_available(&self) -> bool {
        true
    }

    /// Discover available tools from this provider
    async fn discover_tools(&self) -> Result<Vec<ToolDefinition>, ProviderError>;

    /// Execute a tool
    ///
    /// `tool_name` must be one of the names returned by `discover_tools()`.
    async fn execute(
        &self,
        tool_name: &str,
        arguments: &ToolArguments,
    ) -> Result<CallToolResult, ProviderError>;

    /// Check if this provider has a specific tool
    async fn has_tool(&self, tool_name: &str) -> bool {
        match self.discover_tools().await {
            Ok(tools) => tools.iter().any(|t| t.name == tool_name),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A mock provider for testing
    struct MockProvider {
        tools: Vec<ToolDefinition>,
        available: bool,
    }

    impl MockProvider {
        fn new(available: bool) -> Self {
            Self {
                tools: Vec::new(),
                available,
            }
        }

        fn with_tool(mut self, name: &str) -> Self {
            self.tools.push(ToolDefinition::new(
                name,
                format!("Mock tool: {}", name),
                ToolSource::Function,
            ));
            self
        }
    }

    #[async_trait]
    impl ToolProvider for MockProvider {
        fn id(&self) -> &str {
            "mock"
        }

        fn source(&self) -> ToolSource {
            ToolSource::Function
        }

        async fn is_available(&self) -> bool {
            self.available
        }

        async fn discover_tools(&self) -> Result<Vec<ToolDefinition>, ProviderError> {
            if self.available {
                Ok(self.tools.clone())
            } else {
                Err(ProviderError::NotAvailable("Mock not available".into()))
            }
        }

        async fn execute(
            &self,
            tool_name: &str,
            _arguments: &ToolArguments,
        ) -> Result<CallToolResult, ProviderError> {
            if self.tools.iter().any(|t| t.name == tool_name) {
                Ok(CallToolResult::text("Mock output"))
            } else {
                Err(ProviderError::ToolNotFound(tool_name.to_string()))
            }
        }
    }

    #[tokio::test]
    async fn test_provider_discovery() {
        let provider = MockProvider::new(true).with_tool("tool_a").with_tool("tool_b");

        assert!(provider.is_available().await);
        let tools = provider.discover_tools().await.unwrap();
        assert_eq!(tools.len(), 2);
        assert_eq!(provider.priority(), 0);
    }

    #[tokio::test]
    async fn test_provider_not_available() {
        let provider = MockProvider::new(false);

        assert!(!provider.is_available().await);
        assert!(provider.discover_tools().await.is_err());
        assert!(!provider.has_tool("anything").await);
    }

    #[tokio::test]
    async fn test_provider_execute() {
        let provider = MockProvider::new(true).with_tool("lookup");

        let result = provider.execute("lookup", &ToolArguments::new()).await.unwrap();
        assert!(!result.is_error());

        let missing = provider.execute("missing", &ToolArguments::new()).await;
        assert!(matches!(missing, Err(ProviderError::ToolNotFound(_))));
    }
}
