//! Connection pool port
//!
//! A pool of live connections to external tool servers. The transport is an
//! adapter concern; the relay only cares that a pool can list and call tools
//! concurrently and can be torn down.
//!
//! Who may tear a pool down is decided by
//! [`ConnectionManager`](crate::tools::connections::ConnectionManager), not
//! by implementations of this trait.

use async_trait::async_trait;
use relay_domain::{CallToolResult, ToolArguments, ToolDefinition};
use thiserror::Error;

/// Errors raised by a connection pool
#[derive(Error, Debug)]
pub enum ConnectionError {
    #[error("Connections are closed")]
    Closed,

    #[error("Tool server not found: {0}")]
    ServerNotFound(String),

    #[error("Tool '{tool}' not found on server '{server}'")]
    ToolNotFound { server: String, tool: String },

    #[error("Transport error: {0}")]
    Transport(String),
}

/// Live connections to external tool servers.
///
/// Must support concurrent use from many callers.
#[async_trait]
pub trait ConnectionPool: Send + Sync {
    /// Names of the connected servers
    fn server_names(&self) -> Vec<String>;

    /// Tools offered by one server, with bare (unprefixed) names
    async fn list_tools(&self, server: &str) -> Result<Vec<ToolDefinition>, ConnectionError>;

    /// Call a tool on one server
    async fn call_tool(
        &self,
        server: &str,
        tool: &str,
        arguments: &ToolArguments,
    ) -> Result<CallToolResult, ConnectionError>;

    /// Tear down every connection
    async fn close(&self) -> Result<(), ConnectionError>;
}

/// Pool with no servers, for agents that use no external tools.
pub struct NoConnections;

#[async_trait]
impl ConnectionPool for NoConnections {
    fn server_names(&self) -> Vec<String> {
        Vec::new()
    }

    async fn list_tools(&self, server: &str) -> Result<Vec<ToolDefinition>, ConnectionError> {
        Err(ConnectionError::ServerNotFound(server.to_string()))
    }

    async fn call_tool(
        &self,
        server: &str,
        _tool: &str,
        _arguments: &ToolArguments,
    ) -> Result<CallToolResult, ConnectionError> {
        Err(ConnectionError::ServerNotFound(server.to_string()))
    }

    async fn close(&self) -> Result<(), ConnectionError> {
        Ok(())
    }
}
