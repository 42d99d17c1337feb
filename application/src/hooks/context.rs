//! Per-invocation identity handed to every hook.

use crate::ports::agent_backend::GatewayError;
use crate::ports::connection_pool::ConnectionError;
use async_trait::async_trait;
use relay_domain::{CallToolResult, ProviderError, ToolArguments, ToolSource};
use thiserror::Error;

/// Errors raised while invoking a tool or running a hook.
///
/// These never leave the dispatcher: each one becomes an error
/// [`CallToolResult`] for the call that raised it.
#[derive(Error, Debug)]
pub enum InvocationError {
    #[error(transparent)]
    Backend(#[from] GatewayError),

    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("Hook '{hook}' failed: {message}")]
    Hook { hook: String, message: String },

    #[error("Agent instance {0} is already shut down")]
    InstanceShutDown(String),

    #[error("{0}")]
    Other(String),
}

impl InvocationError {
    pub fn hook(hook: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Hook {
            hook: hook.into(),
            message: message.into(),
        }
    }
}

/// The real callable at the end of a hook chain.
#[async_trait]
pub trait ToolInvoker: Send + Sync {
    async fn invoke(&self, arguments: ToolArguments) -> Result<CallToolResult, InvocationError>;
}

/// Immutable snapshot of who is calling what.
///
/// Built once per invocation and passed by reference through the chain.
pub struct ToolHookContext<'a> {
    /// Agent making the call (a Clone label such as `Summarizer[2]`, or
    /// the caller of a dispatched agent tool)
    pub agent_name: String,
    /// Tool server, for `mcp` tools
    pub server_name: Option<String>,
    pub tool_name: String,
    pub tool_source: ToolSource,
    /// Id assigned by the model to this tool use, when known
    pub tool_use_id: Option<String>,
    pub correlation_id: String,
    /// The underlying callable
    pub tool: &'a dyn ToolInvoker,
}

impl<'a> ToolHookContext<'a> {
    pub fn new(
        agent_name: impl Into<String>,
        tool_name: impl Into<String>,
        tool_source: ToolSource,
        correlation_id: impl Into<String>,
        tool: &'a dyn ToolInvoker,
    ) -> Self {
        Self {
            agent_name: agent_name.into(),
            server_name: None,
            tool_name: tool_name.into(),
            tool_source,
            tool_use_id: None,
            correlation_id: correlation_id.into(),
            tool,
        }
    }

    pub fn with_server(mut self, server: impl Into<String>) -> Self {
        self.server_name = Some(server.into());
        self
    }

    pub fn with_tool_use_id(mut self, id: impl Into<String>) -> Self {
        self.tool_use_id = Some(id.into());
        self
    }
}

impl std::fmt::Debug for ToolHookContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolHookContext")
            .field("agent_name", &self.agent_name)
            .field("server_name", &self.server_name)
            .field("tool_name", &self.tool_name)
            .field("tool_source", &self.tool_source)
            .field("tool_use_id", &self.tool_use_id)
            .field("correlation_id", &self.correlation_id)
            .finish_non_exhaustive()
    }
}
