//! Application layer for agent-relay
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod agent;
pub mod config;
pub mod hooks;
pub mod ports;
pub mod tools;
pub mod use_cases;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types
pub use agent::{
    AgentInstance, AgentTemplate, CleanupError, RegistryError, SpawnOptions, TemplateRegistry,
    UsageMeter,
};
pub use config::DispatchParams;
pub use hooks::{
    HookChain, HookFactory, HookLoadError, HookRef, HookRegistry, HookSpec, InvocationError, Next,
    ToolHook, ToolHookContext, ToolInvoker,
};
pub use ports::{
    agent_backend::{AgentBackend, GatewayError, GenerateRequest},
    connection_pool::{ConnectionError, ConnectionPool, NoConnections},
    dispatch_logger::{DispatchEvent, DispatchLogger, NoDispatchLogger},
    progress::{DispatchProgressNotifier, NoDispatchProgress},
    tool_executor::ToolExecutorPort,
};
pub use tools::{ConnectionLease, ConnectionManager, ToolAggregator};
pub use use_cases::dispatch_agents::{AgentDispatcher, CallerContext, DispatchError};
pub use use_cases::dispatch_mixed::MixedDispatcher;
