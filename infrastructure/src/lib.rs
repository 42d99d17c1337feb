//! Infrastructure layer for agent-relay
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading,
//! tool providers, built-in hooks and the registry builder.

pub mod backends;
pub mod builder;
pub mod config;
pub mod connections;
pub mod hooks;
pub mod logging;
pub mod tools;

// Re-export commonly used types
pub use backends::ScriptedBackend;
pub use builder::{BuildError, BuiltRegistry, RegistryBuilder};
pub use config::{
    ConfigLoader, ConfigValidationError, FileAgentConfig, FileCallerConfig, FileConfig,
    FileDispatchConfig, FileHookConfig, FileServerConfig,
};
pub use connections::{InProcessConnectionPool, InProcessServer};
pub use hooks::{AuditLog, Redact, SafetyGuard, builtin_hooks};
pub use logging::JsonlDispatchLogger;
pub use tools::{FunctionToolProvider, RuntimeToolProvider};
