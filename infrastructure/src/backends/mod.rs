//! Agent backends
//!
//! Adapters implementing the
//! [`AgentBackend`](relay_application::AgentBackend) port.

pub mod scripted;

pub use scripted::ScriptedBackend;
