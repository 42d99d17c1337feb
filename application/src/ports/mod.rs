//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod agent_backend;
pub mod connection_pool;
pub mod dispatch_logger;
pub mod progress;
pub mod tool_executor;
