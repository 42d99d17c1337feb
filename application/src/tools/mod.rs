//! Tool access for agents.
//!
//! - [`connections`]: the owned connection manager and borrowed leases
//! - [`aggregator`]: one agent's view of its tools, wrapped by its hook chain

pub mod aggregator;
pub mod connections;

pub use aggregator::{SERVER_TOOL_SEPARATOR, ToolAggregator};
pub use connections::{ConnectionLease, ConnectionManager};
