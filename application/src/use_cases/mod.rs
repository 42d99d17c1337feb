//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod dispatch_agents;
pub mod dispatch_mixed;
