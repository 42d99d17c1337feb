//! Connection pool adapters.

mod in_process;

pub use in_process::{InProcessConnectionPool, InProcessServer};
