//! Application-level configuration.
//!
//! - [`DispatchParams`]: how a turn's agent calls are executed (history
//!   policy, display suppression, timeouts, parallelism)

pub mod dispatch_params;

pub use dispatch_params::DispatchParams;
