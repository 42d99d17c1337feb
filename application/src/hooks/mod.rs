//! Hook chains: declarative middleware around tool invocations.
//!
//! - [`context`]: the per-call [`ToolHookContext`] and the error type
//! - [`chain`]: the [`ToolHook`] trait and continuation-passing [`HookChain`]
//! - [`loader`]: resolving `"<module>:<function>"` references

pub mod chain;
pub mod context;
pub mod loader;

pub use chain::{HookChain, Next, ToolHook};
pub use context::{InvocationError, ToolHookContext, ToolInvoker};
pub use loader::{HookFactory, HookLoadError, HookRef, HookRegistry, HookSpec};
