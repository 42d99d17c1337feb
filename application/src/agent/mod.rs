//! Agents at runtime: templates, their single-use instances and the
//! registry that exposes templates as tools.

pub mod instance;
pub mod registry;
pub mod template;
pub mod usage_meter;

pub use instance::{AgentInstance, CleanupError};
pub use registry::{RegistryError, TemplateRegistry};
pub use template::{AgentTemplate, SpawnOptions};
pub use usage_meter::UsageMeter;
