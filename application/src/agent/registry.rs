//! Registry of templates exposed to a parent agent as tools.
//!
//! Each template `Name` is exposed as the tool `agent__Name`; lookups
//! also accept the bare name.

use super::template::AgentTemplate;
use relay_domain::agent::{agent_tool_schema, template_name_of};
use relay_domain::{ToolDefinition, ToolSource, ToolSpec};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tracing::{info, warn};

/// Errors raised by the template registry
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Agent '{0}' is already registered")]
    DuplicateTemplate(String),

    #[error("Failed to close connections of {} agent(s): {}", .0.len(), .0.join("; "))]
    ShutdownFailed(Vec<String>),
}

/// Templates by name.
#[derive(Default)]
pub struct TemplateRegistry {
    templates: BTreeMap<String, Arc<AgentTemplate>>,
    shut_down: AtomicBool,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a template under its name.
    pub fn register(&mut self, template: AgentTemplate) -> Result<Arc<AgentTemplate>, RegistryError> {
        let name = template.name().to_string();
        if self.templates.contains_key(&name) {
            return Err(RegistryError::DuplicateTemplate(name));
        }
        let template = Arc::new(template);
        self.templates.insert(name, Arc::clone(&template));
        Ok(template)
    }

    /// Look a template up by tool name (`agent__Name`) or bare name.
    pub fn resolve(&self, tool_name: &str) -> Option<&Arc<AgentTemplate>> {
        self.templates.get(template_name_of(tool_name))
    }

    pub fn contains(&self, tool_name: &str) -> bool {
        self.resolve(tool_name).is_some()
    }

    /// Template names, sorted
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    pub fn templates(&self) -> impl Iterator<Item = &Arc<AgentTemplate>> {
        self.templates.values()
    }

    /// Exposed tool names (`agent__Name`), sorted
    pub fn tool_names(&self) -> Vec<String> {
        self.templates.values().map(|t| t.name().tool_name()).collect()
    }

    /// One tool definition per template, for the parent LLM.
    pub fn tool_definitions(&self) -> Vec<ToolDefinition> {
        self.templates
            .values()
            .map(|t| {
                ToolDefinition::new(
                    t.name().tool_name(),
                    t.config().tool_description(),
                    ToolSource::Agent,
                )
                .with_schema(agent_tool_schema())
            })
            .collect()
    }

    /// The exposed tools as a spec, with bare names as aliases.
    pub fn tool_spec(&self) -> ToolSpec {
        self.tool_definitions()
            .into_iter()
            .fold(ToolSpec::new(), |spec, definition| {
                let bare = template_name_of(&definition.name).to_string();
                let canonical = definition.name.clone();
                spec.register(definition).register_alias(bare, canonical)
            })
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::Acquire)
    }

    /// Close every template's owned connections.
    ///
    /// Each pool is closed at most once, even across repeated calls.
    /// Returns how many pools this call closed.
    pub async fn shutdown(&self) -> Result<usize, RegistryError> {
        self.shut_down.store(true, Ordering::Release);

        let mut closed = 0;
        let mut failures = Vec::new();
        for (name, template) in &self.templates {
            let leases = template.active_leases();
            if leases > 0 {
                warn!(agent = %name, leases, "Closing connections while instances are alive");
            }
            match template.close().await {
                Ok(true) => closed += 1,
                Ok(false) => {}
                Err(e) => failures.push(format!("{}: {}", name, e)),
            }
        }

        if failures.is_empty() {
            info!(closed, "Registry shut down");
            Ok(closed)
        } else {
            Err(RegistryError::ShutdownFailed(failures))
        }
    }
}

impl std::fmt::Debug for TemplateRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateRegistry")
            .field("templates", &self.templates.keys().collect::<Vec<_>>())
            .field("shut_down", &self.is_shut_down())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{CountingPool, ScriptedBackend, template, template_with_pool};

    #[test]
    fn test_register_and_resolve() {
        let mut registry = TemplateRegistry::new();
        registry.register(template("Summarizer", ScriptedBackend::echo())).unwrap();

        assert!(registry.contains("agent__Summarizer"));
        assert!(registry.contains("Summarizer"));
        assert!(!registry.contains("agent__Ghost"));
        assert_eq!(
            registry.resolve("agent__Summarizer").map(|t| t.name().as_str()),
            Some("Summarizer")
        );
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let mut registry = TemplateRegistry::new();
        registry.register(template("Summarizer", ScriptedBackend::echo())).unwrap();
        let err = registry
            .register(template("Summarizer", ScriptedBackend::echo()))
            .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateTemplate(name) if name == "Summarizer"));
    }

    #[test]
    fn test_tool_definitions_use_permissive_schema() {
        let mut registry = TemplateRegistry::new();
        registry.register(template("NY-Time", ScriptedBackend::echo())).unwrap();
        registry.register(template("London-Time", ScriptedBackend::echo())).unwrap();

        assert_eq!(registry.tool_names(), vec!["agent__London-Time", "agent__NY-Time"]);

        let definitions = registry.tool_definitions();
        assert!(definitions.iter().all(|d| d.source == ToolSource::Agent));
        let schema = &definitions[0].input_schema;
        assert_eq!(schema["additionalProperties"], true);
        assert_eq!(schema["properties"]["text"]["type"], "string");
        assert_eq!(schema["properties"]["json"]["type"], "object");

        let spec = registry.tool_spec();
        assert!(spec.get_resolved("NY-Time").is_some());
    }

    #[tokio::test]
    async fn test_shutdown_closes_each_pool_once() {
        let first = Arc::new(CountingPool::new(["docs"]));
        let second = Arc::new(CountingPool::new(["web"]));
        let mut registry = TemplateRegistry::new();
        registry
            .register(template_with_pool("A", ScriptedBackend::echo(), first.clone()))
            .unwrap();
        registry
            .register(template_with_pool("B", ScriptedBackend::echo(), second.clone()))
            .unwrap();

        assert_eq!(registry.shutdown().await.unwrap(), 2);
        assert_eq!(registry.shutdown().await.unwrap(), 0);
        assert!(registry.is_shut_down());
        assert_eq!(first.closes(), 1);
        assert_eq!(second.closes(), 1);
    }
}
