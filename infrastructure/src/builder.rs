//! Building the template registry from configuration
//!
//! [`RegistryBuilder`] turns a validated [`FileConfig`] into live objects:
//!
//! ```text
//! [[servers]]  ──▶ InProcessConnectionPool (one per agent, owned by its template)
//! [[agents]]   ──▶ AgentTemplate
//!                   ├─ runtime = [...]  ──▶ RuntimeToolProvider (bare names)
//!                   ├─ hooks = [...]    ──▶ HookChain via HookRegistry
//!                   └─ shared functions ──▶ FunctionToolProvider
//! [dispatch]   ──▶ DispatchParams
//! [caller]     ──▶ HookChain around agent calls
//! ```

use crate::config::{ConfigValidationError, FileConfig, FileServerConfig};
use crate::connections::{InProcessConnectionPool, InProcessServer};
use crate::hooks::builtin_hooks;
use crate::tools::{DEFAULT_SHELL_TIMEOUT, RuntimeToolProvider};
use relay_application::{
    AgentBackend, AgentTemplate, ConnectionPool, DispatchParams, HookChain, HookLoadError,
    HookRegistry, NoConnections, RegistryError, TemplateRegistry,
};
use relay_domain::{ConfigIssue, DomainError, ProviderError, ToolProvider};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Errors raised while building the registry
#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] ConfigValidationError),

    #[error("agents.{agent}: {source}")]
    Domain {
        agent: String,
        #[source]
        source: DomainError,
    },

    #[error("agents.{agent}.hooks: {source}")]
    Hook {
        agent: String,
        #[source]
        source: HookLoadError,
    },

    #[error("caller.hooks: {0}")]
    CallerHook(#[source] HookLoadError),

    #[error("{owner}: {source}")]
    Provider {
        owner: String,
        #[source]
        source: ProviderError,
    },

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Everything a dispatcher needs, built from one configuration.
pub struct BuiltRegistry {
    pub registry: TemplateRegistry,
    pub params: DispatchParams,
    /// Chain for the dispatching agent's `CallerContext`
    pub caller_hooks: HookChain,
    /// Non-fatal configuration issues
    pub warnings: Vec<ConfigIssue>,
}

/// Builds a [`TemplateRegistry`] from a [`FileConfig`].
pub struct RegistryBuilder {
    backend: Arc<dyn AgentBackend>,
    hooks: HookRegistry,
    functions: Vec<Arc<dyn ToolProvider>>,
    working_dir: Option<PathBuf>,
}

impl RegistryBuilder {
    /// Every agent is served by `backend`; hooks resolve against the built-ins.
    pub fn new(backend: Arc<dyn AgentBackend>) -> Self {
        Self {
            backend,
            hooks: builtin_hooks(),
            functions: Vec::new(),
            working_dir: None,
        }
    }

    // ==================== Builder Methods ====================

    /// Resolve hook specs against `hooks` instead of the built-ins.
    pub fn with_hooks(mut self, hooks: HookRegistry) -> Self {
        self.hooks = hooks;
        self
    }

    /// Attach a function-tool provider to every agent.
    pub fn with_functions(mut self, provider: Arc<dyn ToolProvider>) -> Self {
        self.functions.push(provider);
        self
    }

    /// Directory runtime tools run in
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    // ==================== Build ====================

    pub fn build(&self, config: &FileConfig) -> Result<BuiltRegistry, BuildError> {
        let warnings = config.check()?;
        let (params, _) = config.dispatch.to_params();
        let caller_hooks = self
            .hooks
            .build_chain(&config.caller.hook_refs())
            .map_err(BuildError::CallerHook)?;

        let servers: HashMap<&str, &FileServerConfig> =
            config.servers.iter().map(|s| (s.name.as_str(), s)).collect();

        let mut registry = TemplateRegistry::new();
        for agent in &config.agents {
            let agent_config = agent.to_agent_config().map_err(|source| BuildError::Domain {
                agent: agent.name.clone(),
                source,
            })?;

            let hooks = self
                .hooks
                .build_chain(&agent.hook_refs())
                .map_err(|source| BuildError::Hook {
                    agent: agent.name.clone(),
                    source,
                })?;

            let hosted = agent
                .servers
                .iter()
                .filter_map(|name| servers.get(name.as_str()))
                .map(|server| self.server(server))
                .collect::<Result<Vec<_>, _>>()?;
            let connections: Arc<dyn ConnectionPool> = if hosted.is_empty() {
                Arc::new(NoConnections)
            } else {
                Arc::new(InProcessConnectionPool::new(hosted))
            };

            let mut providers = self.functions.clone();
            if !agent.runtime.is_empty() {
                let runtime = RuntimeToolProvider::only(&agent.runtime).map_err(|source| {
                    BuildError::Provider {
                        owner: format!("agents.{}.runtime", agent.name),
                        source,
                    }
                })?;
                providers.push(Arc::new(self.in_working_dir(runtime)));
            }

            debug!(
                agent = %agent.name,
                servers = ?agent.servers,
                runtime = ?agent.runtime,
                hooks = ?hooks.names(),
                "Building agent template"
            );
            let template = AgentTemplate::new(agent_config, Arc::clone(&self.backend), connections)
                .with_providers(providers)
                .with_hooks(hooks);
            registry.register(template)?;
        }

        info!(agents = registry.len(), "Agent templates registered");
        Ok(BuiltRegistry {
            registry,
            params,
            caller_hooks,
            warnings,
        })
    }

    fn server(&self, server: &FileServerConfig) -> Result<InProcessServer, BuildError> {
        let timeout = match server.shell_timeout_secs {
            0 => DEFAULT_SHELL_TIMEOUT,
            secs => Duration::from_secs(secs),
        };
        let provider = RuntimeToolProvider::only(&server.tools)
            .map_err(|source| BuildError::Provider {
                owner: format!("servers.{}.tools", server.name),
                source,
            })?
            .with_shell_timeout(timeout);
        Ok(InProcessServer::new(
            server.name.as_str(),
            Arc::new(self.in_working_dir(provider)),
        ))
    }

    fn in_working_dir(&self, provider: RuntimeToolProvider) -> RuntimeToolProvider {
        match &self.working_dir {
            Some(dir) => provider.with_working_dir(dir.clone()),
            None => provider,
        }
    }
}
