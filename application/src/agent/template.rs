//! Long-lived agent templates.
//!
//! An [`AgentTemplate`] is an agent registered under a stable name. It owns
//! the agent's connections (through its owning [`ToolAggregator`]), its
//! canonical history and its cumulative usage. It never runs a tool call
//! itself: every call gets a fresh [`AgentInstance`] from
//! [`AgentTemplate::spawn`].
//!
//! After construction the only mutation a template sees is
//! [`merge_usage`](AgentTemplate::merge_usage), once per finished instance.

use super::instance::{AgentInstance, CleanupError};
use super::usage_meter::UsageMeter;
use crate::hooks::HookChain;
use crate::ports::agent_backend::AgentBackend;
use crate::ports::connection_pool::{ConnectionError, ConnectionPool};
use crate::tools::aggregator::ToolAggregator;
use crate::tools::connections::ConnectionManager;
use relay_domain::{
    AgentConfig, AgentName, DisplayConfig, HistoryPolicy, InstanceIndex, Message, ToolProvider,
    Usage,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;
use tracing::debug;

/// How an instance is derived from its template.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpawnOptions {
    pub history: HistoryPolicy,
    /// Turn off chat and tool echo for the instance
    pub suppress_display: bool,
}

/// An agent registered under a stable name.
pub struct AgentTemplate {
    config: AgentConfig,
    backend: Arc<dyn AgentBackend>,
    /// Owning aggregator: holds the template's connections
    tools: ToolAggregator,
    history: Vec<Message>,
    usage: Mutex<Usage>,
    merged_instances: AtomicUsize,
    limiter: Option<Arc<Semaphore>>,
}

impl AgentTemplate {
    pub fn new(
        config: AgentConfig,
        backend: Arc<dyn AgentBackend>,
        connections: Arc<dyn ConnectionPool>,
    ) -> Self {
        let tools = ToolAggregator::owner(config.name.as_str(), ConnectionManager::new(connections))
            .with_allowed_tools(config.tools.clone());
        let limiter = config
            .max_parallelism
            .filter(|max| *max > 0)
            .map(|max| Arc::new(Semaphore::new(max)));

        Self {
            config,
            backend,
            tools,
            history: Vec::new(),
            usage: Mutex::new(Usage::default()),
            merged_instances: AtomicUsize::new(0),
            limiter,
        }
    }

    // ==================== Builder Methods ====================

    pub fn with_providers(mut self, providers: impl IntoIterator<Item = Arc<dyn ToolProvider>>) -> Self {
        self.tools = self.tools.with_providers(providers);
        self
    }

    pub fn with_hooks(mut self, hooks: HookChain) -> Self {
        self.tools = self.tools.with_hooks(hooks);
        self
    }

    /// Seed the canonical history used by [`HistoryPolicy::Fork`].
    pub fn with_history(mut self, history: Vec<Message>) -> Self {
        self.history = history;
        self
    }

    // ==================== Accessors ====================

    pub fn name(&self) -> &AgentName {
        &self.config.name
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub(crate) fn backend(&self) -> &dyn AgentBackend {
        self.backend.as_ref()
    }

    /// The template's own (owning) tool aggregator
    pub fn tools(&self) -> &ToolAggregator {
        &self.tools
    }

    pub fn hooks(&self) -> &HookChain {
        self.tools.hooks()
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    /// Semaphore bounding concurrent instances, if configured
    pub fn limiter(&self) -> Option<Arc<Semaphore>> {
        self.limiter.clone()
    }

    /// Cumulative usage of all finished instances
    pub fn usage(&self) -> Usage {
        *self.usage.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Number of instances whose usage has been merged
    pub fn merged_instances(&self) -> usize {
        self.merged_instances.load(Ordering::Acquire)
    }

    /// Number of instances currently holding a lease on the connections
    pub fn active_leases(&self) -> usize {
        self.tools.active_leases().unwrap_or(0)
    }

    // ==================== Lifecycle ====================

    /// Create a single-use instance labelled `Name[index]`.
    ///
    /// The instance copies the static configuration, starts with zero usage
    /// and a history chosen by `options.history`, and borrows the template's
    /// connections. Display suppression is applied to the copy only.
    pub fn spawn(self: &Arc<Self>, index: InstanceIndex, options: SpawnOptions) -> AgentInstance {
        let label = self.config.name.instance_label(index);

        let mut config = self.config.clone();
        if options.suppress_display {
            config.display = DisplayConfig::suppressed();
        }

        let history = match options.history {
            HistoryPolicy::Fresh => Vec::new(),
            HistoryPolicy::Fork => self.history.clone(),
        };

        let usage = Arc::new(UsageMeter::new());
        let tools = self.tools.borrow_for(label.clone(), Arc::clone(&usage));

        debug!(
            agent = %self.config.name,
            instance = %label,
            history = %options.history,
            "Spawned instance"
        );
        AgentInstance::new(Arc::clone(self), index, label, config, history, usage, tools)
    }

    /// Fold a finished instance's usage into the template.
    pub(crate) fn merge_usage(&self, usage: &Usage) -> Result<(), CleanupError> {
        let mut total = self
            .usage
            .lock()
            .map_err(|_| CleanupError::UsageLedgerPoisoned(self.config.name.to_string()))?;
        total.merge(usage);
        self.merged_instances.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    /// Close the connections this template owns.
    ///
    /// Idempotent; returns whether this call performed the teardown.
    pub async fn close(&self) -> Result<bool, ConnectionError> {
        self.tools.close().await
    }
}

impl std::fmt::Debug for AgentTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentTemplate")
            .field("name", &self.config.name)
            .field("hooks", self.hooks())
            .field("usage", &self.usage())
            .finish_non_exhaustive()
    }
}
