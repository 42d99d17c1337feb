//! Tool Aggregator
//!
//! The [`ToolAggregator`] is an agent's single view of every tool it can
//! call: tools offered by external tool servers (through the agent's
//! connection pool) and tools offered by local providers (functions,
//! runtime built-ins). It implements [`ToolExecutorPort`].
//!
//! # Naming
//!
//! Tool-server tools are exposed as `<server>__<tool>` so that two servers
//! can offer tools with the same name. Provider tools keep their own names.
//!
//! # Ownership
//!
//! A template's aggregator *owns* its [`ConnectionManager`]. Instances get
//! an aggregator from [`ToolAggregator::borrow_for`], which holds a
//! [`ConnectionLease`] instead. Only an owning aggregator can close
//! connections; on a borrowing one, [`close`](ToolAggregator::close) is a
//! no-op and dropping it just releases the lease.
//!
//! # Discovery
//!
//! Tools are discovered lazily on first use and cached for the lifetime of
//! the aggregator:
//!
//! 1. Every connected server is asked for its tools
//! 2. Providers are consulted by priority (highest first)
//! 3. The first source to offer a name wins
//! 4. The agent's allow-list filters the result
//!
//! Every invocation goes through the agent's [`HookChain`].

use std::collections::HashMap;
use std::sync::Arc;

use crate::agent::usage_meter::UsageMeter;
use crate::hooks::{HookChain, InvocationError, ToolHookContext, ToolInvoker};
use crate::ports::connection_pool::ConnectionError;
use crate::ports::tool_executor::ToolExecutorPort;
use crate::tools::connections::{ConnectionLease, ConnectionManager};
use async_trait::async_trait;
use relay_domain::{
    CallToolResult, ErrorKind, ToolArguments, ToolCall, ToolDefinition, ToolProvider, ToolSource,
    ToolSpec,
};
use tokio::sync::OnceCell;
use tracing::{debug, trace, warn};

/// Separator between server name and tool name.
pub const SERVER_TOOL_SEPARATOR: &str = "__";

enum Binding {
    Owner(ConnectionManager),
    Borrowed(ConnectionLease),
}

impl Binding {
    fn server_names(&self) -> Vec<String> {
        match self {
            Binding::Owner(manager) => manager.server_names(),
            Binding::Borrowed(lease) => lease.server_names(),
        }
    }

    async fn list_tools(&self, server: &str) -> Result<Vec<ToolDefinition>, ConnectionError> {
        match self {
            Binding::Owner(manager) => manager.list_tools(server).await,
            Binding::Borrowed(lease) => lease.list_tools(server).await,
        }
    }

    async fn call_tool(
        &self,
        server: &str,
        tool: &str,
        arguments: &ToolArguments,
    ) -> Result<CallToolResult, ConnectionError> {
        match self {
            Binding::Owner(manager) => manager.call_tool(server, tool, arguments).await,
            Binding::Borrowed(lease) => lease.call_tool(server, tool, arguments).await,
        }
    }

    fn lease(&self) -> ConnectionLease {
        match self {
            Binding::Owner(manager) => manager.lease(),
            Binding::Borrowed(lease) => lease.clone(),
        }
    }
}

enum Route {
    Server { server: String, tool: String },
    Provider(Arc<dyn ToolProvider>),
}

struct Catalog {
    spec: ToolSpec,
    routes: HashMap<String, Route>,
}

/// Per-agent facade over tool servers and local tool providers
pub struct ToolAggregator {
    /// Label of the agent using the aggregator, passed to hooks
    agent_label: String,
    binding: Binding,
    /// Local providers, sorted by priority (highest first)
    providers: Vec<Arc<dyn ToolProvider>>,
    hooks: HookChain,
    allowed_tools: Option<Vec<String>>,
    usage: Option<Arc<UsageMeter>>,
    catalog: OnceCell<Catalog>,
}

impl ToolAggregator {
    /// Create an aggregator that owns its connections.
    pub fn owner(agent_label: impl Into<String>, connections: ConnectionManager) -> Self {
        Self::with_binding(agent_label.into(), Binding::Owner(connections))
    }

    fn with_binding(agent_label: String, binding: Binding) -> Self {
        Self {
            agent_label,
            binding,
            providers: Vec::new(),
            hooks: HookChain::empty(),
            allowed_tools: None,
            usage: None,
            catalog: OnceCell::new(),
        }
    }

    /// Register a local tool provider
    pub fn with_provider(mut self, provider: Arc<dyn ToolProvider>) -> Self {
        self.providers.push(provider);
        self.providers
            .sort_by_key(|p| std::cmp::Reverse(p.priority()));
        self
    }

    pub fn with_providers(self, providers: impl IntoIterator<Item = Arc<dyn ToolProvider>>) -> Self {
        providers
            .into_iter()
            .fold(self, |aggregator, p| aggregator.with_provider(p))
    }

    pub fn with_hooks(mut self, hooks: HookChain) -> Self {
        self.hooks = hooks;
        self
    }

    /// Restrict the exposed tools to an allow-list.
    ///
    /// Tool-server tools match either their qualified (`server__tool`) or
    /// bare name.
    pub fn with_allowed_tools(mut self, allowed: Option<Vec<String>>) -> Self {
        self.allowed_tools = allowed;
        self
    }

    /// Count every invocation into `usage`.
    pub fn with_usage(mut self, usage: Arc<UsageMeter>) -> Self {
        self.usage = Some(usage);
        self
    }

    /// Create a non-owning aggregator for an instance of this agent.
    ///
    /// The new aggregator shares providers, hooks and allow-list, leases the
    /// same connections and rediscovers tools on its own.
    pub fn borrow_for(&self, agent_label: impl Into<String>, usage: Arc<UsageMeter>) -> Self {
        let mut aggregator =
            Self::with_binding(agent_label.into(), Binding::Borrowed(self.binding.lease()));
        aggregator.providers = self.providers.clone();
        aggregator.hooks = self.hooks.clone();
        aggregator.allowed_tools = self.allowed_tools.clone();
        aggregator.usage = Some(usage);
        aggregator
    }

    pub fn agent_label(&self) -> &str {
        &self.agent_label
    }

    pub fn hooks(&self) -> &HookChain {
        &self.hooks
    }

    /// Whether this aggregator holds teardown rights over its connections
    pub fn is_owner(&self) -> bool {
        matches!(self.binding, Binding::Owner(_))
    }

    /// Number of live leases on the owned connections (`None` when borrowing)
    pub fn active_leases(&self) -> Option<usize> {
        match &self.binding {
            Binding::Owner(manager) => Some(manager.active_leases()),
            Binding::Borrowed(_) => None,
        }
    }

    /// Get a list of registered provider IDs
    pub fn provider_ids(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.id()).collect()
    }

    /// Close owned connections.
    ///
    /// Returns whether this call tore the connections down. Borrowing
    /// aggregators never do.
    pub async fn close(&self) -> Result<bool, ConnectionError> {
        match &self.binding {
            Binding::Owner(manager) => manager.close().await,
            Binding::Borrowed(_) => {
                trace!(agent = %self.agent_label, "Borrowed connections are not closed");
                Ok(false)
            }
        }
    }

    fn allows(&self, qualified: &str, bare: &str) -> bool {
        match &self.allowed_tools {
            Some(allowed) => allowed.iter().any(|a| a == qualified || a == bare),
            None => true,
        }
    }

    async fn catalog(&self) -> &Catalog {
        self.catalog.get_or_init(|| self.discover()).await
    }

    async fn discover(&self) -> Catalog {
        let mut spec = ToolSpec::new();
        let mut routes = HashMap::new();

        for server in self.binding.server_names() {
            match self.binding.list_tools(&server).await {
                Ok(tools) => {
                    for tool in tools {
                        let bare = tool.name.clone();
                        let qualified = format!("{}{}{}", server, SERVER_TOOL_SEPARATOR, bare);
                        if !self.allows(&qualified, &bare) || routes.contains_key(&qualified) {
                            continue;
                        }
                        let definition = ToolDefinition {
                            name: qualified.clone(),
                            source: ToolSource::Mcp,
                            server_name: Some(server.clone()),
                            ..tool
                        };
                        routes.insert(
                            qualified,
                            Route::Server {
                                server: server.clone(),
                                tool: bare,
                            },
                        );
                        spec = spec.register(definition);
                    }
                }
                Err(e) => {
                    warn!(
                        agent = %self.agent_label,
                        server = %server,
                        error = %e,
                        "Failed to list tools from server"
                    );
                }
            }
        }

        for provider in &self.providers {
            if !provider.is_available().await {
                debug!(provider = provider.id(), "Provider not available, skipping");
                continue;
            }

            match provider.discover_tools().await {
                Ok(tools) => {
                    for tool in tools {
                        if !self.allows(&tool.name, &tool.name) {
                            continue;
                        }
                        if routes.contains_key(&tool.name) {
                            trace!(
                                tool = %tool.name,
                                provider = provider.id(),
                                "Tool already registered by higher priority source"
                            );
                            continue;
                        }
                        routes.insert(tool.name.clone(), Route::Provider(Arc::clone(provider)));
                        spec = spec.register(tool);
                    }
                }
                Err(e) => {
                    warn!(
                        provider = provider.id(),
                        error = %e,
                        "Failed to discover tools from provider"
                    );
                }
            }
        }

        debug!(agent = %self.agent_label, tools = spec.len(), "Discovered tools");
        Catalog { spec, routes }
    }

    /// All exposed tools, sorted by name.
    pub async fn list_tools(&self) -> Vec<ToolDefinition> {
        let mut tools: Vec<ToolDefinition> = self.catalog().await.spec.all().cloned().collect();
        tools.sort_by(|a, b| a.name.cmp(&b.name));
        tools
    }

    /// Invoke one tool through the hook chain.
    ///
    /// Unknown names and failures come back as error results.
    pub async fn invoke(&self, call: &ToolCall) -> CallToolResult {
        let catalog = self.catalog().await;
        let Some(definition) = catalog.spec.get_resolved(&call.tool_name) else {
            return CallToolResult::failure(
                ErrorKind::UnknownTool,
                format!("Unknown tool: {}", call.tool_name),
            );
        };
        let Some(route) = catalog.routes.get(&definition.name) else {
            return CallToolResult::failure(
                ErrorKind::UnknownTool,
                format!("Unknown tool: {}", call.tool_name),
            );
        };

        if let Some(usage) = &self.usage {
            usage.record_tool_call();
        }

        let invoker = RoutedTool {
            binding: &self.binding,
            route,
            tool_name: &definition.name,
        };
        let mut ctx = ToolHookContext::new(
            self.agent_label.clone(),
            definition.name.clone(),
            definition.source,
            call.correlation_id.clone(),
            &invoker,
        )
        .with_tool_use_id(call.correlation_id.clone());
        if let Some(server) = &definition.server_name {
            ctx = ctx.with_server(server.clone());
        }

        debug!(
            agent = %self.agent_label,
            tool = %definition.name,
            source = %definition.source,
            "Invoking tool"
        );
        match self.hooks.run(&ctx, call.arguments.clone()).await {
            Ok(result) => result,
            Err(e) => {
                warn!(agent = %self.agent_label, tool = %definition.name, error = %e, "Tool invocation failed");
                CallToolResult::failure(ErrorKind::InvocationFailure, format!("Error: {}", e))
            }
        }
    }
}

/// Terminal link of the hook chain for one discovered tool.
struct RoutedTool<'a> {
    binding: &'a Binding,
    route: &'a Route,
    tool_name: &'a str,
}

#[async_trait]
impl ToolInvoker for RoutedTool<'_> {
    async fn invoke(&self, arguments: ToolArguments) -> Result<CallToolResult, InvocationError> {
        match self.route {
            Route::Server { server, tool } => {
                Ok(self.binding.call_tool(server, tool, &arguments).await?)
            }
            Route::Provider(provider) => Ok(provider.execute(self.tool_name, &arguments).await?),
        }
    }
}

#[async_trait]
impl ToolExecutorPort for ToolAggregator {
    async fn available_tools(&self) -> Vec<ToolDefinition> {
        self.list_tools().await
    }

    async fn has_tool(&self, name: &str) -> bool {
        self.catalog().await.spec.get_resolved(name).is_some()
    }

    async fn execute(&self, call: &ToolCall) -> CallToolResult {
        self.invoke(call).await
    }
}
