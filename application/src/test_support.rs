//! Test doubles shared by the application layer's unit tests.

use crate::agent::template::AgentTemplate;
use crate::hooks::{InvocationError, Next, ToolHook, ToolHookContext, ToolInvoker};
use crate::ports::agent_backend::{AgentBackend, GatewayError, GenerateRequest};
use crate::ports::connection_pool::{ConnectionError, ConnectionPool};
use crate::ports::dispatch_logger::{DispatchEvent, DispatchLogger};
use crate::ports::progress::DispatchProgressNotifier;
use crate::ports::tool_executor::ToolExecutorPort;
use async_trait::async_trait;
use relay_domain::{
    AgentConfig, AgentName, AgentResponse, CallToolResult, ProviderError, ToolArguments, ToolCall,
    ToolCallOutcome, ToolDefinition, ToolProvider, ToolSource, Usage,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ==================== Agents ====================

/// Template backed by a pool with one `docs` server.
pub fn template(name: &str, backend: ScriptedBackend) -> AgentTemplate {
    template_with_pool(name, backend, Arc::new(CountingPool::new(["docs"])))
}

pub fn template_with_pool(
    name: &str,
    backend: ScriptedBackend,
    pool: Arc<CountingPool>,
) -> AgentTemplate {
    AgentTemplate::new(
        AgentConfig::new(AgentName::new(name).unwrap(), format!("You are {name}")),
        Arc::new(backend),
        pool,
    )
}

#[derive(Clone)]
enum Behaviour {
    Echo,
    Fail(String),
    Panic,
    /// Record usage, then never answer
    Hang,
}

/// Backend that answers `"<label>: <input>"`.
///
/// Usage per call is `Usage::new(input.len(), answer.len())`.
#[derive(Clone)]
pub struct ScriptedBackend {
    behaviour: Behaviour,
    delay: Option<Duration>,
    jitter_ms: u64,
    reported_error: Option<String>,
    tool: Option<String>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedBackend {
    fn with_behaviour(behaviour: Behaviour) -> Self {
        Self {
            behaviour,
            delay: None,
            jitter_ms: 0,
            reported_error: None,
            tool: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn echo() -> Self {
        Self::with_behaviour(Behaviour::Echo)
    }

    pub fn failing(message: &str) -> Self {
        Self::with_behaviour(Behaviour::Fail(message.to_string()))
    }

    pub fn panicking() -> Self {
        Self::with_behaviour(Behaviour::Panic)
    }

    pub fn hanging() -> Self {
        Self::with_behaviour(Behaviour::Hang)
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Sleep a pseudo-random 0..max_ms derived from the input.
    pub fn with_jitter(mut self, max_ms: u64) -> Self {
        self.jitter_ms = max_ms;
        self
    }

    pub fn reporting_error(mut self, message: &str) -> Self {
        self.reported_error = Some(message.to_string());
        self
    }

    /// Call `tool` (with the input as `text`) before answering.
    pub fn calling_tool(mut self, tool: &str) -> Self {
        self.tool = Some(tool.to_string());
        self
    }

    /// Handle to the number of `generate` calls
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }

    fn jitter(&self, input: &str) -> Duration {
        if self.jitter_ms == 0 {
            return Duration::ZERO;
        }
        let seed = input
            .bytes()
            .fold(17u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
        Duration::from_millis(seed % self.jitter_ms)
    }
}

#[async_trait]
impl AgentBackend for ScriptedBackend {
    async fn generate(&self, request: GenerateRequest<'_>) -> Result<AgentResponse, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        tokio::time::sleep(self.jitter(request.input)).await;

        match &self.behaviour {
            Behaviour::Echo => {}
            Behaviour::Fail(message) => return Err(GatewayError::RequestFailed(message.clone())),
            Behaviour::Panic => panic!("scripted backend panic"),
            Behaviour::Hang => {
                request.usage.record(&Usage::new(7, 0));
                std::future::pending::<()>().await;
            }
        }

        let mut response = match &self.tool {
            Some(tool) => {
                let call = ToolCall::new(format!("{}-tool", request.label), tool.as_str())
                    .with_arg("text", request.input);
                let result = request.tools.execute(&call).await;
                let answer = AgentResponse::text(format!("{}: {}", request.label, result.text_content()));
                if result.is_error() {
                    answer.with_channel(relay_domain::agent::ERROR_CHANNEL, result.content)
                } else {
                    answer
                }
            }
            None => AgentResponse::text(format!("{}: {}", request.label, request.input)),
        };
        if let Some(message) = &self.reported_error {
            response = response.with_error(message.clone());
        }

        let answer_len = response.text_content().len() as u64;
        request
            .usage
            .record(&Usage::new(request.input.len() as u64, answer_len));
        Ok(response)
    }
}

// ==================== Tools ====================

/// Pool whose servers each offer one `search` tool answering `"<server>:<tool>"`.
pub struct CountingPool {
    servers: Vec<String>,
    calls: AtomicUsize,
    closes: AtomicUsize,
}

impl CountingPool {
    pub fn new<const N: usize>(servers: [&str; N]) -> Self {
        Self {
            servers: servers.iter().map(|s| s.to_string()).collect(),
            calls: AtomicUsize::new(0),
            closes: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConnectionPool for CountingPool {
    fn server_names(&self) -> Vec<String> {
        self.servers.clone()
    }

    async fn list_tools(&self, server: &str) -> Result<Vec<ToolDefinition>, ConnectionError> {
        if !self.servers.iter().any(|s| s == server) {
            return Err(ConnectionError::ServerNotFound(server.to_string()));
        }
        Ok(vec![ToolDefinition::new("search", "Search", ToolSource::Mcp)])
    }

    async fn call_tool(
        &self,
        server: &str,
        tool: &str,
        _arguments: &ToolArguments,
    ) -> Result<CallToolResult, ConnectionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(CallToolResult::text(format!("{}:{}", server, tool)))
    }

    async fn close(&self) -> Result<(), ConnectionError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Local function provider answering `"ran <tool>"`.
pub struct CountingProvider {
    tools: Vec<String>,
    calls: AtomicUsize,
}

impl CountingProvider {
    pub fn new<const N: usize>(tools: [&str; N]) -> Self {
        Self {
            tools: tools.iter().map(|s| s.to_string()).collect(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ToolProvider for CountingProvider {
    fn id(&self) -> &str {
        "counting"
    }

    fn source(&self) -> ToolSource {
        ToolSource::Function
    }

    async fn discover_tools(&self) -> Result<Vec<ToolDefinition>, ProviderError> {
        Ok(self
            .tools
            .iter()
            .map(|t| ToolDefinition::new(t.clone(), "Counting tool", ToolSource::Function))
            .collect())
    }

    async fn execute(
        &self,
        tool_name: &str,
        _arguments: &ToolArguments,
    ) -> Result<CallToolResult, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(CallToolResult::text(format!("ran {}", tool_name)))
    }
}

/// Terminal invoker that counts calls and remembers the last arguments.
pub struct CountingInvoker {
    answer: String,
    calls: AtomicUsize,
    last_arguments: Mutex<ToolArguments>,
}

impl CountingInvoker {
    pub fn new(answer: &str) -> Self {
        Self {
            answer: answer.to_string(),
            calls: AtomicUsize::new(0),
            last_arguments: Mutex::new(ToolArguments::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_arguments(&self) -> ToolArguments {
        self.last_arguments.lock().unwrap().clone()
    }
}

#[async_trait]
impl ToolInvoker for CountingInvoker {
    async fn invoke(&self, arguments: ToolArguments) -> Result<CallToolResult, InvocationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_arguments.lock().unwrap() = arguments;
        Ok(CallToolResult::text(self.answer.clone()))
    }
}

// ==================== Hooks ====================

/// Appends its name to a shared list, then continues.
pub struct RecordingHook {
    name: &'static str,
    order: Arc<Mutex<Vec<&'static str>>>,
}

impl RecordingHook {
    pub fn new(name: &'static str, order: Arc<Mutex<Vec<&'static str>>>) -> Self {
        Self { name, order }
    }
}

#[async_trait]
impl ToolHook for RecordingHook {
    fn name(&self) -> &str {
        self.name
    }

    async fn call(
        &self,
        _ctx: &ToolHookContext<'_>,
        arguments: ToolArguments,
        next: Next<'_>,
    ) -> Result<CallToolResult, InvocationError> {
        self.order.lock().unwrap().push(self.name);
        next.run(arguments).await
    }
}

/// What a hook saw of one call.
#[derive(Debug, Clone)]
pub struct SeenCall {
    pub agent_name: String,
    pub server_name: Option<String>,
    pub tool_name: String,
    pub tool_source: ToolSource,
    pub correlation_id: String,
}

/// Records every context it sees, then continues.
#[derive(Default)]
pub struct CapturingHook {
    seen: Mutex<Vec<SeenCall>>,
}

impl CapturingHook {
    pub fn seen(&self) -> Vec<SeenCall> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl ToolHook for CapturingHook {
    fn name(&self) -> &str {
        "capture"
    }

    async fn call(
        &self,
        ctx: &ToolHookContext<'_>,
        arguments: ToolArguments,
        next: Next<'_>,
    ) -> Result<CallToolResult, InvocationError> {
        self.seen.lock().unwrap().push(SeenCall {
            agent_name: ctx.agent_name.clone(),
            server_name: ctx.server_name.clone(),
            tool_name: ctx.tool_name.clone(),
            tool_source: ctx.tool_source,
            correlation_id: ctx.correlation_id.clone(),
        });
        next.run(arguments).await
    }
}

/// Answers `blocked` instead of running the listed tools.
pub struct DenyHook {
    denied: Vec<String>,
}

impl DenyHook {
    pub fn new<const N: usize>(denied: [&str; N]) -> Self {
        Self {
            denied: denied.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[async_trait]
impl ToolHook for DenyHook {
    fn name(&self) -> &str {
        "deny"
    }

    async fn call(
        &self,
        ctx: &ToolHookContext<'_>,
        arguments: ToolArguments,
        next: Next<'_>,
    ) -> Result<CallToolResult, InvocationError> {
        if self.denied.iter().any(|d| *d == ctx.tool_name) {
            return Ok(CallToolResult::rejected("blocked"));
        }
        next.run(arguments).await
    }
}

// ==================== Observers ====================

/// Collects progress callbacks.
#[derive(Default)]
pub struct RecordingProgress {
    pub started: Mutex<Vec<String>>,
    pub completed: Mutex<Vec<(String, bool, Usage)>>,
    pub batches: AtomicUsize,
}

impl RecordingProgress {
    /// Sum of the usage reported by completed instances
    pub fn total_usage(&self) -> Usage {
        self.completed.lock().unwrap().iter().map(|(_, _, u)| *u).sum()
    }

    pub fn completed_labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = self
            .completed
            .lock()
            .unwrap()
            .iter()
            .map(|(label, _, _)| label.clone())
            .collect();
        labels.sort();
        labels
    }
}

impl DispatchProgressNotifier for RecordingProgress {
    fn on_batch_start(&self, _total: usize, _valid: usize) {}

    fn on_instance_start(&self, label: &str, _correlation_id: &str) {
        self.started.lock().unwrap().push(label.to_string());
    }

    fn on_instance_complete(&self, label: &str, _correlation_id: &str, success: bool, usage: &Usage) {
        self.completed
            .lock()
            .unwrap()
            .push((label.to_string(), success, *usage));
    }

    fn on_batch_complete(&self, _outcomes: &[ToolCallOutcome]) {
        self.batches.fetch_add(1, Ordering::SeqCst);
    }
}

/// Keeps every logged event in memory.
#[derive(Default)]
pub struct MemoryLogger {
    events: Mutex<Vec<(&'static str, serde_json::Value)>>,
}

impl MemoryLogger {
    pub fn event_types(&self) -> Vec<&'static str> {
        self.events.lock().unwrap().iter().map(|(t, _)| *t).collect()
    }

    pub fn events_of(&self, event_type: &str) -> Vec<serde_json::Value> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|(t, _)| *t == event_type)
            .map(|(_, p)| p.clone())
            .collect()
    }
}

impl DispatchLogger for MemoryLogger {
    fn log(&self, event: DispatchEvent) {
        self.events
            .lock()
            .unwrap()
            .push((event.event_type, event.payload));
    }
}
