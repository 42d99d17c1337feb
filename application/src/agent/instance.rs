//! Single-use agent instances.
//!
//! An [`AgentInstance`] (a "clone" of its template) exists for exactly one
//! tool call:
//!
//! ```text
//! spawn ──> run (once) ──> shutdown ──> dropped
//!                    │         ├── release the connection lease
//!                    │         └── merge usage into the template (exactly once)
//!                    └── may be cut short by timeout / cancellation
//! ```
//!
//! `shutdown` is idempotent and also runs from `Drop`, so an instance whose
//! task is aborted or panics still releases its lease and merges whatever
//! usage it recorded.

use super::template::AgentTemplate;
use super::usage_meter::UsageMeter;
use crate::hooks::{InvocationError, ToolInvoker};
use crate::ports::agent_backend::GenerateRequest;
use crate::tools::aggregator::ToolAggregator;
use async_trait::async_trait;
use relay_domain::agent::map_arguments;
use relay_domain::{AgentConfig, CallToolResult, InstanceIndex, Message, ToolArguments, Usage};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::{debug, warn};

/// Failures while tearing an instance down.
///
/// Logged and reported, never allowed to change the call's result.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CleanupError {
    #[error("Usage ledger of agent '{0}' is poisoned")]
    UsageLedgerPoisoned(String),
}

/// An ephemeral agent spawned for one tool call.
pub struct AgentInstance {
    template: Arc<AgentTemplate>,
    index: InstanceIndex,
    label: String,
    config: AgentConfig,
    history: Mutex<Vec<Message>>,
    usage: Arc<UsageMeter>,
    /// Borrowing aggregator; taken on shutdown
    tools: Option<ToolAggregator>,
    shut_down: bool,
}

impl AgentInstance {
    pub(crate) fn new(
        template: Arc<AgentTemplate>,
        index: InstanceIndex,
        label: String,
        config: AgentConfig,
        history: Vec<Message>,
        usage: Arc<UsageMeter>,
        tools: ToolAggregator,
    ) -> Self {
        Self {
            template,
            index,
            label,
            config,
            history: Mutex::new(history),
            usage,
            tools: Some(tools),
            shut_down: false,
        }
    }

    /// Display label, `Name[index]`
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn index(&self) -> InstanceIndex {
        self.index
    }

    pub fn template(&self) -> &Arc<AgentTemplate> {
        &self.template
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn history(&self) -> Vec<Message> {
        self.history
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Usage recorded so far
    pub fn usage(&self) -> Usage {
        self.usage.snapshot()
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    /// Run the instance's single invocation.
    ///
    /// The arguments are mapped to one user-turn input. A response carrying
    /// the error channel becomes an error result; a failing backend is
    /// returned as `Err` for the caller to convert.
    pub async fn run(&self, arguments: &ToolArguments) -> Result<CallToolResult, InvocationError> {
        let tools = self
            .tools
            .as_ref()
            .ok_or_else(|| InvocationError::InstanceShutDown(self.label.clone()))?;
        let input = map_arguments(arguments);
        let history = self.history();

        debug!(instance = %self.label, input_len = input.len(), "Generating response");
        let response = self
            .template
            .backend()
            .generate(GenerateRequest {
                label: &self.label,
                config: &self.config,
                history: &history,
                input: &input,
                tools,
                usage: &self.usage,
            })
            .await?;

        {
            let mut history = self.history.lock().unwrap_or_else(|e| e.into_inner());
            history.push(Message::user(input));
            history.push(Message::assistant(response.text_content()));
        }

        Ok(response.into_tool_result())
    }

    /// Release the lease and merge usage into the template.
    ///
    /// Only the first call does anything; it returns the merged usage.
    /// Later calls return `Ok(None)`.
    pub fn shutdown(&mut self) -> Result<Option<Usage>, CleanupError> {
        if self.shut_down {
            return Ok(None);
        }
        self.shut_down = true;

        // Dropping the borrowing aggregator releases the lease; it never closes.
        drop(self.tools.take());

        let usage = self.usage.snapshot();
        self.template.merge_usage(&usage)?;
        debug!(instance = %self.label, usage = %usage, "Instance shut down");
        Ok(Some(usage))
    }
}

#[async_trait]
impl ToolInvoker for AgentInstance {
    async fn invoke(&self, arguments: ToolArguments) -> Result<CallToolResult, InvocationError> {
        self.run(&arguments).await
    }
}

impl Drop for AgentInstance {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            warn!(instance = %self.label, error = %e, "Instance cleanup failed");
        }
    }
}

impl std::fmt::Debug for AgentInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentInstance")
            .field("label", &self.label)
            .field("shut_down", &self.shut_down)
            .field("usage", &self.usage())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::template::SpawnOptions;
    use crate::test_support::{ScriptedBackend, template};
    use relay_domain::ErrorKind;
    use serde_json::json;

    fn text(input: &str) -> ToolArguments {
        ToolArguments::from([("text".to_string(), json!(input))])
    }

    #[tokio::test]
    async fn test_run_maps_arguments_and_records_history() {
        let template = Arc::new(template("Echo", ScriptedBackend::echo()));
        let mut instance = template.spawn(InstanceIndex::first(), SpawnOptions::default());

        let result = instance.run(&text("hello")).await.unwrap();
        assert_eq!(result.text_content(), "Echo[1]: hello");
        assert_eq!(instance.history().len(), 2);

        let usage = instance.shutdown().unwrap().unwrap();
        assert_eq!(usage.requests, 1);
        assert_eq!(template.usage(), usage);
    }

    #[tokio::test]
    async fn test_error_channel_becomes_reported_error() {
        let template = Arc::new(template(
            "Flaky",
            ScriptedBackend::echo().reporting_error("quota exceeded"),
        ));
        let instance = template.spawn(InstanceIndex::first(), SpawnOptions::default());

        let result = instance.run(&text("go")).await.unwrap();
        assert!(result.is_error());
        assert_eq!(result.error_kind, Some(ErrorKind::ReportedError));
        assert!(result.text_content().ends_with("quota exceeded"));
    }

    #[tokio::test]
    async fn test_backend_failure_is_returned_as_err() {
        let template = Arc::new(template("Broken", ScriptedBackend::failing("model offline")));
        let instance = template.spawn(InstanceIndex::first(), SpawnOptions::default());

        let err = instance.run(&text("go")).await.unwrap_err();
        assert!(err.to_string().contains("model offline"));
    }

    #[tokio::test]
    async fn test_shutdown_is_idempotent() {
        let template = Arc::new(template("Echo", ScriptedBackend::echo()));
        let mut instance = template.spawn(InstanceIndex::first(), SpawnOptions::default());
        instance.run(&text("once")).await.unwrap();

        assert!(instance.shutdown().unwrap().is_some());
        assert!(instance.shutdown().unwrap().is_none());
        drop(instance);

        assert_eq!(template.merged_instances(), 1);
        assert_eq!(template.usage().requests, 1);
        assert_eq!(template.active_leases(), 0);
    }

    #[tokio::test]
    async fn test_drop_without_run_still_cleans_up() {
        let template = Arc::new(template("Echo", ScriptedBackend::echo()));
        let instance = template.spawn(InstanceIndex::first(), SpawnOptions::default());
        assert_eq!(template.active_leases(), 1);

        drop(instance);
        assert_eq!(template.active_leases(), 0);
        assert_eq!(template.merged_instances(), 1);
        assert!(template.usage().is_zero());
    }

    #[tokio::test]
    async fn test_run_after_shutdown_fails() {
        let template = Arc::new(template("Echo", ScriptedBackend::echo()));
        let mut instance = template.spawn(InstanceIndex::first(), SpawnOptions::default());
        instance.shutdown().unwrap();

        let err = instance.run(&text("late")).await.unwrap_err();
        assert!(matches!(err, InvocationError::InstanceShutDown(_)));
    }
}
