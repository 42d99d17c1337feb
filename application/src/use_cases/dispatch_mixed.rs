//! Mixed-batch dispatch.
//!
//! A parent turn may request agent tools and ordinary tools together.
//! Agent calls go through [`AgentDispatcher`]; everything else goes to the
//! parent's own [`ToolExecutorPort`]. Both halves run concurrently and the
//! results are merged back into request order.

use super::dispatch_agents::{AgentDispatcher, CallerContext, DispatchError};
use crate::ports::tool_executor::ToolExecutorPort;
use futures::future::join_all;
use relay_domain::agent::is_agent_tool_name;
use relay_domain::{
    CallToolResult, ErrorKind, RequestedCall, ToolCall, ToolCallOutcome, ToolDefinition,
};
use relay_domain::dispatch;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Dispatches a batch that mixes agent-tool and ordinary tool calls.
pub struct MixedDispatcher {
    agents: AgentDispatcher,
    tools: Arc<dyn ToolExecutorPort>,
}

impl MixedDispatcher {
    pub fn new(agents: AgentDispatcher, tools: Arc<dyn ToolExecutorPort>) -> Self {
        Self { agents, tools }
    }

    pub fn agents(&self) -> &AgentDispatcher {
        &self.agents
    }

    /// Every tool the parent may call this turn: its own, then the agents.
    pub async fn tool_definitions(&self) -> Vec<ToolDefinition> {
        let mut definitions = self.tools.available_tools().await;
        definitions.extend(self.agents.tool_definitions());
        definitions
    }

    fn is_agent_call(&self, tool_name: &str) -> bool {
        is_agent_tool_name(tool_name) || self.agents.registry().contains(tool_name)
    }

    pub async fn dispatch(
        &self,
        calls: Vec<ToolCall>,
        caller: &CallerContext,
        cancel: &CancellationToken,
    ) -> Result<Vec<ToolCallOutcome>, DispatchError> {
        let requested: Vec<RequestedCall> = calls.iter().map(RequestedCall::from).collect();
        let (agent_calls, tool_calls): (Vec<_>, Vec<_>) = calls
            .into_iter()
            .enumerate()
            .partition(|(_, call)| self.is_agent_call(&call.tool_name));

        debug!(
            agents = agent_calls.len(),
            tools = tool_calls.len(),
            "Splitting mixed batch"
        );

        let (agent_positions, agent_calls): (Vec<usize>, Vec<ToolCall>) =
            agent_calls.into_iter().unzip();

        let agent_half = async {
            if agent_calls.is_empty() {
                return Ok::<_, DispatchError>(Vec::new());
            }
            let outcomes = self
                .agents
                .dispatch_cancellable(agent_calls, caller, cancel)
                .await?;
            // Sub-batch positions map back to the turn's positions.
            Ok(outcomes
                .into_iter()
                .map(|mut outcome| {
                    outcome.position = agent_positions[outcome.position];
                    outcome
                })
                .collect::<Vec<_>>())
        };

        let tool_half = async {
            let runs = tool_calls.iter().map(|(position, call)| async move {
                ToolCallOutcome {
                    position: *position,
                    correlation_id: call.correlation_id.clone(),
                    tool_name: call.tool_name.clone(),
                    result: self.tools.execute(call).await,
                }
            });
            let outcomes: Vec<ToolCallOutcome> = tokio::select! {
                biased;
                _ = cancel.cancelled() => tool_calls
                    .iter()
                    .map(|(position, call)| ToolCallOutcome {
                        position: *position,
                        correlation_id: call.correlation_id.clone(),
                        tool_name: call.tool_name.clone(),
                        result: CallToolResult::failure(
                            ErrorKind::Cancelled,
                            format!("Error: {} was cancelled", call.tool_name),
                        ),
                    })
                    .collect(),
                outcomes = join_all(runs) => outcomes,
            };
            outcomes
        };

        let (agent_outcomes, tool_outcomes) = tokio::join!(agent_half, tool_half);
        let mut outcomes = agent_outcomes?;
        if cancel.is_cancelled() {
            return Err(DispatchError::Cancelled);
        }

        outcomes.extend(tool_outcomes);
        Ok(dispatch::finalize(&requested, outcomes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::registry::TemplateRegistry;
    use crate::hooks::HookChain;
    use crate::test_support::{CountingProvider, DenyHook, ScriptedBackend, template};
    use crate::tools::aggregator::ToolAggregator;
    use crate::tools::connections::ConnectionManager;
    use crate::ports::connection_pool::NoConnections;

    fn parent_tools(provider: Arc<CountingProvider>) -> Arc<ToolAggregator> {
        Arc::new(
            ToolAggregator::owner("parent", ConnectionManager::new(Arc::new(NoConnections)))
                .with_provider(provider)
                .with_hooks(HookChain::new(vec![Arc::new(DenyHook::new(["shell.execute"]))])),
        )
    }

    fn dispatcher(provider: Arc<CountingProvider>) -> MixedDispatcher {
        let mut registry = TemplateRegistry::new();
        registry
            .register(template("Summarizer", ScriptedBackend::echo()))
            .unwrap();
        MixedDispatcher::new(AgentDispatcher::new(Arc::new(registry)), parent_tools(provider))
    }

    #[tokio::test]
    async fn test_mixed_batch_keeps_request_order() {
        let provider = Arc::new(CountingProvider::new(["clock.now"]));
        let mixed = dispatcher(provider.clone());

        let outcomes = mixed
            .dispatch(
                vec![
                    ToolCall::new("t1", "clock.now"),
                    ToolCall::new("a1", "agent__Summarizer").with_arg("text", "doc A"),
                    ToolCall::new("t2", "clock.now"),
                    ToolCall::new("a2", "agent__Summarizer").with_arg("text", "doc B"),
                ],
                &CallerContext::new("parent"),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        let ids: Vec<&str> = outcomes.iter().map(|o| o.correlation_id.as_str()).collect();
        assert_eq!(ids, vec!["t1", "a1", "t2", "a2"]);
        assert_eq!(outcomes[0].result.text_content(), "ran clock.now");
        assert_eq!(outcomes[1].result.text_content(), "Summarizer[1]: doc A");
        assert_eq!(outcomes[3].result.text_content(), "Summarizer[2]: doc B");
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_safety_hook_blocks_parent_tool() {
        let provider = Arc::new(CountingProvider::new(["shell.execute"]));
        let mixed = dispatcher(provider.clone());

        let outcomes = mixed
            .dispatch(
                vec![ToolCall::new("t1", "shell.execute").with_arg("command", "rm -rf /")],
                &CallerContext::new("parent"),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert!(outcomes[0].result.is_error());
        assert_eq!(outcomes[0].result.text_content(), "blocked");
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_unknown_agent_prefix_goes_to_agent_dispatcher() {
        let mixed = dispatcher(Arc::new(CountingProvider::new([])));

        let outcomes = mixed
            .dispatch(
                vec![ToolCall::new("a1", "agent__Ghost")],
                &CallerContext::new("parent"),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(outcomes[0].result.error_kind, Some(ErrorKind::UnknownTool));
        assert_eq!(outcomes[0].result.text_content(), "Unknown agent-tool: agent__Ghost");
    }

    #[tokio::test]
    async fn test_tool_definitions_include_agents() {
        let mixed = dispatcher(Arc::new(CountingProvider::new(["clock.now"])));
        let names: Vec<String> = mixed
            .tool_definitions()
            .await
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(names, vec!["clock.now", "agent__Summarizer"]);
    }
}
