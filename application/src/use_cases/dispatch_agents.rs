//! Dispatch Agents use case
//!
//! Runs one turn's batch of agent-tool calls. Each call gets its own
//! single-use [`AgentInstance`] spawned from the named template, so calls
//! to the same agent run concurrently without sharing mutable state.
//!
//! ```text
//! calls ──> validate ──┬── unknown names ──────────────────────────┐
//!                      └── valid ──> spawn_and_run (JoinSet) ──────┤
//!                                     per call:                    │
//!                                     permits → spawn → hooks →    │
//!                                     run → shutdown (always)      │
//!                                                                  v
//!                                                      finalize (request order)
//! ```
//!
//! A single call's failure (backend error, hook error, timeout, panic)
//! becomes an error result for that call only; the rest of the batch is
//! unaffected.

use crate::agent::registry::TemplateRegistry;
use crate::agent::template::{AgentTemplate, SpawnOptions};
use crate::agent::instance::AgentInstance;
use crate::config::DispatchParams;
use crate::hooks::{HookChain, ToolHookContext};
use crate::ports::dispatch_logger::{DispatchEvent, DispatchLogger, NoDispatchLogger};
use crate::ports::progress::{DispatchProgressNotifier, NoDispatchProgress};
use relay_domain::dispatch;
use relay_domain::{
    CallToolResult, ErrorKind, InstanceIndex, RequestedCall, ToolCall, ToolCallDescriptor,
    ToolCallOutcome, ToolDefinition, ToolSource, Usage, ValidatedBatch,
};
use serde_json::json;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Errors that abort a whole batch
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("Dispatch cancelled")]
    Cancelled,

    #[error("Agent registry has been shut down")]
    RegistryShutDown,
}

/// The agent issuing a batch of calls.
///
/// Its hook chain wraps every agent call of the batch, with
/// `tool_source = agent` and `agent_name` set to the caller.
#[derive(Debug, Clone)]
pub struct CallerContext {
    pub agent_name: String,
    pub hooks: HookChain,
}

impl CallerContext {
    pub fn new(agent_name: impl Into<String>) -> Self {
        Self {
            agent_name: agent_name.into(),
            hooks: HookChain::empty(),
        }
    }

    pub fn with_hooks(mut self, hooks: HookChain) -> Self {
        self.hooks = hooks;
        self
    }
}

/// A valid call paired with the template and index it will run under.
struct DispatchUnit {
    descriptor: ToolCallDescriptor,
    template: Arc<AgentTemplate>,
    index: InstanceIndex,
}

/// What is needed to report a call whose task never returned.
struct UnitMeta {
    correlation_id: String,
    tool_name: String,
    label: String,
}

/// State shared by every task of one batch.
struct UnitRunner {
    caller: CallerContext,
    options: SpawnOptions,
    child_timeout: Option<Duration>,
    global_limiter: Option<Arc<Semaphore>>,
    logger: Arc<dyn DispatchLogger>,
    progress: Arc<dyn DispatchProgressNotifier>,
    cancel: CancellationToken,
}

/// Use case for dispatching a batch of agent-tool calls
pub struct AgentDispatcher {
    registry: Arc<TemplateRegistry>,
    params: DispatchParams,
    global_limiter: Option<Arc<Semaphore>>,
    logger: Arc<dyn DispatchLogger>,
    progress: Arc<dyn DispatchProgressNotifier>,
}

impl AgentDispatcher {
    pub fn new(registry: Arc<TemplateRegistry>) -> Self {
        Self {
            registry,
            params: DispatchParams::default(),
            global_limiter: None,
            logger: Arc::new(NoDispatchLogger),
            progress: Arc::new(NoDispatchProgress),
        }
    }

    // ==================== Builder Methods ====================

    pub fn with_params(mut self, params: DispatchParams) -> Self {
        self.global_limiter = params
            .max_parallelism
            .map(|max| Arc::new(Semaphore::new(max)));
        self.params = params;
        self
    }

    pub fn with_logger(mut self, logger: Arc<dyn DispatchLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn DispatchProgressNotifier>) -> Self {
        self.progress = progress;
        self
    }

    // ==================== Accessors ====================

    pub fn registry(&self) -> &Arc<TemplateRegistry> {
        &self.registry
    }

    pub fn params(&self) -> &DispatchParams {
        &self.params
    }

    /// Tool definitions to expose to the parent LLM for this turn
    pub fn tool_definitions(&self) -> Vec<ToolDefinition> {
        self.registry.tool_definitions()
    }

    // ==================== Phases ====================

    /// Split a batch into runnable calls and immediate `UnknownTool` errors.
    ///
    /// Nothing is spawned for a rejected call.
    pub fn validate(&self, calls: Vec<ToolCall>) -> ValidatedBatch {
        dispatch::validate(calls, |name| self.registry.contains(name))
    }

    /// Run every valid call in its own instance, concurrently.
    ///
    /// Instances of the same template are numbered 1, 2, ... in request
    /// order. Outcomes come back in completion order.
    pub async fn spawn_and_run(
        &self,
        valid: Vec<ToolCallDescriptor>,
        caller: &CallerContext,
        cancel: &CancellationToken,
    ) -> Vec<ToolCallOutcome> {
        let mut outcomes = Vec::with_capacity(valid.len());
        let mut units = Vec::with_capacity(valid.len());
        let mut next_index: HashMap<String, InstanceIndex> = HashMap::new();

        for mut descriptor in valid {
            let Some(template) = self.registry.resolve(&descriptor.tool_name).cloned() else {
                let result = dispatch::unknown_tool_result(&descriptor.tool_name);
                descriptor.mark_rejected(result.text_content());
                outcomes.push(ToolCallOutcome::for_descriptor(&descriptor, result));
                continue;
            };
            let slot = next_index
                .entry(template.name().to_string())
                .or_insert_with(InstanceIndex::first);
            let index = *slot;
            *slot = index.next();
            units.push(DispatchUnit {
                descriptor,
                template,
                index,
            });
        }

        let runner = Arc::new(UnitRunner {
            caller: caller.clone(),
            options: SpawnOptions {
                history: self.params.history,
                suppress_display: self.params.suppress_child_display,
            },
            child_timeout: self.params.child_timeout,
            global_limiter: self.global_limiter.clone(),
            logger: Arc::clone(&self.logger),
            progress: Arc::clone(&self.progress),
            cancel: cancel.clone(),
        });

        let mut pending: BTreeMap<usize, UnitMeta> = BTreeMap::new();
        let mut join_set = JoinSet::new();
        for unit in units {
            pending.insert(
                unit.descriptor.position,
                UnitMeta {
                    correlation_id: unit.descriptor.correlation_id.clone(),
                    tool_name: unit.descriptor.tool_name.clone(),
                    label: unit.template.name().instance_label(unit.index),
                },
            );
            let runner = Arc::clone(&runner);
            join_set.spawn(async move { runner.run(unit).await });
        }

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(outcome) => {
                    pending.remove(&outcome.position);
                    outcomes.push(outcome);
                }
                Err(e) => warn!("Instance task failed: {}", e),
            }
        }

        // Tasks that panicked: the instance's Drop has already cleaned up.
        for (position, meta) in pending {
            let result = CallToolResult::failure(
                ErrorKind::InvocationFailure,
                format!("Error: {} crashed before producing a result", meta.label),
            );
            self.logger.log(DispatchEvent::new(
                "instance_completed",
                json!({
                    "instance": meta.label,
                    "correlation_id": meta.correlation_id,
                    "status": "error",
                    "error_kind": ErrorKind::InvocationFailure.as_str(),
                }),
            ));
            self.progress
                .on_instance_complete(&meta.label, &meta.correlation_id, false, &Usage::default());
            outcomes.push(ToolCallOutcome {
                position,
                correlation_id: meta.correlation_id,
                tool_name: meta.tool_name,
                result,
            });
        }

        outcomes
    }

    /// Merge outcomes back into request order, one per requested call.
    pub fn finalize(
        &self,
        requested: &[RequestedCall],
        outcomes: Vec<ToolCallOutcome>,
    ) -> Vec<ToolCallOutcome> {
        dispatch::finalize(requested, outcomes)
    }

    // ==================== Entry Points ====================

    /// Dispatch a batch to completion.
    pub async fn dispatch(
        &self,
        calls: Vec<ToolCall>,
        caller: &CallerContext,
    ) -> Result<Vec<ToolCallOutcome>, DispatchError> {
        self.dispatch_cancellable(calls, caller, &CancellationToken::new())
            .await
    }

    /// Dispatch a batch, aborting when `cancel` fires.
    ///
    /// On cancellation every spawned instance is still shut down (leases
    /// released, partial usage merged) before `Err(Cancelled)` is returned.
    pub async fn dispatch_cancellable(
        &self,
        calls: Vec<ToolCall>,
        caller: &CallerContext,
        cancel: &CancellationToken,
    ) -> Result<Vec<ToolCallOutcome>, DispatchError> {
        if self.registry.is_shut_down() {
            return Err(DispatchError::RegistryShutDown);
        }

        let batch = self.validate(calls);
        let total = batch.total();
        let valid = batch.valid.len();

        info!(
            caller = %caller.agent_name,
            total,
            valid,
            "Dispatching agent calls"
        );
        self.logger.log(DispatchEvent::new(
            "batch_started",
            json!({
                "caller": caller.agent_name,
                "total": total,
                "valid": valid,
                "rejected": batch
                    .rejected
                    .iter()
                    .map(|o| json!({ "id": o.correlation_id, "name": o.tool_name }))
                    .collect::<Vec<_>>(),
            }),
        ));
        self.progress.on_batch_start(total, valid);

        for rejected in &batch.rejected {
            warn!(tool = %rejected.tool_name, id = %rejected.correlation_id, "Unknown agent-tool");
        }

        let mut outcomes = batch.rejected;
        outcomes.extend(self.spawn_and_run(batch.valid, caller, cancel).await);
        let ordered = self.finalize(&batch.requested, outcomes);

        let errors = ordered.iter().filter(|o| o.result.is_error()).count();
        self.logger.log(DispatchEvent::new(
            "batch_finished",
            json!({
                "caller": caller.agent_name,
                "total": total,
                "errors": errors,
                "cancelled": cancel.is_cancelled(),
            }),
        ));
        self.progress.on_batch_complete(&ordered);

        if cancel.is_cancelled() {
            info!(caller = %caller.agent_name, "Dispatch cancelled");
            return Err(DispatchError::Cancelled);
        }

        info!(total, errors, "Agent calls finished");
        Ok(ordered)
    }
}

impl UnitRunner {
    /// Run one call start to finish. Never fails: every failure is a result.
    async fn run(&self, unit: DispatchUnit) -> ToolCallOutcome {
        let DispatchUnit {
            mut descriptor,
            template,
            index,
        } = unit;
        let label = template.name().instance_label(index);

        let permits = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            permits = self.acquire(&template) => Some(permits),
        };
        let Some(_permits) = permits else {
            let result = cancelled_result(&label);
            descriptor.mark_rejected(result.text_content());
            self.progress.on_instance_complete(
                &label,
                &descriptor.correlation_id,
                false,
                &Usage::default(),
            );
            return ToolCallOutcome::for_descriptor(&descriptor, result);
        };

        let options = SpawnOptions {
            history: template.config().history.unwrap_or(self.options.history),
            ..self.options
        };
        let mut instance = template.spawn(index, options);
        descriptor.mark_running();

        self.logger.log(DispatchEvent::new(
            "instance_spawned",
            json!({
                "instance": label,
                "correlation_id": descriptor.correlation_id,
                "history": options.history.as_str(),
            }),
        ));
        self.progress
            .on_instance_start(&label, &descriptor.correlation_id);

        let result = self.invoke(&instance, &descriptor).await;

        let usage = match instance.shutdown() {
            Ok(usage) => usage.unwrap_or_default(),
            Err(e) => {
                warn!(instance = %label, error = %e, "Instance cleanup failed");
                self.logger.log(DispatchEvent::new(
                    "instance_cleanup_failed",
                    json!({ "instance": label, "error": e.to_string() }),
                ));
                instance.usage()
            }
        };
        drop(instance);

        descriptor.complete(&result);
        self.logger.log(DispatchEvent::new(
            "instance_completed",
            json!({
                "instance": label,
                "correlation_id": descriptor.correlation_id,
                "status": descriptor.status.as_str(),
                "error_kind": result.error_kind.map(|k| k.as_str()),
                "duration_ms": descriptor.status.duration_ms(),
                "usage": usage,
            }),
        ));
        self.progress.on_instance_complete(
            &label,
            &descriptor.correlation_id,
            !result.is_error(),
            &usage,
        );
        debug!(instance = %label, is_error = result.is_error(), "Instance finished");

        ToolCallOutcome::for_descriptor(&descriptor, result)
    }

    /// Template permit first, then the global one. A call queued behind its
    /// own template's cap holds no global slot while it waits.
    async fn acquire(&self, template: &AgentTemplate) -> Vec<OwnedSemaphorePermit> {
        let mut permits = Vec::with_capacity(2);
        for limiter in [template.limiter(), self.global_limiter.clone()]
            .into_iter()
            .flatten()
        {
            // Semaphores are never closed, so acquisition only fails if they were.
            if let Ok(permit) = limiter.acquire_owned().await {
                permits.push(permit);
            }
        }
        permits
    }

    /// Run the instance through the caller's hook chain, bounded by the
    /// timeout and the cancellation token.
    async fn invoke(&self, instance: &AgentInstance, descriptor: &ToolCallDescriptor) -> CallToolResult {
        let label = instance.label();
        let ctx = ToolHookContext::new(
            self.caller.agent_name.clone(),
            descriptor.tool_name.clone(),
            ToolSource::Agent,
            descriptor.correlation_id.clone(),
            instance,
        )
        .with_tool_use_id(descriptor.correlation_id.clone());

        let invocation = self.caller.hooks.run(&ctx, descriptor.arguments.clone());
        let bounded = async {
            match self.child_timeout {
                Some(limit) => tokio::time::timeout(limit, invocation)
                    .await
                    .map_err(|_| limit),
                None => Ok(invocation.await),
            }
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                info!(instance = %label, "Instance cancelled");
                cancelled_result(label)
            }
            outcome = bounded => match outcome {
                Ok(Ok(result)) => result,
                Ok(Err(e)) => {
                    warn!(instance = %label, error = %e, "Instance invocation failed");
                    CallToolResult::failure(ErrorKind::InvocationFailure, format!("Error: {}", e))
                }
                Err(limit) => {
                    warn!(instance = %label, timeout_secs = limit.as_secs(), "Instance timed out");
                    CallToolResult::failure(
                        ErrorKind::Timeout,
                        format!("Error: {} timed out after {}s", label, limit.as_secs()),
                    )
                }
            },
        }
    }
}

fn cancelled_result(label: &str) -> CallToolResult {
    CallToolResult::failure(ErrorKind::Cancelled, format!("Error: {} was cancelled", label))
}
