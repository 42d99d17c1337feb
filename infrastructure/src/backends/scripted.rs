//! Deterministic backend for local runs and tests
//!
//! [`ScriptedBackend`] does not talk to a model. It answers every input
//! with `"<label>: <input>"`, unless the input is a JSON tool directive:
//!
//! ```json
//! { "tool": "workspace__shell.execute", "arguments": { "command": "ls" } }
//! ```
//!
//! A directive makes the agent call that tool through its own tool set
//! (so its hooks apply) and answer with the tool's text. A failed tool call
//! is reported on the error channel of the response.

use async_trait::async_trait;
use relay_application::{AgentBackend, GatewayError, GenerateRequest};
use relay_domain::{AgentResponse, ToolArguments, ToolCall, Usage};
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ToolDirective {
    tool: String,
    #[serde(default)]
    arguments: ToolArguments,
}

/// Echoing backend that can be scripted to call tools
#[derive(Debug, Clone, Default)]
pub struct ScriptedBackend;

impl ScriptedBackend {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AgentBackend for ScriptedBackend {
    async fn generate(&self, request: GenerateRequest<'_>) -> Result<AgentResponse, GatewayError> {
        let Ok(directive) = serde_json::from_str::<ToolDirective>(request.input) else {
            let answer = format!("{}: {}", request.label, request.input);
            request
                .usage
                .record(&Usage::new(request.input.len() as u64, answer.len() as u64));
            return Ok(AgentResponse::text(answer));
        };

        debug!(instance = request.label, tool = %directive.tool, "Scripted tool call");
        let call = ToolCall::new(format!("{}-1", request.label), directive.tool.as_str())
            .with_arguments(directive.arguments);
        let result = request.tools.execute(&call).await;

        let answer = format!("{}: {}", request.label, result.text_content());
        request
            .usage
            .record(&Usage::new(request.input.len() as u64, answer.len() as u64));

        let response = AgentResponse::text(answer);
        Ok(if result.is_error() {
            response.with_error(format!("{} failed: {}", directive.tool, result.text_content()))
        } else {
            response
        })
    }
}
