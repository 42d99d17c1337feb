//! Agent backend port
//!
//! Defines the interface for the model side of an agent: given the agent's
//! configuration, its history and one input, produce a structured response.
//! How the model is reached (HTTP, local process, a script) is an adapter
//! concern.

use crate::agent::usage_meter::UsageMeter;
use crate::ports::tool_executor::ToolExecutorPort;
use async_trait::async_trait;
use relay_domain::{AgentConfig, AgentResponse, Message};
use thiserror::Error;

/// Errors that can occur while generating a response
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Timeout")]
    Timeout,

    #[error("Other error: {0}")]
    Other(String),
}

/// Everything a backend sees for one `generate` call.
pub struct GenerateRequest<'a> {
    /// Display label of the calling instance (e.g. `Summarizer[2]`)
    pub label: &'a str,
    /// Configuration snapshot of the instance
    pub config: &'a AgentConfig,
    /// History before this input
    pub history: &'a [Message],
    /// The single user-turn input
    pub input: &'a str,
    /// Tools the agent may call while answering
    pub tools: &'a dyn ToolExecutorPort,
    /// Where usage is recorded, as it accrues
    pub usage: &'a UsageMeter,
}

/// Gateway to the model behind an agent
///
/// Implementations record usage into [`GenerateRequest::usage`] as soon as
/// it is known (typically after every model request) so that a call cut
/// short by a timeout or cancellation still accounts for what it consumed.
#[async_trait]
pub trait AgentBackend: Send + Sync {
    /// Produce the agent's response to one input.
    async fn generate(&self, request: GenerateRequest<'_>) -> Result<AgentResponse, GatewayError>;
}
