//! Structured response of a child agent's `generate` call.
//!
//! Besides its main content, a response may carry named side channels.
//! The [`ERROR_CHANNEL`] is how a child reports that its answer is an error
//! even though generation itself succeeded (e.g. the model refused, a
//! provider returned an error payload). The dispatcher appends that channel
//! to the result and flags it as an error.

use crate::tool::value_objects::{CallToolResult, ContentBlock, ErrorKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Channel name that marks a response as carrying an error.
pub const ERROR_CHANNEL: &str = "relay-error";

/// What a child agent produced for one input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentResponse {
    /// Main content of the answer
    pub content: Vec<ContentBlock>,
    /// Named side channels
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub channels: BTreeMap<String, Vec<ContentBlock>>,
}

impl AgentResponse {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::text(text)],
            channels: BTreeMap::new(),
        }
    }

    pub fn with_channel(mut self, name: impl Into<String>, blocks: Vec<ContentBlock>) -> Self {
        self.channels.entry(name.into()).or_default().extend(blocks);
        self
    }

    /// Attach an error report on the [`ERROR_CHANNEL`].
    pub fn with_error(self, message: impl Into<String>) -> Self {
        self.with_channel(ERROR_CHANNEL, vec![ContentBlock::text(message)])
    }

    /// Content of the error channel, if it carries anything.
    pub fn error_blocks(&self) -> Option<&[ContentBlock]> {
        self.channels
            .get(ERROR_CHANNEL)
            .filter(|blocks| !blocks.is_empty())
            .map(|blocks| blocks.as_slice())
    }

    /// Concatenate all text blocks of the main content.
    pub fn text_content(&self) -> String {
        self.content
            .iter()
            .filter_map(ContentBlock::as_text)
            .collect::<Vec<_>>()
            .join("")
    }

    /// Convert into the result returned to the parent.
    ///
    /// Error-channel content is appended and forces `is_error`.
    pub fn into_tool_result(self) -> CallToolResult {
        let error_blocks = self.error_blocks().map(|b| b.to_vec());
        let mut result = CallToolResult::success(self.content);
        if let Some(blocks) = error_blocks {
            result.append(blocks);
            result.mark_error(ErrorKind::ReportedError);
        }
        result
    }
}
