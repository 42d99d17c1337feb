//! Tool domain value objects: the result of one tool invocation
//!
//! Every invocation, whether it reached the real tool or was answered by a
//! hook or the dispatcher itself, produces a [`CallToolResult`]:
//!
//! ```text
//! { is_error: bool, content: [block, ...] }
//! ```
//!
//! Failures carry an [`ErrorKind`] so callers can tell an unknown tool from
//! a hook rejection without parsing the text.

use serde::{Deserialize, Serialize};

/// A single block of result content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Free-form text
    Text { text: String },
    /// Structured content
    Json { value: serde_json::Value },
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        ContentBlock::Text { text: text.into() }
    }

    pub fn json(value: serde_json::Value) -> Self {
        ContentBlock::Json { value }
    }

    /// Returns the text content if this is a `Text` block.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContentBlock::Text { text } => Some(text),
            ContentBlock::Json { .. } => None,
        }
    }

    /// Render the block as text; structured content becomes JSON.
    pub fn to_text(&self) -> String {
        match self {
            ContentBlock::Text { text } => text.clone(),
            ContentBlock::Json { value } => value.to_string(),
        }
    }
}

/// Why a call ended in an error result.
///
/// | Kind | Produced by |
/// |------|-------------|
/// | `UnknownTool` | Validation: the name is not currently exposed |
/// | `HookRejection` | A hook answered instead of calling the next link |
/// | `InvocationFailure` | The real tool or the child's `generate` failed |
/// | `ReportedError` | The child answered, but flagged its answer as an error |
/// | `Timeout` | The child exceeded its time budget |
/// | `Cancelled` | The enclosing turn was cancelled |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    UnknownTool,
    HookRejection,
    InvocationFailure,
    ReportedError,
    Timeout,
    Cancelled,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::UnknownTool => "unknown_tool",
            ErrorKind::HookRejection => "hook_rejection",
            ErrorKind::InvocationFailure => "invocation_failure",
            ErrorKind::ReportedError => "reported_error",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a tool invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallToolResult {
    /// Whether the call failed
    pub is_error: bool,
    /// Result content
    pub content: Vec<ContentBlock>,
    /// Failure classification, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

impl CallToolResult {
    /// A successful result with a single text block
    pub fn text(text: impl Into<String>) -> Self {
        Self::success(vec![ContentBlock::text(text)])
    }

    /// A successful result with the given blocks
    pub fn success(content: Vec<ContentBlock>) -> Self {
        Self {
            is_error: false,
            content,
            error_kind: None,
        }
    }

    /// An error result with a single text block
    pub fn failure(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            is_error: true,
            content: vec![ContentBlock::text(message)],
            error_kind: Some(kind),
        }
    }

    /// A hook's refusal to run the call
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::failure(ErrorKind::HookRejection, message)
    }

    pub fn is_error(&self) -> bool {
        self.is_error
    }

    /// Force the result into the error state, keeping its content.
    ///
    /// An already-set kind is preserved.
    pub fn mark_error(&mut self, kind: ErrorKind) {
        self.is_error = true;
        self.error_kind.get_or_insert(kind);
    }

    /// Append content blocks to the result.
    pub fn append(&mut self, blocks: impl IntoIterator<Item = ContentBlock>) {
        self.content.extend(blocks);
    }

    /// All blocks rendered as text, one per line.
    pub fn text_content(&self) -> String {
        self.content
            .iter()
            .map(ContentBlock::to_text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}
