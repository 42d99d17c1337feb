//! Local function tools
//!
//! [`FunctionToolProvider`] exposes plain async Rust functions as tools with
//! [`ToolSource::Function`].
//!
//! ```ignore
//! let provider = FunctionToolProvider::new("clock").register(
//!     ToolDefinition::new("clock.now", "Current UTC time", ToolSource::Function),
//!     |_args| async { Ok(CallToolResult::text(chrono::Utc::now().to_rfc3339())) },
//! );
//! ```

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::BoxFuture;
use relay_domain::{
    CallToolResult, ProviderError, ToolArguments, ToolDefinition, ToolProvider, ToolSource,
};
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

type ToolFn =
    Arc<dyn Fn(ToolArguments) -> BoxFuture<'static, Result<CallToolResult, ProviderError>> + Send + Sync>;

struct FunctionTool {
    definition: ToolDefinition,
    run: ToolFn,
}

/// Provider backed by registered async functions
pub struct FunctionToolProvider {
    id: String,
    functions: BTreeMap<String, FunctionTool>,
}

impl FunctionToolProvider {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            functions: BTreeMap::new(),
        }
    }

    /// Register a function under `definition.name`, replacing any previous one.
    pub fn register<F, Fut>(mut self, definition: ToolDefinition, function: F) -> Self
    where
        F: Fn(ToolArguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<CallToolResult, ProviderError>> + Send + 'static,
    {
        let definition = ToolDefinition {
            source: ToolSource::Function,
            ..definition
        };
        let run: ToolFn = Arc::new(move |arguments| function(arguments).boxed());
        self.functions
            .insert(definition.name.clone(), FunctionTool { definition, run });
        self
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

#[async_trait]
impl ToolProvider for FunctionToolProvider {
    fn id(&self) -> &str {
        &self.id
    }

    fn source(&self) -> ToolSource {
        ToolSource::Function
    }

    async fn discover_tools(&self) -> Result<Vec<ToolDefinition>, ProviderError> {
        Ok(self
            .functions
            .values()
            .map(|f| f.definition.clone())
            .collect())
    }

    async fn execute(
        &self,
        tool_name: &str,
        arguments: &ToolArguments,
    ) -> Result<CallToolResult, ProviderError> {
        let function = self
            .functions
            .get(tool_name)
            .ok_or_else(|| ProviderError::ToolNotFound(tool_name.to_string()))?;
        (function.run)(arguments.clone()).await
    }
}

impl std::fmt::Debug for FunctionToolProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionToolProvider")
            .field("id", &self.id)
            .field("functions", &self.functions.keys().collect::<Vec<_>>())
            .finish()
    }
}
