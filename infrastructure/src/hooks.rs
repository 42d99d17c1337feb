//! Built-in tool hooks, registered under the `relay.hooks` module.
//!
//! | Spec                         | Options                                  |
//! |------------------------------|------------------------------------------|
//! | `relay.hooks:safety_guard`   | `deny = [tool, ...]`, `message = "..."`  |
//! | `relay.hooks:audit_log`      | none                                     |
//! | `relay.hooks:redact`         | `patterns = [...]`, `replacement = "..."`|

use async_trait::async_trait;
use relay_application::{HookLoadError, HookRegistry, InvocationError, Next, ToolHook, ToolHookContext};
use relay_domain::{CallToolResult, ContentBlock, ToolArguments};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

pub const BUILTIN_MODULE: &str = "relay.hooks";

/// Registry holding every built-in hook.
pub fn builtin_hooks() -> HookRegistry {
    let mut registry = HookRegistry::new();
    registry.register(BUILTIN_MODULE, "safety_guard", |options| {
        let options: SafetyGuardOptions = parse_options("safety_guard", options)?;
        let hook: Arc<dyn ToolHook> = Arc::new(SafetyGuard::new(options.deny).with_message(options.message));
        Ok(hook)
    });
    registry.register(BUILTIN_MODULE, "audit_log", |_options| {
        let hook: Arc<dyn ToolHook> = Arc::new(AuditLog);
        Ok(hook)
    });
    registry.register(BUILTIN_MODULE, "redact", |options| {
        let options: RedactOptions = parse_options("redact", options)?;
        if options.patterns.iter().any(String::is_empty) {
            return Err(HookLoadError::InvalidOptions {
                spec: format!("{}:redact", BUILTIN_MODULE),
                message: "patterns must not be empty strings".to_string(),
            });
        }
        let hook: Arc<dyn ToolHook> = Arc::new(Redact::new(options.patterns, options.replacement));
        Ok(hook)
    });
    registry
}

/// Missing options (`null`) mean "all defaults".
fn parse_options<T: DeserializeOwned + Default>(function: &str, options: &Value) -> Result<T, HookLoadError> {
    if options.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(options.clone()).map_err(|e| HookLoadError::InvalidOptions {
        spec: format!("{}:{}", BUILTIN_MODULE, function),
        message: e.to_string(),
    })
}

// ==================== safety_guard ====================

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct SafetyGuardOptions {
    deny: Vec<String>,
    message: String,
}

impl Default for SafetyGuardOptions {
    fn default() -> Self {
        Self {
            deny: Vec::new(),
            message: "blocked".to_string(),
        }
    }
}

/// Refuses to run denied tools.
///
/// A denied name matches the exposed tool name or, for server tools, the
/// bare name after `<server>__`.
#[derive(Debug, Clone)]
pub struct SafetyGuard {
    deny: Vec<String>,
    message: String,
}

impl SafetyGuard {
    pub fn new(deny: Vec<String>) -> Self {
        Self {
            deny,
            message: "blocked".to_string(),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    fn denies(&self, tool_name: &str) -> bool {
        let bare = tool_name
            .split_once(relay_application::tools::SERVER_TOOL_SEPARATOR)
            .map(|(_, bare)| bare);
        self.deny
            .iter()
            .any(|d| d == tool_name || Some(d.as_str()) == bare)
    }
}

#[async_trait]
impl ToolHook for SafetyGuard {
    fn name(&self) -> &str {
        "safety_guard"
    }

    async fn call(
        &self,
        ctx: &ToolHookContext<'_>,
        arguments: ToolArguments,
        next: Next<'_>,
    ) -> Result<CallToolResult, InvocationError> {
        if self.denies(&ctx.tool_name) {
            info!(agent = %ctx.agent_name, tool = %ctx.tool_name, "Blocked tool call");
            return Ok(CallToolResult::rejected(self.message.clone()));
        }
        next.run(arguments).await
    }
}

// ==================== audit_log ====================

/// Logs every call with its outcome and duration.
#[derive(Debug, Clone, Copy)]
pub struct AuditLog;

#[async_trait]
impl ToolHook for AuditLog {
    fn name(&self) -> &str {
        "audit_log"
    }

    async fn call(
        &self,
        ctx: &ToolHookContext<'_>,
        arguments: ToolArguments,
        next: Next<'_>,
    ) -> Result<CallToolResult, InvocationError> {
        info!(
            agent = %ctx.agent_name,
            tool = %ctx.tool_name,
            source = %ctx.tool_source,
            correlation_id = %ctx.correlation_id,
            "Tool call started"
        );
        let start = Instant::now();
        let result = next.run(arguments).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        match &result {
            Ok(r) => info!(
                agent = %ctx.agent_name,
                tool = %ctx.tool_name,
                duration_ms,
                is_error = r.is_error(),
                "Tool call finished"
            ),
            Err(e) => info!(
                agent = %ctx.agent_name,
                tool = %ctx.tool_name,
                duration_ms,
                error = %e,
                "Tool call failed"
            ),
        }
        result
    }
}

// ==================== redact ====================

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RedactOptions {
    patterns: Vec<String>,
    replacement: String,
}

impl Default for RedactOptions {
    fn default() -> Self {
        Self {
            patterns: Vec::new(),
            replacement: "[REDACTED]".to_string(),
        }
    }
}

/// Replaces configured substrings in text results.
#[derive(Debug, Clone)]
pub struct Redact {
    patterns: Vec<String>,
    replacement: String,
}

impl Redact {
    pub fn new(patterns: Vec<String>, replacement: impl Into<String>) -> Self {
        Self {
            patterns,
            replacement: replacement.into(),
        }
    }

    fn scrub(&self, text: &str) -> String {
        self.patterns
            .iter()
            .fold(text.to_string(), |acc, p| acc.replace(p.as_str(), &self.replacement))
    }
}

#[async_trait]
impl ToolHook for Redact {
    fn name(&self) -> &str {
        "redact"
    }

    async fn call(
        &self,
        _ctx: &ToolHookContext<'_>,
        arguments: ToolArguments,
        next: Next<'_>,
    ) -> Result<CallToolResult, InvocationError> {
        let mut result = next.run(arguments).await?;
        for block in &mut result.content {
            if let ContentBlock::Text { text } = block {
                *text = self.scrub(text);
            }
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_application::HookRef;
    use relay_domain::{ErrorKind, ToolSource};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Answer {
        text: &'static str,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl relay_application::ToolInvoker for Answer {
        async fn invoke(&self, _arguments: ToolArguments) -> Result<CallToolResult, InvocationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(CallToolResult::text(self.text))
        }
    }

    fn answer(text: &'static str) -> Answer {
        Answer {
            text,
            calls: AtomicUsize::new(0),
        }
    }

    async fn run(refs: &[HookRef], tool_name: &str, tool: &Answer) -> CallToolResult {
        let chain = builtin_hooks().build_chain(refs).unwrap();
        let ctx = ToolHookContext::new("Operator[1]", tool_name, ToolSource::Runtime, "c1", tool);
        chain.run(&ctx, ToolArguments::new()).await.unwrap()
    }

    #[tokio::test]
    async fn test_safety_guard_blocks_denied_tool() {
        let tool = answer("rm'd");
        let result = run(
            &[HookRef::with_options(
                "relay.hooks:safety_guard",
                json!({ "deny": ["shell.execute"] }),
            )],
            "shell.execute",
            &tool,
        )
        .await;

        assert!(result.is_error());
        assert_eq!(result.error_kind, Some(ErrorKind::HookRejection));
        assert_eq!(result.text_content(), "blocked");
        assert_eq!(tool.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_safety_guard_matches_server_tools_by_bare_name() {
        let tool = answer("ran");
        let refs = [HookRef::with_options(
            "relay.hooks:safety_guard",
            json!({ "deny": ["shell.execute"], "message": "not here" }),
        )];

        let blocked = run(&refs, "workspace__shell.execute", &tool).await;
        assert_eq!(blocked.text_content(), "not here");

        let allowed = run(&refs, "workspace__filesystem.read_text", &tool).await;
        assert_eq!(allowed.text_content(), "ran");
        assert_eq!(tool.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_redact_scrubs_text_after_call() {
        let tool = answer("token=abc123 user=alice");
        let result = run(
            &[
                HookRef::spec("relay.hooks:audit_log"),
                HookRef::with_options(
                    "relay.hooks:redact",
                    json!({ "patterns": ["abc123", "alice"] }),
                ),
            ],
            "filesystem.read_text",
            &tool,
        )
        .await;

        assert_eq!(result.text_content(), "token=[REDACTED] user=[REDACTED]");
    }

    fn load_err(registry: &HookRegistry, target: &str, options: &Value) -> HookLoadError {
        match registry.load(target, options) {
            Err(e) => e,
            Ok(_) => panic!("{target} should not load with {options}"),
        }
    }

    #[test]
    fn test_invalid_options_are_reported() {
        let registry = builtin_hooks();
        let err = load_err(
            &registry,
            "relay.hooks:safety_guard",
            &json!({ "deny": "shell.execute" }),
        );
        assert!(matches!(err, HookLoadError::InvalidOptions { .. }));

        let err = load_err(&registry, "relay.hooks:redact", &json!({ "patterns": [""] }));
        assert!(matches!(err, HookLoadError::InvalidOptions { .. }));

        let err = load_err(&registry, "relay.hooks:teleport", &Value::Null);
        assert!(matches!(err, HookLoadError::FunctionNotFound { .. }));
    }
}
