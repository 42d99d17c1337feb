//! Continuation-passing middleware around a single tool invocation.
//!
//! A hook receives the call's [`ToolHookContext`], the arguments and a
//! [`Next`] continuation. It may:
//!
//! - inspect or rewrite the arguments, then call `next.run(args)`
//! - answer on its own without calling `next` (the real tool never runs)
//! - post-process the result returned by `next`
//!
//! ```text
//! hooks[0] ──next──▶ hooks[1] ──next──▶ ... ──next──▶ ctx.tool.invoke()
//! ```
//!
//! Errors raised by a hook propagate to the caller unchanged; the chain
//! swallows nothing.

use super::context::{InvocationError, ToolHookContext};
use async_trait::async_trait;
use relay_domain::{CallToolResult, ToolArguments};
use std::sync::Arc;

/// One link of a hook chain.
#[async_trait]
pub trait ToolHook: Send + Sync {
    /// Name used in logs and errors
    fn name(&self) -> &str;

    async fn call(
        &self,
        ctx: &ToolHookContext<'_>,
        arguments: ToolArguments,
        next: Next<'_>,
    ) -> Result<CallToolResult, InvocationError>;
}

/// The rest of the chain, as seen from one hook.
pub struct Next<'a> {
    hooks: &'a [Arc<dyn ToolHook>],
    ctx: &'a ToolHookContext<'a>,
}

impl<'a> Next<'a> {
    /// Continue with the next hook, or the real tool after the last one.
    pub async fn run(self, arguments: ToolArguments) -> Result<CallToolResult, InvocationError> {
        match self.hooks.split_first() {
            Some((hook, rest)) => {
                let next = Next {
                    hooks: rest,
                    ctx: self.ctx,
                };
                hook.call(self.ctx, arguments, next).await
            }
            None => self.ctx.tool.invoke(arguments).await,
        }
    }
}

/// Ordered hooks composed into one callable.
///
/// Built once per template and shared read-only by all of its instances;
/// cloning only bumps a reference count.
#[derive(Clone)]
pub struct HookChain {
    hooks: Arc<[Arc<dyn ToolHook>]>,
}

impl Default for HookChain {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl HookChain {
    pub fn new(hooks: Vec<Arc<dyn ToolHook>>) -> Self {
        Self {
            hooks: hooks.into(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Hook names in declaration order
    pub fn names(&self) -> Vec<&str> {
        self.hooks.iter().map(|h| h.name()).collect()
    }

    /// Run the chain for one invocation.
    pub async fn run(
        &self,
        ctx: &ToolHookContext<'_>,
        arguments: ToolArguments,
    ) -> Result<CallToolResult, InvocationError> {
        let next = Next {
            hooks: &self.hooks,
            ctx,
        };
        next.run(arguments).await
    }
}

impl std::fmt::Debug for HookChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::context::ToolInvoker;
    use crate::test_support::{CountingInvoker, RecordingHook};
    use relay_domain::ToolSource;
    use serde_json::json;
    use std::sync::Mutex;

    struct Block;

    #[async_trait]
    impl ToolHook for Block {
        fn name(&self) -> &str {
            "block"
        }

        async fn call(
            &self,
            _ctx: &ToolHookContext<'_>,
            _arguments: ToolArguments,
            _next: Next<'_>,
        ) -> Result<CallToolResult, InvocationError> {
            Ok(CallToolResult::rejected("blocked"))
        }
    }

    struct AddArg;

    #[async_trait]
    impl ToolHook for AddArg {
        fn name(&self) -> &str {
            "add_arg"
        }

        async fn call(
            &self,
            _ctx: &ToolHookContext<'_>,
            mut arguments: ToolArguments,
            next: Next<'_>,
        ) -> Result<CallToolResult, InvocationError> {
            arguments.insert("injected".into(), json!(true));
            next.run(arguments).await
        }
    }

    struct Uppercase;

    #[async_trait]
    impl ToolHook for Uppercase {
        fn name(&self) -> &str {
            "uppercase"
        }

        async fn call(
            &self,
            _ctx: &ToolHookContext<'_>,
            arguments: ToolArguments,
            next: Next<'_>,
        ) -> Result<CallToolResult, InvocationError> {
            let result = next.run(arguments).await?;
            Ok(CallToolResult::text(result.text_content().to_uppercase()))
        }
    }

    struct Failing;

    #[async_trait]
    impl ToolHook for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        async fn call(
            &self,
            _ctx: &ToolHookContext<'_>,
            _arguments: ToolArguments,
            _next: Next<'_>,
        ) -> Result<CallToolResult, InvocationError> {
            Err(InvocationError::hook("failing", "approval service unreachable"))
        }
    }

    fn ctx<'a>(tool: &'a dyn ToolInvoker) -> ToolHookContext<'a> {
        ToolHookContext::new("Summarizer[1]", "search", ToolSource::Function, "c1", tool)
    }

    #[tokio::test]
    async fn test_empty_chain_invokes_tool() {
        let invoker = CountingInvoker::new("found it");
        let result = HookChain::empty()
            .run(&ctx(&invoker), ToolArguments::new())
            .await
            .unwrap();
        assert_eq!(result.text_content(), "found it");
        assert_eq!(invoker.calls(), 1);
    }

    #[tokio::test]
    async fn test_short_circuit_skips_tool() {
        let invoker = CountingInvoker::new("unused");
        let chain = HookChain::new(vec![Arc::new(Block)]);

        let result = chain.run(&ctx(&invoker), ToolArguments::new()).await.unwrap();
        assert!(result.is_error());
        assert_eq!(result.text_content(), "blocked");
        assert_eq!(invoker.calls(), 0);
    }

    #[tokio::test]
    async fn test_hooks_run_in_declaration_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let chain = HookChain::new(vec![
            Arc::new(RecordingHook::new("first", order.clone())),
            Arc::new(RecordingHook::new("second", order.clone())),
        ]);
        assert_eq!(chain.names(), vec!["first", "second"]);

        let invoker = CountingInvoker::new("ok");
        chain.run(&ctx(&invoker), ToolArguments::new()).await.unwrap();
        assert_eq!(*order.lock().unwrap(), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_argument_rewrite_and_post_processing() {
        let invoker = CountingInvoker::new("done");
        let chain = HookChain::new(vec![Arc::new(Uppercase), Arc::new(AddArg)]);

        let result = chain.run(&ctx(&invoker), ToolArguments::new()).await.unwrap();
        assert_eq!(result.text_content(), "DONE");
        assert_eq!(invoker.last_arguments().get("injected"), Some(&json!(true)));
    }

    #[tokio::test]
    async fn test_hook_errors_propagate() {
        let invoker = CountingInvoker::new("unused");
        let chain = HookChain::new(vec![Arc::new(Failing)]);

        let err = chain
            .run(&ctx(&invoker), ToolArguments::new())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("approval service unreachable"));
        assert_eq!(invoker.calls(), 0);
    }
}
