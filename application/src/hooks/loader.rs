//! Resolving declarative hook references into hook instances.
//!
//! Agent definitions name hooks as `"<module>:<function>"` plus an optional
//! options object:
//!
//! ```toml
//! hooks = [
//!     { use = "relay.hooks:safety_guard", with = { deny = ["shell.execute"] } },
//! ]
//! ```
//!
//! A [`HookRegistry`] maps module/function pairs to factories that turn the
//! options into an `Arc<dyn ToolHook>`. Hooks built in-process can be passed
//! directly as [`HookRef::Instance`].

use super::chain::{HookChain, ToolHook};
use serde_json::Value;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while resolving hook references
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HookLoadError {
    #[error("Invalid hook spec '{0}': expected '<module>:<function>'")]
    InvalidSpec(String),

    #[error("Hook module not found: {0}")]
    ModuleNotFound(String),

    #[error("Hook function '{function}' not found in module '{module}'")]
    FunctionNotFound { module: String, function: String },

    #[error("Invalid options for hook '{spec}': {message}")]
    InvalidOptions { spec: String, message: String },
}

/// Parsed `"<module>:<function>"` reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HookSpec {
    pub module: String,
    pub function: String,
}

impl FromStr for HookSpec {
    type Err = HookLoadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (module, function) = s
            .rsplit_once(':')
            .ok_or_else(|| HookLoadError::InvalidSpec(s.to_string()))?;
        let (module, function) = (module.trim(), function.trim());
        let valid_function = !function.is_empty()
            && function
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_');
        if module.is_empty() || !valid_function {
            return Err(HookLoadError::InvalidSpec(s.to_string()));
        }
        Ok(Self {
            module: module.to_string(),
            function: function.to_string(),
        })
    }
}

impl std::fmt::Display for HookSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.module, self.function)
    }
}

/// Builds a hook from its options object.
pub type HookFactory =
    Arc<dyn Fn(&Value) -> Result<Arc<dyn ToolHook>, HookLoadError> + Send + Sync>;

/// A hook reference as it appears in an agent definition.
#[derive(Clone)]
pub enum HookRef {
    /// `"<module>:<function>"` with options
    Spec { spec: String, options: Value },
    /// An already-built hook
    Instance(Arc<dyn ToolHook>),
}

impl HookRef {
    pub fn spec(spec: impl Into<String>) -> Self {
        Self::Spec {
            spec: spec.into(),
            options: Value::Null,
        }
    }

    pub fn with_options(spec: impl Into<String>, options: Value) -> Self {
        Self::Spec {
            spec: spec.into(),
            options,
        }
    }
}

/// Registry of hook factories, keyed by module and function name.
#[derive(Default, Clone)]
pub struct HookRegistry {
    modules: HashMap<String, HashMap<String, HookFactory>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory under `module:function`.
    pub fn register<F>(&mut self, module: &str, function: &str, factory: F)
    where
        F: Fn(&Value) -> Result<Arc<dyn ToolHook>, HookLoadError> + Send + Sync + 'static,
    {
        self.modules
            .entry(module.to_string())
            .or_default()
            .insert(function.to_string(), Arc::new(factory));
    }

    /// Whether `spec` names a registered factory.
    pub fn contains(&self, spec: &str) -> bool {
        spec.parse::<HookSpec>()
            .map(|s| {
                self.modules
                    .get(&s.module)
                    .is_some_and(|m| m.contains_key(&s.function))
            })
            .unwrap_or(false)
    }

    /// Resolve one spec into a hook.
    pub fn load(&self, spec: &str, options: &Value) -> Result<Arc<dyn ToolHook>, HookLoadError> {
        let parsed: HookSpec = spec.parse()?;
        let module = self
            .modules
            .get(&parsed.module)
            .ok_or_else(|| HookLoadError::ModuleNotFound(parsed.module.clone()))?;
        let factory = module
            .get(&parsed.function)
            .ok_or_else(|| HookLoadError::FunctionNotFound {
                module: parsed.module.clone(),
                function: parsed.function.clone(),
            })?;
        factory(options)
    }

    /// Resolve references in order and compose them into a chain.
    ///
    /// Fails on the first reference that cannot be resolved.
    pub fn build_chain(&self, refs: &[HookRef]) -> Result<HookChain, HookLoadError> {
        let hooks = refs
            .iter()
            .map(|r| match r {
                HookRef::Spec { spec, options } => self.load(spec, options),
                HookRef::Instance(hook) => Ok(Arc::clone(hook)),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(HookChain::new(hooks))
    }
}

impl std::fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut specs: Vec<String> = self
            .modules
            .iter()
            .flat_map(|(m, fns)| fns.keys().map(move |f| format!("{}:{}", m, f)))
            .collect();
        specs.sort();
        f.debug_struct("HookRegistry").field("hooks", &specs).finish()
    }
}
