//! The dispatching agent's own settings (`[caller]` table)

use super::agent::FileHookConfig;
use relay_application::{HookRef, HookSpec};
use relay_domain::agent::validation::{ConfigIssue, ConfigIssueCode};
use serde::{Deserialize, Serialize};

/// Hooks wrapping every agent call the caller makes.
///
/// These run with `tool_source = agent`, around the whole child instance.
///
/// # Example
///
/// ```toml
/// [caller]
/// hooks = [
///     { use = "relay.hooks:safety_guard", with = { deny = ["Operator"] } },
///     { use = "relay.hooks:audit_log" },
/// ]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileCallerConfig {
    pub hooks: Vec<FileHookConfig>,
}

impl FileCallerConfig {
    /// Hook references in declaration order.
    pub fn hook_refs(&self) -> Vec<HookRef> {
        self.hooks
            .iter()
            .map(|h| HookRef::with_options(h.spec.as_str(), h.options.clone()))
            .collect()
    }

    pub fn validate(&self) -> Vec<ConfigIssue> {
        self.hooks
            .iter()
            .filter(|hook| hook.spec.parse::<HookSpec>().is_err())
            .map(|hook| {
                ConfigIssue::error(
                    ConfigIssueCode::InvalidHookSpec {
                        agent: "caller".to_string(),
                        spec: hook.spec.clone(),
                    },
                    format!(
                        "caller.hooks: '{}' is not of the form '<module>:<function>'",
                        hook.spec
                    ),
                )
            })
            .collect()
    }
}
