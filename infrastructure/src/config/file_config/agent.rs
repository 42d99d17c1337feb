//! Agent definitions from TOML (`[[agents]]` tables)

use super::dispatch::invalid_history;
use relay_application::{HookRef, HookSpec};
use relay_domain::agent::validation::{ConfigIssue, ConfigIssueCode};
use relay_domain::{AgentConfig, AgentName, DomainError, HistoryPolicy};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Raw agent definition from TOML
///
/// # Example
///
/// ```toml
/// [[agents]]
/// name = "Summarizer"
/// instruction = "Summarize the given document in three sentences."
/// model = "claude-sonnet-4.5"
/// tools = ["docs__search"]          # allow-list (omit to expose everything)
/// max_parallelism = 4
/// history = "fork"                  # override of [dispatch].history
/// servers = ["docs"]                # in-process tool servers to connect to
/// runtime = ["filesystem.read_text"]
/// hooks = [
///     { use = "relay.hooks:safety_guard", with = { deny = ["shell.execute"] } },
///     { use = "relay.hooks:audit_log" },
/// ]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileAgentConfig {
    pub name: String,
    pub instruction: String,
    /// Shown to parent LLMs in the tool definition
    pub description: Option<String>,
    pub model: Option<String>,
    pub tools: Option<Vec<String>>,
    pub max_parallelism: Option<usize>,
    pub history: Option<String>,
    /// Names of `[[servers]]` this agent connects to
    pub servers: Vec<String>,
    /// Runtime built-ins attached directly (bare names)
    pub runtime: Vec<String>,
    pub hooks: Vec<FileHookConfig>,
}

/// One `{ use = "...", with = {...} }` hook reference
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileHookConfig {
    #[serde(rename = "use")]
    pub spec: String,
    #[serde(default, rename = "with")]
    pub options: Value,
}

impl FileAgentConfig {
    /// Parse the history override. Unknown values fall back to `fresh`.
    pub fn parse_history(&self) -> (Option<HistoryPolicy>, Vec<ConfigIssue>) {
        let Some(raw) = &self.history else {
            return (None, vec![]);
        };
        match raw.parse::<HistoryPolicy>() {
            Ok(policy) => (Some(policy), vec![]),
            Err(_) => (
                Some(HistoryPolicy::Fresh),
                vec![invalid_history(
                    &format!("agents.{}.history", self.name),
                    raw,
                )],
            ),
        }
    }

    /// Build the domain configuration.
    pub fn to_agent_config(&self) -> Result<AgentConfig, DomainError> {
        let mut config = AgentConfig::new(AgentName::new(self.name.as_str())?, self.instruction.as_str());
        if let Some(description) = &self.description {
            config = config.with_description(description.as_str());
        }
        if let Some(model) = &self.model {
            config = config.with_model(model.as_str());
        }
        if let Some(tools) = &self.tools {
            config = config.with_tools(tools.iter().cloned());
        }
        if let Some(max) = self.max_parallelism.filter(|m| *m > 0) {
            config = config.with_max_parallelism(max);
        }
        if let (Some(policy), _) = self.parse_history() {
            config = config.with_history(policy);
        }
        Ok(config)
    }

    /// Hook references in declaration order.
    pub fn hook_refs(&self) -> Vec<HookRef> {
        self.hooks
            .iter()
            .map(|h| HookRef::with_options(h.spec.as_str(), h.options.clone()))
            .collect()
    }

    /// Issues local to this definition.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        if let Err(e) = AgentName::new(self.name.as_str()) {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::InvalidAgentName {
                    name: self.name.clone(),
                },
                format!("agents: invalid name '{}': {}", self.name, e),
            ));
        }

        if self.max_parallelism == Some(0) {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::ZeroParallelism {
                    field: format!("agents.{}.max_parallelism", self.name),
                },
                format!(
                    "agents.{}.max_parallelism is 0, running without a cap",
                    self.name
                ),
            ));
        }

        for hook in &self.hooks {
            if hook.spec.parse::<HookSpec>().is_err() {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::InvalidHookSpec {
                        agent: self.name.clone(),
                        spec: hook.spec.clone(),
                    },
                    format!(
                        "agents.{}.hooks: '{}' is not of the form '<module>:<function>'",
                        self.name, hook.spec
                    ),
                ));
            }
        }

        issues.extend(self.parse_history().1);
        issues
    }
}
