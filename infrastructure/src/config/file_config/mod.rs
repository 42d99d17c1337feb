//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and converted to domain/application types
//! where needed.

mod agent;
mod caller;
mod dispatch;
mod servers;

pub use agent::{FileAgentConfig, FileHookConfig};
pub use caller::FileCallerConfig;
pub use dispatch::FileDispatchConfig;
pub use servers::FileServerConfig;

use relay_domain::agent::validation::{ConfigIssue, ConfigIssueCode, Severity};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Raised when a configuration has fatal issues
#[derive(Debug, Error)]
pub enum ConfigValidationError {
    #[error("invalid configuration: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Dispatcher settings
    pub dispatch: FileDispatchConfig,
    /// Hooks around the caller's agent calls
    pub caller: FileCallerConfig,
    /// Agent templates
    pub agents: Vec<FileAgentConfig>,
    /// In-process tool servers
    pub servers: Vec<FileServerConfig>,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    ///
    /// Checks:
    /// 1. `[dispatch]` values (history mode, zero limits) and `[caller]` hook specs
    /// 2. Each agent definition (name, parallelism, hook specs, history)
    /// 3. Duplicate agent names
    /// 4. Server references that name no `[[servers]]` entry
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = self.dispatch.to_params().1;
        issues.extend(self.caller.validate());

        let servers: HashSet<&str> = self.servers.iter().map(|s| s.name.as_str()).collect();
        let mut seen = HashSet::new();

        for agent in &self.agents {
            issues.extend(agent.validate());

            let name = agent.name.trim();
            if !name.is_empty() && !seen.insert(name) {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::DuplicateAgent {
                        name: name.to_string(),
                    },
                    format!("agents: '{}' is defined more than once", name),
                ));
            }

            for server in &agent.servers {
                if !servers.contains(server.as_str()) {
                    issues.push(ConfigIssue::error(
                        ConfigIssueCode::UnknownServer {
                            agent: agent.name.clone(),
                            server: server.clone(),
                        },
                        format!(
                            "agents.{}.servers: no [[servers]] entry named '{}'",
                            agent.name, server
                        ),
                    ));
                }
            }
        }

        issues
    }

    /// Validate, returning warnings or the fatal issues as an error.
    pub fn check(&self) -> Result<Vec<ConfigIssue>, ConfigValidationError> {
        let (errors, warnings): (Vec<_>, Vec<_>) = self
            .validate()
            .into_iter()
            .partition(|i| i.severity == Severity::Error);
        if errors.is_empty() {
            Ok(warnings)
        } else {
            Err(ConfigValidationError::Invalid(
                errors.into_iter().map(|i| i.message).collect(),
            ))
        }
    }
}
