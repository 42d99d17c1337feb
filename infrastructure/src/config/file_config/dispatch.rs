//! Dispatcher configuration from TOML (`[dispatch]` section)

use relay_application::DispatchParams;
use relay_domain::HistoryPolicy;
use relay_domain::agent::validation::{ConfigIssue, ConfigIssueCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub(super) const HISTORY_VALUES: [&str; 2] = ["fresh", "fork"];

/// Raw dispatcher configuration from TOML
///
/// # Example
///
/// ```toml
/// [dispatch]
/// max_parallelism = 8          # cap across all agents (omit for none)
/// child_timeout_secs = 120     # per-instance time budget (omit for none)
/// history = "fresh"            # "fresh" or "fork"
/// suppress_child_display = true
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileDispatchConfig {
    pub max_parallelism: Option<usize>,
    pub child_timeout_secs: Option<u64>,
    pub history: String,
    pub suppress_child_display: bool,
}

impl Default for FileDispatchConfig {
    fn default() -> Self {
        Self {
            max_parallelism: None,
            child_timeout_secs: None,
            history: "fresh".to_string(),
            suppress_child_display: true,
        }
    }
}

impl FileDispatchConfig {
    /// Parse `history`, falling back to `fresh` with a warning.
    pub fn parse_history(&self) -> (HistoryPolicy, Vec<ConfigIssue>) {
        match self.history.parse::<HistoryPolicy>() {
            Ok(policy) => (policy, vec![]),
            Err(_) => (
                HistoryPolicy::Fresh,
                vec![invalid_history("dispatch.history", &self.history)],
            ),
        }
    }

    /// Convert to dispatcher parameters, with any issues found on the way.
    pub fn to_params(&self) -> (DispatchParams, Vec<ConfigIssue>) {
        let (history, mut issues) = self.parse_history();

        if self.max_parallelism == Some(0) {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::ZeroParallelism {
                    field: "dispatch.max_parallelism".to_string(),
                },
                "dispatch.max_parallelism is 0, running without a global cap",
            ));
        }

        let child_timeout = match self.child_timeout_secs {
            Some(0) => {
                issues.push(ConfigIssue::warning(
                    ConfigIssueCode::ZeroTimeout {
                        field: "dispatch.child_timeout_secs".to_string(),
                    },
                    "dispatch.child_timeout_secs is 0, running without a timeout",
                ));
                None
            }
            other => other.map(Duration::from_secs),
        };

        let params = DispatchParams::default()
            .with_history(history)
            .with_suppress_child_display(self.suppress_child_display)
            .with_child_timeout(child_timeout)
            .with_max_parallelism(self.max_parallelism);
        (params, issues)
    }
}

pub(super) fn invalid_history(field: &str, value: &str) -> ConfigIssue {
    ConfigIssue::warning(
        ConfigIssueCode::InvalidEnumValue {
            field: field.to_string(),
            value: value.to_string(),
            valid_values: HISTORY_VALUES.iter().map(|v| v.to_string()).collect(),
        },
        format!("{}: unknown value '{}', falling back to 'fresh'", field, value),
    )
}
