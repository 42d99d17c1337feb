//! Dispatch parameters: how agent calls of a turn are executed.
//!
//! [`DispatchParams`] groups the static parameters that control
//! [`AgentDispatcher`](crate::use_cases::dispatch_agents::AgentDispatcher).
//! Per-template settings (history override, max parallelism) live on the
//! agent's configuration and take precedence where they apply.

use relay_domain::HistoryPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Dispatcher control parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchParams {
    /// Default history policy for spawned instances.
    pub history: HistoryPolicy,
    /// Spawn instances with chat/tool echo turned off.
    pub suppress_child_display: bool,
    /// Time budget of a single instance invocation.
    pub child_timeout: Option<Duration>,
    /// Cap on instances running at once across all templates.
    pub max_parallelism: Option<usize>,
}

impl Default for DispatchParams {
    fn default() -> Self {
        Self {
            history: HistoryPolicy::Fresh,
            suppress_child_display: true,
            child_timeout: None,
            max_parallelism: None,
        }
    }
}

impl DispatchParams {
    // ==================== Builder Methods ====================

    pub fn with_history(mut self, history: HistoryPolicy) -> Self {
        self.history = history;
        self
    }

    pub fn with_suppress_child_display(mut self, suppress: bool) -> Self {
        self.suppress_child_display = suppress;
        self
    }

    pub fn with_child_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.child_timeout = timeout;
        self
    }

    /// Zero means "no cap".
    pub fn with_max_parallelism(mut self, max: Option<usize>) -> Self {
        self.max_parallelism = max.filter(|m| *m > 0);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let params = DispatchParams::default();
        assert_eq!(params.history, HistoryPolicy::Fresh);
        assert!(params.suppress_child_display);
        assert!(params.child_timeout.is_none());
        assert!(params.max_parallelism.is_none());
    }

    #[test]
    fn test_builder() {
        let params = DispatchParams::default()
            .with_history(HistoryPolicy::Fork)
            .with_child_timeout(Some(Duration::from_secs(30)))
            .with_max_parallelism(Some(8));

        assert_eq!(params.history, HistoryPolicy::Fork);
        assert_eq!(params.child_timeout, Some(Duration::from_secs(30)));
        assert_eq!(params.max_parallelism, Some(8));
    }

    #[test]
    fn test_zero_parallelism_means_unbounded() {
        let params = DispatchParams::default().with_max_parallelism(Some(0));
        assert!(params.max_parallelism.is_none());
    }
}
