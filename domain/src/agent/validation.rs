//! Configuration issues detected while validating agent definitions.
//!
//! Validation never fails fast: it collects every [`ConfigIssue`] so the
//! user sees all problems at once. Callers decide what to do with
//! [`Severity::Error`] issues (usually: refuse to start).
//!
//! # Examples
//!
//! ```
//! use relay_domain::agent::validation::{ConfigIssue, ConfigIssueCode, Severity, has_errors};
//!
//! let issues = vec![ConfigIssue::warning(
//!     ConfigIssueCode::ZeroParallelism { field: "dispatch.max_parallelism".into() },
//!     "dispatch.max_parallelism is 0, ignoring",
//! )];
//! assert!(!has_errors(&issues));
//! ```

/// Severity level of a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Fatal: the configuration cannot work at all.
    Error,
    /// Non-fatal: the configuration works but may not behave as expected.
    Warning,
}

/// Identifies a specific configuration issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigIssueCode {
    /// An agent definition has an empty or malformed name.
    InvalidAgentName { name: String },
    /// Two agent definitions share a name.
    DuplicateAgent { name: String },
    /// A parallelism limit of zero would deadlock every call.
    ZeroParallelism { field: String },
    /// A timeout of zero seconds would fail every call.
    ZeroTimeout { field: String },
    /// A hook reference is not of the form `<module>:<function>`.
    InvalidHookSpec { agent: String, spec: String },
    /// An agent references a tool server that is not defined.
    UnknownServer { agent: String, server: String },
    /// A string field holds a value outside its allowed set.
    InvalidEnumValue {
        field: String,
        value: String,
        valid_values: Vec<String>,
    },
}

/// A detected issue in the configuration.
#[derive(Debug, Clone)]
pub struct ConfigIssue {
    pub severity: Severity,
    pub code: ConfigIssueCode,
    pub message: String,
}

impl ConfigIssue {
    pub fn error(code: ConfigIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
        }
    }

    pub fn warning(code: ConfigIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let level = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{}: {}", level, self.message)
    }
}

/// Whether any issue is fatal.
pub fn has_errors(issues: &[ConfigIssue]) -> bool {
    issues.iter().any(|i| i.severity == Severity::Error)
}
