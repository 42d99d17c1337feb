//! Usage accounting for agent instances.
//!
//! Every agent carries a [`Usage`] value counting what its model calls
//! consumed. Ephemeral instances start at zero and are folded into their
//! long-lived template exactly once when they shut down:
//!
//! ```text
//! Template.usage ──┐
//!                  ├── merge(Clone[1].usage)
//!                  ├── merge(Clone[2].usage)
//!                  └── merge(Clone[3].usage)
//! ```
//!
//! [`Usage`] is a plain value type. Serializing concurrent merges into a
//! shared total is the application layer's job.

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign};

/// Cumulative usage counters for one agent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Usage {
    /// Prompt tokens sent to the model
    pub input_tokens: u64,
    /// Completion tokens produced by the model
    pub output_tokens: u64,
    /// Prompt tokens served from a provider-side cache
    pub cache_read_tokens: u64,
    /// Prompt tokens written into a provider-side cache
    pub cache_write_tokens: u64,
    /// Number of model requests (turns)
    pub requests: u64,
    /// Number of tool invocations made by the agent
    pub tool_calls: u64,
}

impl Usage {
    pub fn new(input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            input_tokens,
            output_tokens,
            requests: 1,
            ..Self::default()
        }
    }

    pub fn with_cache(mut self, read: u64, write: u64) -> Self {
        self.cache_read_tokens = read;
        self.cache_write_tokens = write;
        self
    }

    pub fn with_tool_calls(mut self, tool_calls: u64) -> Self {
        self.tool_calls = tool_calls;
        self
    }

    /// Add every counter of `other` into `self`.
    ///
    /// Saturating: a counter that would overflow stays at `u64::MAX`.
    pub fn merge(&mut self, other: &Usage) {
        self.input_tokens = self.input_tokens.saturating_add(other.input_tokens);
        self.output_tokens = self.output_tokens.saturating_add(other.output_tokens);
        self.cache_read_tokens = self
            .cache_read_tokens
            .saturating_add(other.cache_read_tokens);
        self.cache_write_tokens = self
            .cache_write_tokens
            .saturating_add(other.cache_write_tokens);
        self.requests = self.requests.saturating_add(other.requests);
        self.tool_calls = self.tool_calls.saturating_add(other.tool_calls);
    }

    pub fn total_tokens(&self) -> u64 {
        self.input_tokens.saturating_add(self.output_tokens)
    }

    pub fn is_zero(&self) -> bool {
        *self == Usage::default()
    }
}

impl AddAssign<&Usage> for Usage {
    fn add_assign(&mut self, rhs: &Usage) {
        self.merge(rhs);
    }
}

impl Add for Usage {
    type Output = Usage;

    fn add(mut self, rhs: Usage) -> Usage {
        self.merge(&rhs);
        self
    }
}

impl std::iter::Sum for Usage {
    fn sum<I: Iterator<Item = Usage>>(iter: I) -> Self {
        iter.fold(Usage::default(), |acc, u| acc + u)
    }
}

impl std::fmt::Display for Usage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} in / {} out tokens, {} requests, {} tool calls",
            self.input_tokens, self.output_tokens, self.requests, self.tool_calls
        )
    }
}
