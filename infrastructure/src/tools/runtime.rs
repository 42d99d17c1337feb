//! Runtime tool provider
//!
//! Serves the built-in capabilities (`shell.execute`,
//! `filesystem.read_text`) as a [`ToolProvider`]. Attached to an agent
//! directly, its tools keep their bare names and report
//! [`ToolSource::Runtime`]; hosted by an in-process server they are reached
//! as `<server>__<tool>` instead.

use super::{filesystem, shell};
use async_trait::async_trait;
use relay_domain::{CallToolResult, ProviderError, ToolArguments, ToolDefinition, ToolProvider, ToolSource};
use std::path::PathBuf;
use std::time::Duration;

/// Names of every runtime tool
pub const RUNTIME_TOOLS: [&str; 2] = [shell::SHELL_EXECUTE, filesystem::FILESYSTEM_READ_TEXT];

/// Default time budget of one `shell.execute` run
pub const DEFAULT_SHELL_TIMEOUT: Duration = Duration::from_secs(30);

/// Provider of the runtime built-ins
#[derive(Debug, Clone)]
pub struct RuntimeToolProvider {
    tools: Vec<&'static str>,
    working_dir: Option<PathBuf>,
    shell_timeout: Duration,
}

impl RuntimeToolProvider {
    /// All runtime tools
    pub fn all() -> Self {
        Self {
            tools: RUNTIME_TOOLS.to_vec(),
            working_dir: None,
            shell_timeout: DEFAULT_SHELL_TIMEOUT,
        }
    }

    /// Only the named tools. Unknown names are an error.
    pub fn only<S: AsRef<str>>(names: &[S]) -> Result<Self, ProviderError> {
        let tools = names
            .iter()
            .map(|name| {
                RUNTIME_TOOLS
                    .iter()
                    .copied()
                    .find(|t| *t == name.as_ref())
                    .ok_or_else(|| ProviderError::ToolNotFound(name.as_ref().to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            tools,
            ..Self::all()
        })
    }

    // ==================== Builder Methods ====================

    /// Directory commands run in and relative paths resolve against
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn with_shell_timeout(mut self, timeout: Duration) -> Self {
        self.shell_timeout = timeout;
        self
    }

    pub fn tool_names(&self) -> &[&'static str] {
        &self.tools
    }

    fn offers(&self, tool_name: &str) -> bool {
        self.tools.contains(&tool_name)
    }
}

#[async_trait]
impl ToolProvider for RuntimeToolProvider {
    fn id(&self) -> &str {
        "runtime"
    }

    fn source(&self) -> ToolSource {
        ToolSource::Runtime
    }

    fn priority(&self) -> i32 {
        -100
    }

    async fn discover_tools(&self) -> Result<Vec<ToolDefinition>, ProviderError> {
        Ok(self
            .tools
            .iter()
            .map(|name| match *name {
                shell::SHELL_EXECUTE => shell::definition(),
                _ => filesystem::definition(),
            })
            .collect())
    }

    async fn execute(
        &self,
        tool_name: &str,
        arguments: &ToolArguments,
    ) -> Result<CallToolResult, ProviderError> {
        if !self.offers(tool_name) {
            return Err(ProviderError::ToolNotFound(tool_name.to_string()));
        }
        match tool_name {
            shell::SHELL_EXECUTE => {
                shell::execute(arguments, self.working_dir.as_deref(), self.shell_timeout).await
            }
            filesystem::FILESYSTEM_READ_TEXT => {
                filesystem::execute(arguments, self.working_dir.as_deref()).await
            }
            other => Err(ProviderError::ToolNotFound(other.to_string())),
        }
    }
}
