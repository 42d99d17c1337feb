//! In-process tool servers from TOML (`[[servers]]` tables)

use serde::{Deserialize, Serialize};

/// Raw tool-server definition from TOML
///
/// # Example
///
/// ```toml
/// [[servers]]
/// name = "workspace"
/// tools = ["filesystem.read_text", "shell.execute"]
/// shell_timeout_secs = 30
/// ```
///
/// Agents connect to a server by listing its name in `servers`; its tools
/// are then exposed to them as `<server>__<tool>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileServerConfig {
    pub name: String,
    /// Runtime built-ins served by this server
    pub tools: Vec<String>,
    /// Time budget of a single `shell.execute` run
    pub shell_timeout_secs: u64,
}

impl Default for FileServerConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            tools: Vec::new(),
            shell_timeout_secs: 30,
        }
    }
}
