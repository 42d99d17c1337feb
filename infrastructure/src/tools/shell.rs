//! Runtime tool: `shell.execute`

use relay_domain::{CallToolResult, ErrorKind, ProviderError, ToolArguments, ToolDefinition, ToolSource};
use serde_json::json;
use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::debug;

/// Tool name constant
pub const SHELL_EXECUTE: &str = "shell.execute";

/// Maximum output size (1 MB)
const MAX_OUTPUT_SIZE: usize = 1024 * 1024;

pub fn definition() -> ToolDefinition {
    ToolDefinition::new(
        SHELL_EXECUTE,
        "Execute a shell command and return its combined output",
        ToolSource::Runtime,
    )
    .with_schema(json!({
        "type": "object",
        "properties": {
            "command": { "type": "string", "description": "The command to execute" },
            "working_dir": { "type": "string", "description": "Working directory" }
        },
        "required": ["command"]
    }))
}

/// Run `command` through `sh -c`, killing it once `timeout` elapses.
///
/// A non-zero exit status is still a successful call; the exit code is
/// reported in the output for the agent to act on.
pub async fn execute(
    arguments: &ToolArguments,
    default_dir: Option<&Path>,
    timeout: Duration,
) -> Result<CallToolResult, ProviderError> {
    let command = arguments
        .get("command")
        .and_then(|v| v.as_str())
        .ok_or_else(|| ProviderError::InvalidArguments("'command' is required".to_string()))?;

    let mut cmd = if cfg!(target_os = "windows") {
        let mut c = Command::new("cmd");
        c.args(["/C", command]);
        c
    } else {
        let mut c = Command::new("sh");
        c.args(["-c", command]);
        c
    };

    let working_dir = arguments
        .get("working_dir")
        .and_then(|v| v.as_str())
        .map(Path::new)
        .or(default_dir);
    if let Some(dir) = working_dir {
        if !dir.is_dir() {
            return Err(ProviderError::InvalidArguments(format!(
                "'{}' is not a directory",
                dir.display()
            )));
        }
        cmd.current_dir(dir);
    }

    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let start = Instant::now();
    let child = cmd
        .spawn()
        .map_err(|e| ProviderError::ExecutionFailed(format!("Failed to spawn command: {}", e)))?;

    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(output) => output
            .map_err(|e| ProviderError::ExecutionFailed(format!("Failed to wait for command: {}", e)))?,
        Err(_) => {
            return Ok(CallToolResult::failure(
                ErrorKind::Timeout,
                format!("Command timed out after {}s", timeout.as_secs()),
            ));
        }
    };

    let exit_code = output.status.code().unwrap_or(-1);
    debug!(
        command,
        exit_code,
        duration_ms = start.elapsed().as_millis() as u64,
        "Command finished"
    );

    let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.is_empty() {
        if !combined.is_empty() {
            combined.push_str("\n--- stderr ---\n");
        }
        combined.push_str(&stderr);
    }
    if combined.len() > MAX_OUTPUT_SIZE {
        let mut cut = MAX_OUTPUT_SIZE;
        while !combined.is_char_boundary(cut) {
            cut -= 1;
        }
        combined.truncate(cut);
        combined.push_str("\n... (output truncated)");
    }

    if output.status.success() {
        Ok(CallToolResult::text(combined))
    } else {
        Ok(CallToolResult::text(format!(
            "Command exited with code {}\n{}",
            exit_code, combined
        )))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn args(command: &str) -> ToolArguments {
        ToolArguments::from([("command".to_string(), json!(command))])
    }

    #[tokio::test]
    async fn test_echo() {
        let result = execute(&args("echo hello"), None, Duration::from_secs(5))
            .await
            .unwrap();
        assert!(!result.is_error());
        assert_eq!(result.text_content().trim(), "hello");
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_reported_in_output() {
        let result = execute(&args("echo oops >&2; exit 3"), None, Duration::from_secs(5))
            .await
            .unwrap();
        assert!(!result.is_error());
        assert!(result.text_content().starts_with("Command exited with code 3"));
        assert!(result.text_content().contains("oops"));
    }

    #[tokio::test]
    async fn test_working_dir() {
        let dir = tempfile::tempdir().unwrap();
        let result = execute(&args("pwd"), Some(dir.path()), Duration::from_secs(5))
            .await
            .unwrap();
        let name = dir.path().file_name().unwrap().to_str().unwrap();
        assert!(result.text_content().contains(name));
    }

    #[tokio::test]
    async fn test_timeout() {
        let result = execute(&args("sleep 5"), None, Duration::from_millis(100))
            .await
            .unwrap();
        assert_eq!(result.error_kind, Some(ErrorKind::Timeout));
    }

    #[tokio::test]
    async fn test_missing_command() {
        let err = execute(&ToolArguments::new(), None, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::InvalidArguments(_)));
    }
}
