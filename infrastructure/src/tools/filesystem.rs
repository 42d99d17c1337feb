//! Runtime tool: `filesystem.read_text`

use relay_domain::{CallToolResult, ProviderError, ToolArguments, ToolDefinition, ToolSource};
use serde_json::json;
use std::path::{Path, PathBuf};

/// Tool name constant
pub const FILESYSTEM_READ_TEXT: &str = "filesystem.read_text";

/// Maximum file size to read (10 MB)
const MAX_READ_SIZE: u64 = 10 * 1024 * 1024;

pub fn definition() -> ToolDefinition {
    ToolDefinition::new(
        FILESYSTEM_READ_TEXT,
        "Read a UTF-8 text file",
        ToolSource::Runtime,
    )
    .with_schema(json!({
        "type": "object",
        "properties": {
            "path": { "type": "string", "description": "Path of the file to read" }
        },
        "required": ["path"]
    }))
}

/// Read the file named by `path`, resolved against `base_dir` when relative.
pub async fn execute(
    arguments: &ToolArguments,
    base_dir: Option<&Path>,
) -> Result<CallToolResult, ProviderError> {
    let raw = arguments
        .get("path")
        .and_then(|v| v.as_str())
        .ok_or_else(|| ProviderError::InvalidArguments("'path' is required".to_string()))?;

    let path = match base_dir {
        Some(base) if Path::new(raw).is_relative() => base.join(raw),
        _ => PathBuf::from(raw),
    };

    let metadata = tokio::fs::metadata(&path)
        .await
        .map_err(|e| ProviderError::ExecutionFailed(format!("{}: {}", path.display(), e)))?;
    if !metadata.is_file() {
        return Err(ProviderError::InvalidArguments(format!(
            "'{}' is not a file",
            path.display()
        )));
    }
    if metadata.len() > MAX_READ_SIZE {
        return Err(ProviderError::InvalidArguments(format!(
            "File too large ({} bytes). Maximum size is {} bytes",
            metadata.len(),
            MAX_READ_SIZE
        )));
    }

    let content = tokio::fs::read_to_string(&path)
        .await
        .map_err(|e| ProviderError::ExecutionFailed(format!("{}: {}", path.display(), e)))?;
    Ok(CallToolResult::text(content))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(path: &str) -> ToolArguments {
        ToolArguments::from([("path".to_string(), json!(path))])
    }

    #[tokio::test]
    async fn test_reads_relative_to_base_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "line one\nline two").unwrap();

        let result = execute(&args("notes.txt"), Some(dir.path())).await.unwrap();
        assert_eq!(result.text_content(), "line one\nline two");
    }

    #[tokio::test]
    async fn test_directory_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = execute(&args(dir.path().to_str().unwrap()), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::InvalidArguments(_)));
    }

    #[tokio::test]
    async fn test_missing_file() {
        let err = execute(&args("/nonexistent/relay/file.txt"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::ExecutionFailed(_)));
    }

    #[tokio::test]
    async fn test_invalid_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blob.bin");
        std::fs::write(&path, [0xff, 0xfe, 0x00]).unwrap();

        assert!(execute(&args(path.to_str().unwrap()), None).await.is_err());
    }
}
