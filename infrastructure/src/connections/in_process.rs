//! In-process tool servers.
//!
//! [`InProcessConnectionPool`] implements the
//! [`ConnectionPool`](relay_application::ConnectionPool) port over tool
//! providers living in the same process. Each agent template gets its own
//! pool, which it owns and closes on registry shutdown.

use async_trait::async_trait;
use relay_application::{ConnectionError, ConnectionPool};
use relay_domain::{CallToolResult, ProviderError, ToolArguments, ToolDefinition, ToolProvider};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tracing::{debug, info};

/// A named server backed by a tool provider
#[derive(Clone)]
pub struct InProcessServer {
    pub name: String,
    pub provider: Arc<dyn ToolProvider>,
}

impl InProcessServer {
    pub fn new(name: impl Into<String>, provider: Arc<dyn ToolProvider>) -> Self {
        Self {
            name: name.into(),
            provider,
        }
    }
}

/// Pool of in-process tool servers
#[derive(Default)]
pub struct InProcessConnectionPool {
    servers: BTreeMap<String, Arc<dyn ToolProvider>>,
    closed: AtomicBool,
    calls: AtomicUsize,
}

impl InProcessConnectionPool {
    pub fn new(servers: impl IntoIterator<Item = InProcessServer>) -> Self {
        Self {
            servers: servers
                .into_iter()
                .map(|s| (s.name, s.provider))
                .collect(),
            ..Default::default()
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Number of tool calls served
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    fn server(&self, name: &str) -> Result<&Arc<dyn ToolProvider>, ConnectionError> {
        if self.is_closed() {
            return Err(ConnectionError::Closed);
        }
        self.servers
            .get(name)
            .ok_or_else(|| ConnectionError::ServerNotFound(name.to_string()))
    }
}

#[async_trait]
impl ConnectionPool for InProcessConnectionPool {
    fn server_names(&self) -> Vec<String> {
        self.servers.keys().cloned().collect()
    }

    async fn list_tools(&self, server: &str) -> Result<Vec<ToolDefinition>, ConnectionError> {
        self.server(server)?
            .discover_tools()
            .await
            .map_err(|e| ConnectionError::Transport(e.to_string()))
    }

    async fn call_tool(
        &self,
        server: &str,
        tool: &str,
        arguments: &ToolArguments,
    ) -> Result<CallToolResult, ConnectionError> {
        let provider = self.server(server)?;
        self.calls.fetch_add(1, Ordering::Relaxed);
        debug!(server, tool, "In-process tool call");
        provider
            .execute(tool, arguments)
            .await
            .map_err(|e| match e {
                ProviderError::ToolNotFound(_) => ConnectionError::ToolNotFound {
                    server: server.to_string(),
                    tool: tool.to_string(),
                },
                other => ConnectionError::Transport(other.to_string()),
            })
    }

    async fn close(&self) -> Result<(), ConnectionError> {
        if !self.closed.swap(true, Ordering::AcqRel) {
            info!(servers = ?self.server_names(), "Closed in-process tool servers");
        }
        Ok(())
    }
}

impl std::fmt::Debug for InProcessConnectionPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InProcessConnectionPool")
            .field("servers", &self.server_names())
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::RuntimeToolProvider;
    use serde_json::json;

    fn pool(dir: &std::path::Path) -> InProcessConnectionPool {
        InProcessConnectionPool::new([InProcessServer::new(
            "workspace",
            Arc::new(RuntimeToolProvider::all().with_working_dir(dir)),
        )])
    }

    #[tokio::test]
    async fn test_list_and_call() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("readme.md"), "# relay").unwrap();
        let pool = pool(dir.path());

        assert_eq!(pool.server_names(), vec!["workspace"]);
        let tools = pool.list_tools("workspace").await.unwrap();
        assert_eq!(tools.len(), 2);

        let args = ToolArguments::from([("path".to_string(), json!("readme.md"))]);
        let result = pool
            .call_tool("workspace", "filesystem.read_text", &args)
            .await
            .unwrap();
        assert_eq!(result.text_content(), "# relay");
        assert_eq!(pool.calls(), 1);
    }

    #[tokio::test]
    async fn test_errors_map_to_connection_errors() {
        let dir = tempfile::tempdir().unwrap();
        let pool = pool(dir.path());

        let err = pool.list_tools("elsewhere").await.unwrap_err();
        assert!(matches!(err, ConnectionError::ServerNotFound(_)));

        let err = pool
            .call_tool("workspace", "network.fetch", &ToolArguments::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ConnectionError::ToolNotFound { .. }));
    }

    #[tokio::test]
    async fn test_closed_pool_refuses_calls() {
        let dir = tempfile::tempdir().unwrap();
        let pool = pool(dir.path());
        pool.close().await.unwrap();
        pool.close().await.unwrap();

        assert!(pool.is_closed());
        let err = pool.list_tools("workspace").await.unwrap_err();
        assert!(matches!(err, ConnectionError::Closed));
    }
}
