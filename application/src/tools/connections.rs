//! Ownership of tool-server connections.
//!
//! A [`ConnectionManager`] wraps one [`ConnectionPool`] and is the only
//! handle that can tear it down. Everyone else works through a
//! [`ConnectionLease`], which can list and call tools but has no way to
//! close anything:
//!
//! ```text
//! Template ── ConnectionManager (owner, close) ──┐
//!                                                ├── Arc<dyn ConnectionPool>
//! Clone[1] ── ConnectionLease (list, call) ──────┤
//! Clone[2] ── ConnectionLease (list, call) ──────┘
//! ```
//!
//! `ConnectionManager` is not `Clone`, so there is exactly one owner per
//! pool. Leases are counted; dropping a lease releases it.

use crate::ports::connection_pool::{ConnectionError, ConnectionPool};
use relay_domain::{CallToolResult, ToolArguments, ToolDefinition};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tracing::debug;

struct Shared {
    pool: Arc<dyn ConnectionPool>,
    closed: AtomicBool,
    active_leases: AtomicUsize,
}

impl Shared {
    fn ensure_open(&self) -> Result<(), ConnectionError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(ConnectionError::Closed);
        }
        Ok(())
    }

    async fn list_tools(&self, server: &str) -> Result<Vec<ToolDefinition>, ConnectionError> {
        self.ensure_open()?;
        self.pool.list_tools(server).await
    }

    async fn call_tool(
        &self,
        server: &str,
        tool: &str,
        arguments: &ToolArguments,
    ) -> Result<CallToolResult, ConnectionError> {
        self.ensure_open()?;
        self.pool.call_tool(server, tool, arguments).await
    }
}

/// Owning handle to a connection pool.
pub struct ConnectionManager {
    shared: Arc<Shared>,
}

impl ConnectionManager {
    pub fn new(pool: Arc<dyn ConnectionPool>) -> Self {
        Self {
            shared: Arc::new(Shared {
                pool,
                closed: AtomicBool::new(false),
                active_leases: AtomicUsize::new(0),
            }),
        }
    }

    /// Hand out a non-owning handle to the same pool.
    pub fn lease(&self) -> ConnectionLease {
        self.shared.active_leases.fetch_add(1, Ordering::AcqRel);
        ConnectionLease {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Number of leases currently alive
    pub fn active_leases(&self) -> usize {
        self.shared.active_leases.load(Ordering::Acquire)
    }

    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::Acquire)
    }

    pub fn server_names(&self) -> Vec<String> {
        self.shared.pool.server_names()
    }

    pub async fn list_tools(&self, server: &str) -> Result<Vec<ToolDefinition>, ConnectionError> {
        self.shared.list_tools(server).await
    }

    pub async fn call_tool(
        &self,
        server: &str,
        tool: &str,
        arguments: &ToolArguments,
    ) -> Result<CallToolResult, ConnectionError> {
        self.shared.call_tool(server, tool, arguments).await
    }

    /// Tear down the pool.
    ///
    /// Idempotent: only the first call reaches the pool. Returns whether
    /// this call performed the teardown.
    pub async fn close(&self) -> Result<bool, ConnectionError> {
        if self.shared.closed.swap(true, Ordering::AcqRel) {
            return Ok(false);
        }
        let leases = self.active_leases();
        if leases > 0 {
            debug!(leases, "Closing connections with leases still alive");
        }
        self.shared.pool.close().await?;
        Ok(true)
    }
}

/// Non-owning handle to a connection pool.
///
/// Deliberately has no `close`: a lease can only be released, by dropping it.
pub struct ConnectionLease {
    shared: Arc<Shared>,
}

impl ConnectionLease {
    pub fn server_names(&self) -> Vec<String> {
        self.shared.pool.server_names()
    }

    pub async fn list_tools(&self, server: &str) -> Result<Vec<ToolDefinition>, ConnectionError> {
        self.shared.list_tools(server).await
    }

    pub async fn call_tool(
        &self,
        server: &str,
        tool: &str,
        arguments: &ToolArguments,
    ) -> Result<CallToolResult, ConnectionError> {
        self.shared.call_tool(server, tool, arguments).await
    }
}

impl Clone for ConnectionLease {
    fn clone(&self) -> Self {
        self.shared.active_leases.fetch_add(1, Ordering::AcqRel);
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl Drop for ConnectionLease {
    fn drop(&mut self) {
        self.shared.active_leases.fetch_sub(1, Ordering::AcqRel);
    }
}
