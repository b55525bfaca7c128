//! RagServer — binds each request to its workspace and routes it there.

use std::sync::Arc;

use parking_lot::RwLock;
use ragspace_protocol::{HandlerResult, RpcError, WorkspaceSummary};
use ragspace_transport::RequestHandler;
use serde_json::Value;
use tracing::info;

use crate::registry::WorkspaceRegistry;
use crate::scope::current_workspace;

/// The ragspace server — owns the registry and answers transport requests.
pub struct RagServer {
    registry: Arc<WorkspaceRegistry>,
    state: RwLock<ServerState>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    Uninitialized,
    Running,
    Shutdown,
}

impl RagServer {
    pub fn new(registry: Arc<WorkspaceRegistry>) -> Self {
        Self {
            registry,
            state: RwLock::new(ServerState::Uninitialized),
        }
    }

    pub fn registry(&self) -> &Arc<WorkspaceRegistry> {
        &self.registry
    }

    pub fn state(&self) -> ServerState {
        *self.state.read()
    }

    /// Initialize every registered workspace and start accepting requests.
    /// Workspaces that fail to initialize stay registered in the error state.
    pub async fn initialize(&self) {
        info!("Initializing ragspace server ({} workspaces)", self.registry.len());
        let ready = self.registry.initialize_all().await;
        *self.state.write() = ServerState::Running;
        info!("ragspace server initialized ({ready}/{} workspaces ready)", self.registry.len());
    }

    /// Stop accepting requests and finalize all workspaces. Idempotent.
    pub async fn shutdown(&self) {
        {
            let mut state = self.state.write();
            if *state == ServerState::Shutdown {
                return;
            }
            *state = ServerState::Shutdown;
        }

        info!("Shutting down ragspace server...");
        self.registry.shutdown_all().await;
        info!("ragspace server shutdown complete");
    }
}

/// Runs inside the bound scope: handlers reach their workspace through the
/// ambient accessor, never through a parameter.
async fn dispatch(method: &str, params: Option<Value>) -> HandlerResult {
    let workspace = current_workspace()?;
    workspace.route(method, params).await
}

impl RequestHandler for RagServer {
    fn workspaces(&self) -> Vec<WorkspaceSummary> {
        self.registry.summaries()
    }

    async fn handle_request(
        &self,
        workspace_id: &str,
        method: &str,
        params: Option<Value>,
    ) -> HandlerResult {
        match self.state() {
            ServerState::Shutdown => return Err(RpcError::shutting_down()),
            ServerState::Uninitialized => return Err(RpcError::not_initialized()),
            ServerState::Running => {}
        }

        self.registry
            .scope(workspace_id, dispatch(method, params))
            .await?
    }
}
