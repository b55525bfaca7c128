//! WorkspaceRegistry — process-wide store of workspace contexts.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use futures_util::FutureExt;
use ragspace_protocol::WorkspaceSummary;
use tracing::{debug, error, info, warn};

use crate::error::WorkspaceError;
use crate::scope;
use crate::workspace::WorkspaceContext;

/// Internal entry in the registry — remembers registration order.
struct WorkspaceEntry {
    context: Arc<WorkspaceContext>,
    seq: u64,
}

/// Maps workspace id → context.
///
/// Read by every request, written at startup (or when a workspace is added
/// later). Registering an id twice replaces the earlier context; that is
/// logged, never an error. Workspaces are not individually removable, and
/// shutdown leaves the map untouched.
///
/// Map guards are never held across an `.await`: callers get `Arc` clones.
pub struct WorkspaceRegistry {
    workspaces: DashMap<String, WorkspaceEntry>,
    next_seq: AtomicU64,
}

impl WorkspaceRegistry {
    pub fn new() -> Self {
        Self {
            workspaces: DashMap::new(),
            next_seq: AtomicU64::new(0),
        }
    }

    /// Insert or replace the context for its id. Returns the replaced
    /// context, whose engines are left untouched: finalizing them is up to
    /// the caller.
    pub fn register(
        &self,
        context: impl Into<Arc<WorkspaceContext>>,
    ) -> Option<Arc<WorkspaceContext>> {
        let context = context.into();
        let id = context.id().to_string();
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);

        let previous = self.workspaces.insert(id.clone(), WorkspaceEntry { context, seq });
        if previous.is_some() {
            warn!(workspace = %id, "Workspace already registered, overriding");
        }
        info!(workspace = %id, "Registered workspace");
        previous.map(|entry| entry.context)
    }

    /// Get the context registered under `workspace_id`.
    pub fn get(&self, workspace_id: &str) -> Option<Arc<WorkspaceContext>> {
        self.workspaces.get(workspace_id).map(|entry| entry.context.clone())
    }

    pub fn contains(&self, workspace_id: &str) -> bool {
        self.workspaces.contains_key(workspace_id)
    }

    /// Snapshot of all contexts in registration order.
    pub fn list(&self) -> Vec<Arc<WorkspaceContext>> {
        let mut entries: Vec<(u64, Arc<WorkspaceContext>)> = self
            .workspaces
            .iter()
            .map(|entry| (entry.seq, entry.context.clone()))
            .collect();
        entries.sort_by_key(|(seq, _)| *seq);
        entries.into_iter().map(|(_, context)| context).collect()
    }

    pub fn summaries(&self) -> Vec<WorkspaceSummary> {
        self.list().iter().map(|context| context.summary()).collect()
    }

    pub fn len(&self) -> usize {
        self.workspaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workspaces.is_empty()
    }

    /// Resolve a request's workspace id to an available context.
    ///
    /// Unknown, errored and disabled workspaces are all rejected with a
    /// not-found class error. A recorded error message wins over the
    /// generic disabled message.
    pub fn resolve(&self, workspace_id: &str) -> Result<Arc<WorkspaceContext>, WorkspaceError> {
        let Some(context) = self.get(workspace_id) else {
            debug!(workspace = %workspace_id, "Rejected request for unknown workspace");
            return Err(WorkspaceError::NotFound {
                workspace_id: workspace_id.to_string(),
            });
        };

        if context.is_available() {
            return Ok(context);
        }

        if let Some(message) = context.error() {
            debug!(workspace = %workspace_id, "Rejected request for failed workspace");
            return Err(WorkspaceError::Failed {
                workspace_id: workspace_id.to_string(),
                message,
            });
        }
        debug!(workspace = %workspace_id, "Rejected request for disabled workspace");
        Err(WorkspaceError::Disabled {
            workspace_id: workspace_id.to_string(),
        })
    }

    /// Resolve `workspace_id` and run `fut` with it bound as the current
    /// workspace. The binding is released when `fut` completes, panics, or
    /// is dropped.
    pub async fn scope<F: Future>(
        &self,
        workspace_id: &str,
        fut: F,
    ) -> Result<F::Output, WorkspaceError> {
        let context = self.resolve(workspace_id)?;
        Ok(scope::bind(context, fut).await)
    }

    /// Set up the engines of every enabled workspace that is not initialized
    /// yet. Failures and panics are recorded on the workspace and logged; the
    /// sweep always completes. Returns how many workspaces are ready afterwards.
    pub async fn initialize_all(&self) -> usize {
        let mut ready = 0;
        for context in self.list() {
            if context.is_initialized() {
                ready += 1;
                continue;
            }
            if !context.config().enabled {
                debug!(workspace = %context.id(), "Skipping initialization of disabled workspace");
                continue;
            }

            let outcome = AssertUnwindSafe(context.initialize()).catch_unwind().await;
            match outcome {
                Ok(Ok(())) => {
                    info!(workspace = %context.id(), "Workspace initialized");
                    ready += 1;
                }
                Ok(Err(e)) => {
                    error!(workspace = %context.id(), error = %e, "Failed to initialize workspace");
                }
                Err(panic) => {
                    let message = panic_message(&*panic);
                    error!(
                        workspace = %context.id(),
                        panic = message,
                        "Workspace initialize panicked"
                    );
                    context.set_error(format!(
                        "Failed to initialize workspace '{}': {message}",
                        context.id()
                    ));
                }
            }
        }
        ready
    }

    /// Finalize the retrieval engine storages of every initialized workspace.
    ///
    /// Each finalize runs in isolation: an error or a panic in one workspace
    /// is logged and the remaining workspaces are still finalized. Never
    /// fails; registry contents are left as they are.
    pub async fn shutdown_all(&self) {
        let mut finalized = 0usize;
        let mut failed = 0usize;

        for context in self.list() {
            if !context.is_initialized() {
                continue;
            }

            info!(workspace = %context.id(), "Finalizing workspace");
            let outcome = AssertUnwindSafe(context.rag().finalize_storages())
                .catch_unwind()
                .await;

            match outcome {
                Ok(Ok(())) => finalized += 1,
                Ok(Err(e)) => {
                    failed += 1;
                    error!(workspace = %context.id(), error = %e, "Failed to finalize workspace");
                }
                Err(panic) => {
                    failed += 1;
                    error!(
                        workspace = %context.id(),
                        panic = panic_message(&*panic),
                        "Workspace finalize panicked"
                    );
                }
            }
        }

        info!("Workspace shutdown complete ({finalized} finalized, {failed} failed)");
    }
}

impl Default for WorkspaceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}
