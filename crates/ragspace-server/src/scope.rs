//! Request scoping — the ambient current-workspace slot.
//!
//! The slot is a tokio task-local, so every task sees only its own binding,
//! even when tasks interleave on one thread. It can only be written through
//! [`bind`] and [`bind_sync`], which restore the previous value when the
//! scope ends: normally, with an error, by panic, or because the future was
//! dropped before completion. Nested scopes restore the outer binding.
//!
//! Spawned tasks do not inherit the binding; use [`spawn_scoped`] to carry
//! it over.

use std::future::Future;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::error;

use crate::error::WorkspaceError;
use crate::workspace::WorkspaceContext;

tokio::task_local! {
    static CURRENT_WORKSPACE: Arc<WorkspaceContext>;
}

/// Run `fut` with `workspace` bound as the current workspace.
pub async fn bind<F: Future>(workspace: Arc<WorkspaceContext>, fut: F) -> F::Output {
    CURRENT_WORKSPACE.scope(workspace, fut).await
}

/// Synchronous counterpart of [`bind`].
pub fn bind_sync<R>(workspace: Arc<WorkspaceContext>, f: impl FnOnce() -> R) -> R {
    CURRENT_WORKSPACE.sync_scope(workspace, f)
}

/// The workspace bound to the calling task.
///
/// Fails with [`WorkspaceError::OutsideScope`] when no scope is active. That
/// is a programming error in the caller and is logged as one.
pub fn current_workspace() -> Result<Arc<WorkspaceContext>, WorkspaceError> {
    CURRENT_WORKSPACE.try_with(Arc::clone).map_err(|_| {
        error!("current_workspace() called outside a bound workspace scope");
        WorkspaceError::OutsideScope
    })
}

/// Non-failing lookup for code that runs both inside and outside a scope.
pub fn try_current_workspace() -> Option<Arc<WorkspaceContext>> {
    CURRENT_WORKSPACE.try_with(Arc::clone).ok()
}

/// Spawn `fut` on the runtime with the caller's binding carried over.
pub fn spawn_scoped<F>(fut: F) -> Result<JoinHandle<F::Output>, WorkspaceError>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    let workspace = current_workspace()?;
    Ok(tokio::spawn(CURRENT_WORKSPACE.scope(workspace, fut)))
}
