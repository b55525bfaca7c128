//! Workspace resolution and scoping errors.

use ragspace_protocol::RpcError;

/// Why a request could not be bound to a workspace, or why the bound
/// workspace could not be read.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorkspaceError {
    /// No workspace is registered under this id.
    #[error("Workspace '{workspace_id}' not found")]
    NotFound { workspace_id: String },

    /// Registered, but switched off in its configuration.
    #[error("Workspace '{workspace_id}' is disabled")]
    Disabled { workspace_id: String },

    /// Registered, but carrying a setup or runtime error. The error text is
    /// surfaced verbatim.
    #[error("{message}")]
    Failed { workspace_id: String, message: String },

    /// `current_workspace()` was called outside a bound scope. This is a bug
    /// in the caller, not a condition input validation can prevent.
    #[error("Workspace context not found in the current request scope")]
    OutsideScope,
}

impl WorkspaceError {
    /// Unknown, disabled and failed workspaces all look alike to callers.
    pub fn is_not_found(&self) -> bool {
        !matches!(self, Self::OutsideScope)
    }

    pub fn workspace_id(&self) -> Option<&str> {
        match self {
            Self::NotFound { workspace_id }
            | Self::Disabled { workspace_id }
            | Self::Failed { workspace_id, .. } => Some(workspace_id),
            Self::OutsideScope => None,
        }
    }
}

impl From<WorkspaceError> for RpcError {
    fn from(err: WorkspaceError) -> Self {
        if err.is_not_found() {
            RpcError::workspace_not_found(err.to_string())
        } else {
            RpcError::internal(err.to_string())
        }
    }
}
