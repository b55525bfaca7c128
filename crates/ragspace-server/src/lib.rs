//! ragspace server — workspace lifecycle and request scoping.
//!
//! Workspaces are derived from the environment at startup ([`config`]),
//! registered in a process-wide [`WorkspaceRegistry`], and bound to each
//! request through a task-local slot ([`scope`]). Request handlers reach
//! their workspace with [`current_workspace`].

pub mod config;
pub mod engine;
pub mod error;
pub mod registry;
pub mod router;
pub mod scope;
pub mod workspace;

pub use config::{StorageLayout, WorkspaceConfig, load_workspace_configs, parse_workspace_configs};
pub use engine::EngineHandle;
pub use error::WorkspaceError;
pub use registry::WorkspaceRegistry;
pub use router::{RagServer, ServerState};
pub use scope::{current_workspace, try_current_workspace};
pub use workspace::WorkspaceContext;
