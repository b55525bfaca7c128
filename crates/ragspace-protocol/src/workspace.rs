//! Workspace summary — the externally visible view of a registered workspace.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Ordered, loosely typed display metadata. Never interpreted by the server.
pub type Metadata = Map<String, Value>;

/// Serializable summary returned by `GET /workspaces` and `workspace/info`.
///
/// `enabled` is already the effective flag: the static configuration flag
/// AND the absence of a runtime error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceSummary {
    pub id: String,
    pub display_name: String,
    pub description: Option<String>,
    pub enabled: bool,
    pub error: Option<String>,
    #[serde(default)]
    pub metadata: Metadata,
}

/// Response body of `GET /workspaces`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceList {
    pub workspaces: Vec<WorkspaceSummary>,
}
