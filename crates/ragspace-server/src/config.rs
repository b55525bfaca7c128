//! Workspace configuration — derived from the environment at every start.
//!
//! Priority:
//!   1. `WORKSPACES` (comma-separated ids)
//!   2. explicit `--workspace` argument, then `WORKSPACE`, then `"default"`
//!
//! Parsing never fails. Blank entries are dropped, duplicates are dropped
//! with a warning, and the `"default"` fallback guarantees at least one
//! workspace.

use std::collections::HashSet;
use std::path::PathBuf;

use ragspace_protocol::Metadata;
use serde_json::Value;
use tracing::warn;

/// Aggregate multi-workspace source.
pub const WORKSPACES_ENV: &str = "WORKSPACES";
/// Single-workspace fallback source.
pub const WORKSPACE_ENV: &str = "WORKSPACE";
/// Id used when no source names a workspace.
pub const DEFAULT_WORKSPACE_ID: &str = "default";

/// Static configuration for a workspace. Immutable once registered.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkspaceConfig {
    pub id: String,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub enabled: bool,
    pub metadata: Metadata,
}

impl WorkspaceConfig {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: None,
            description: None,
            enabled: true,
            metadata: Metadata::new(),
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Display name, falling back to the id.
    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.id)
    }
}

/// Raw inputs the parser works from, already pulled out of the environment.
#[derive(Debug, Clone, Default)]
pub struct WorkspaceSource {
    /// Value of `WORKSPACES`, if set.
    pub workspaces: Option<String>,
    /// Explicit `--workspace` argument, else the value of `WORKSPACE`.
    pub workspace: Option<String>,
}

impl WorkspaceSource {
    /// Read both sources from the process environment. A non-empty explicit
    /// argument takes precedence over `WORKSPACE`.
    pub fn from_env(explicit: Option<&str>) -> Self {
        let workspace = explicit
            .filter(|value| !value.is_empty())
            .map(str::to_string)
            .or_else(|| std::env::var(WORKSPACE_ENV).ok());

        Self {
            workspaces: std::env::var(WORKSPACES_ENV).ok(),
            workspace,
        }
    }
}

/// Split a comma-separated id list, trimming pieces and dropping blanks.
pub fn parse_workspace_ids(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|id| !id.is_empty())
}

/// Derive workspace configurations from the process environment.
pub fn load_workspace_configs(explicit: Option<&str>) -> Vec<WorkspaceConfig> {
    parse_workspace_configs(&WorkspaceSource::from_env(explicit))
}

/// Derive workspace configurations from already-collected sources.
pub fn parse_workspace_configs(source: &WorkspaceSource) -> Vec<WorkspaceConfig> {
    let mut configs = Vec::new();

    if let Some(raw) = source.workspaces.as_deref().filter(|raw| !raw.is_empty()) {
        configs = parse_workspace_ids(raw).map(WorkspaceConfig::new).collect();
        if configs.is_empty() {
            warn!(value = %raw, "{WORKSPACES_ENV} is set but no valid workspace ids were parsed");
        }
    }

    if configs.is_empty() {
        let id = source
            .workspace
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .unwrap_or(DEFAULT_WORKSPACE_ID);
        configs.push(WorkspaceConfig::new(id));
    }

    dedup_by_id(configs)
}

fn dedup_by_id(configs: Vec<WorkspaceConfig>) -> Vec<WorkspaceConfig> {
    let mut seen = HashSet::new();
    configs
        .into_iter()
        .filter(|cfg| {
            if seen.insert(cfg.id.clone()) {
                true
            } else {
                warn!(workspace = %cfg.id, "Duplicate workspace id detected");
                false
            }
        })
        .collect()
}

/// Where each workspace keeps its engine storage and its input documents.
#[derive(Debug, Clone)]
pub struct StorageLayout {
    pub working_dir: PathBuf,
    pub input_dir: PathBuf,
}

impl StorageLayout {
    pub fn new(working_dir: impl Into<PathBuf>, input_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
            input_dir: input_dir.into(),
        }
    }

    /// Retrieval engine storage directory for a workspace.
    pub fn storage_dir(&self, workspace_id: &str) -> PathBuf {
        self.working_dir.join(dir_name(workspace_id))
    }

    /// Input document directory for a workspace.
    pub fn input_dir(&self, workspace_id: &str) -> PathBuf {
        self.input_dir.join(dir_name(workspace_id))
    }
}

impl Default for StorageLayout {
    fn default() -> Self {
        Self::new("./rag_storage", "./inputs")
    }
}

/// Ids are free-form. Percent-encoding keeps each one a single path
/// component and keeps distinct ids in distinct directories: every `%` in
/// the result starts an escape, so no two ids share a name.
fn dir_name(workspace_id: &str) -> String {
    let encoded = urlencoding::encode(workspace_id);
    // `.` is left as is by the encoder; a leading one would make `.`/`..`
    // resolve outside the root
    match encoded.strip_prefix('.') {
        Some(rest) => format!("%2E{rest}"),
        None => encoded.into_owned(),
    }
}
