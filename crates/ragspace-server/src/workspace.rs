//! Workspace context — runtime state for a single workspace.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;
use ragspace_protocol::methods::{self, DOCUMENTS_NAMESPACE, RAG_NAMESPACE};
use ragspace_protocol::{HandlerResult, RpcError, WorkspaceSummary};
use ragspace_services::{DocumentManager, EngineError, KeywordRag};
use serde_json::Value;

use crate::config::{StorageLayout, WorkspaceConfig};
use crate::engine::EngineHandle;

/// Pairs a workspace's static configuration with its live engine handles.
///
/// Shared as `Arc<WorkspaceContext>` between the registry and every request
/// bound to it, so the mutable parts (`initialized`, `error`) use interior
/// mutability. Once `error` is set the workspace is unavailable regardless
/// of `config.enabled`.
#[derive(Debug)]
pub struct WorkspaceContext {
    config: WorkspaceConfig,
    rag: EngineHandle,
    document_manager: EngineHandle,
    initialized: AtomicBool,
    error: RwLock<Option<String>>,
}

impl WorkspaceContext {
    pub fn new(config: WorkspaceConfig, rag: EngineHandle, document_manager: EngineHandle) -> Self {
        Self {
            config,
            rag,
            document_manager,
            initialized: AtomicBool::new(false),
            error: RwLock::new(None),
        }
    }

    /// Build a context backed by the bundled keyword engine and document
    /// manager, rooted at the layout's per-workspace directories.
    pub fn with_bundled_engines(config: WorkspaceConfig, layout: &StorageLayout) -> Self {
        let rag = KeywordRag::new(layout.storage_dir(&config.id));
        let documents = DocumentManager::new(layout.input_dir(&config.id));
        Self::new(config, EngineHandle::new(rag), EngineHandle::new(documents))
    }

    pub fn id(&self) -> &str {
        &self.config.id
    }

    pub fn config(&self) -> &WorkspaceConfig {
        &self.config
    }

    pub fn rag(&self) -> &EngineHandle {
        &self.rag
    }

    pub fn document_manager(&self) -> &EngineHandle {
        &self.document_manager
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    pub fn mark_initialized(&self) {
        self.initialized.store(true, Ordering::Release);
    }

    pub fn error(&self) -> Option<String> {
        self.error.read().clone()
    }

    /// Put the workspace into the error state. Requests are refused from
    /// here on with `message` as the reason.
    pub fn set_error(&self, message: impl Into<String>) {
        *self.error.write() = Some(message.into());
    }

    pub fn is_available(&self) -> bool {
        self.config.enabled && self.error.read().is_none()
    }

    pub fn summary(&self) -> WorkspaceSummary {
        let error = self.error();
        WorkspaceSummary {
            id: self.config.id.clone(),
            display_name: self.config.display_name().to_string(),
            description: self.config.description.clone(),
            enabled: self.config.enabled && error.is_none(),
            error,
            metadata: self.config.metadata.clone(),
        }
    }

    /// Set up both engine handles. On success the workspace is marked
    /// initialized; on failure the error is recorded on the context.
    pub async fn initialize(&self) -> Result<(), EngineError> {
        let result = match self.rag.initialize_storages().await {
            Ok(()) => self.document_manager.initialize_storages().await,
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => {
                self.mark_initialized();
                Ok(())
            }
            Err(e) => {
                self.set_error(format!("Failed to initialize workspace '{}': {e}", self.id()));
                Err(e)
            }
        }
    }

    /// Route a request to the engine owning the method's namespace.
    pub async fn route(&self, method: &str, params: Option<Value>) -> HandlerResult {
        if !methods::is_known_method(method) {
            return Err(RpcError::method_not_found(method));
        }
        match methods::namespace_of(method) {
            RAG_NAMESPACE => self.rag.handle(method, params).await,
            DOCUMENTS_NAMESPACE => self.document_manager.handle(method, params).await,
            "workspace" if method == methods::Methods::WORKSPACE_INFO => {
                serde_json::to_value(self.summary())
                    .map_err(|e| RpcError::internal(format!("Failed to encode summary: {e}")))
            }
            _ => Err(RpcError::method_not_found(method)),
        }
    }
}
