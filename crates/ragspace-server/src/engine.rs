//! Type-erased engine handles held by a workspace context.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use ragspace_protocol::HandlerResult;
use ragspace_services::{Engine, EngineError};
use serde_json::Value;

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Object-safe wrapper for the Engine trait.
trait EngineDyn: Send + Sync {
    fn namespace_dyn(&self) -> &str;
    fn handle_dyn<'a>(
        &'a self,
        method: &'a str,
        params: Option<Value>,
    ) -> BoxFuture<'a, HandlerResult>;
    fn initialize_dyn(&self) -> BoxFuture<'_, Result<(), EngineError>>;
    fn finalize_dyn(&self) -> BoxFuture<'_, Result<(), EngineError>>;
}

impl<T: Engine> EngineDyn for T {
    fn namespace_dyn(&self) -> &str {
        self.namespace()
    }
    fn handle_dyn<'a>(
        &'a self,
        method: &'a str,
        params: Option<Value>,
    ) -> BoxFuture<'a, HandlerResult> {
        Box::pin(self.handle(method, params))
    }
    fn initialize_dyn(&self) -> BoxFuture<'_, Result<(), EngineError>> {
        Box::pin(self.initialize_storages())
    }
    fn finalize_dyn(&self) -> BoxFuture<'_, Result<(), EngineError>> {
        Box::pin(self.finalize_storages())
    }
}

/// Shared handle to one engine of a workspace (`rag` or `document_manager`).
///
/// The server only needs the narrow capability surface: route a request,
/// set up storages, finalize storages. Concrete engine types stay pluggable.
#[derive(Clone)]
pub struct EngineHandle {
    inner: Arc<dyn EngineDyn>,
}

impl EngineHandle {
    pub fn new<E: Engine + 'static>(engine: E) -> Self {
        Self { inner: Arc::new(engine) }
    }

    /// Wrap an engine the caller keeps a typed reference to.
    pub fn from_arc<E: Engine + 'static>(engine: Arc<E>) -> Self {
        Self { inner: engine }
    }

    pub fn namespace(&self) -> &str {
        self.inner.namespace_dyn()
    }

    pub async fn handle(&self, method: &str, params: Option<Value>) -> HandlerResult {
        self.inner.handle_dyn(method, params).await
    }

    pub async fn initialize_storages(&self) -> Result<(), EngineError> {
        self.inner.initialize_dyn().await
    }

    pub async fn finalize_storages(&self) -> Result<(), EngineError> {
        self.inner.finalize_dyn().await
    }
}

impl std::fmt::Debug for EngineHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineHandle")
            .field("namespace", &self.namespace())
            .finish()
    }
}
