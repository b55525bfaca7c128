//! ragspace engine implementations
//!
//! Every workspace owns one retrieval engine (`rag`) and one document
//! manager. Both implement the [`Engine`] trait and answer one namespace of
//! JSON-RPC methods. The server never looks inside an engine: it routes
//! requests by namespace and drives the storage lifecycle through
//! `initialize_storages` / `finalize_storages`.

pub mod documents;
pub mod rag;

use std::path::PathBuf;

use ragspace_protocol::{HandlerResult, RpcError};
use serde::Deserialize;
use serde_json::Value;

pub use documents::DocumentManager;
pub use rag::KeywordRag;

/// Failure raised by an engine's storage lifecycle.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("storage I/O failed at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt storage file {}: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0}")]
    Other(String),
}

impl EngineError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}

/// Trait implemented by every per-workspace engine.
///
/// Each engine handles a namespace of methods (e.g. "rag/*", "documents/*").
/// The workspace router picks the engine by the method's prefix and passes
/// the full method string through.
pub trait Engine: Send + Sync {
    /// The namespace prefix this engine handles (e.g. "rag").
    fn namespace(&self) -> &str;

    /// Handle a JSON-RPC request within this engine's namespace.
    fn handle(
        &self,
        method: &str,
        params: Option<Value>,
    ) -> impl std::future::Future<Output = HandlerResult> + Send;

    /// Prepare storages. Called once before the workspace accepts requests.
    fn initialize_storages(
        &self,
    ) -> impl std::future::Future<Output = Result<(), EngineError>> + Send {
        async { Ok(()) }
    }

    /// Flush and release storages. Called once at server shutdown.
    fn finalize_storages(
        &self,
    ) -> impl std::future::Future<Output = Result<(), EngineError>> + Send {
        async { Ok(()) }
    }
}

pub(crate) fn parse_params<T: for<'de> Deserialize<'de>>(
    params: Option<Value>,
) -> Result<T, RpcError> {
    match params {
        Some(v) => serde_json::from_value(v)
            .map_err(|e| RpcError::invalid_params(format!("Invalid parameters: {e}"))),
        None => Err(RpcError::invalid_params("Parameters required")),
    }
}
