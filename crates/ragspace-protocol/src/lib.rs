//! ragspace protocol types
//!
//! JSON-RPC 2.0 compatible types shared by the server, the engines and the
//! HTTP transport. This crate is the single source of truth for method
//! names, error codes and the workspace summary wire format.

pub mod error;
pub mod jsonrpc;
pub mod methods;
pub mod workspace;

pub use error::{RpcError, RpcErrorCode};
pub use jsonrpc::{
    HandlerResult, JSONRPC_VERSION, RequestId, RpcErrorResponse, RpcRequest, RpcResponse,
    RpcSuccessResponse,
};
pub use methods::Methods;
pub use workspace::{Metadata, WorkspaceList, WorkspaceSummary};
