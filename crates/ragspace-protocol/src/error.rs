//! Wire error type and standard JSON-RPC 2.0 error codes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Error codes ragspace answers with. Any other code round-trips as `Custom`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RpcErrorCode {
    ParseError,
    InvalidRequest,
    MethodNotFound,
    InvalidParams,
    InternalError,
    ServerError,
    ServerNotInitialized,
    ServerShuttingDown,
    /// Unknown, disabled or failed workspace.
    WorkspaceNotFound,
    Custom(i32),
}

/// JSON-RPC 2.0 reserved codes followed by the server range (-32000..-32099).
const KNOWN_CODES: &[(RpcErrorCode, i32)] = &[
    (RpcErrorCode::ParseError, -32700),
    (RpcErrorCode::InvalidRequest, -32600),
    (RpcErrorCode::MethodNotFound, -32601),
    (RpcErrorCode::InvalidParams, -32602),
    (RpcErrorCode::InternalError, -32603),
    (RpcErrorCode::ServerError, -32000),
    (RpcErrorCode::ServerNotInitialized, -32001),
    (RpcErrorCode::ServerShuttingDown, -32002),
    (RpcErrorCode::WorkspaceNotFound, -32004),
];

impl RpcErrorCode {
    pub fn code(self) -> i32 {
        match self {
            Self::Custom(code) => code,
            known => KNOWN_CODES
                .iter()
                .find(|(variant, _)| *variant == known)
                .map_or(-32603, |(_, code)| *code),
        }
    }

    pub fn from_code(code: i32) -> Self {
        KNOWN_CODES
            .iter()
            .find(|(_, known)| *known == code)
            .map_or(Self::Custom(code), |(variant, _)| *variant)
    }

    /// HTTP status a transport should answer with when a request fails with
    /// this code. Method-level failures stay `200` as JSON-RPC errors; only
    /// failures about the request envelope or the workspace itself change it.
    pub fn http_status(self) -> u16 {
        match self {
            Self::ParseError | Self::InvalidRequest => 400,
            Self::WorkspaceNotFound => 404,
            Self::InternalError => 500,
            Self::ServerNotInitialized | Self::ServerShuttingDown => 503,
            _ => 200,
        }
    }
}

/// The `error` member of a failed JSON-RPC response. The code is kept raw
/// so unknown codes from peers survive a round trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcError {
    pub fn new(code: RpcErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code.code(),
            message: message.into(),
            data: None,
        }
    }

    /// Attach structured detail under `data`.
    pub fn with_data(self, data: Value) -> Self {
        Self { data: Some(data), ..self }
    }

    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::new(RpcErrorCode::ParseError, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(RpcErrorCode::InvalidRequest, message)
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::new(RpcErrorCode::MethodNotFound, format!("Method not found: {method}"))
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(RpcErrorCode::InvalidParams, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(RpcErrorCode::InternalError, message)
    }

    pub fn server_error(message: impl Into<String>) -> Self {
        Self::new(RpcErrorCode::ServerError, message)
    }

    pub fn not_initialized() -> Self {
        Self::new(RpcErrorCode::ServerNotInitialized, "Server is not initialized")
    }

    pub fn shutting_down() -> Self {
        Self::new(RpcErrorCode::ServerShuttingDown, "Server is shutting down")
    }

    /// The message is surfaced verbatim: it is either the workspace's own
    /// error text or a generic "not found" / "disabled" sentence.
    pub fn workspace_not_found(message: impl Into<String>) -> Self {
        Self::new(RpcErrorCode::WorkspaceNotFound, message)
    }

    pub fn error_code(&self) -> RpcErrorCode {
        RpcErrorCode::from_code(self.code)
    }

    pub fn http_status(&self) -> u16 {
        self.error_code().http_status()
    }
}

impl std::fmt::Display for RpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RPC Error [{}]: {}", self.code, self.message)
    }
}

impl std::error::Error for RpcError {}
