//! HTTP transport server using Axum.

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use ragspace_protocol::{
    HandlerResult, JSONRPC_VERSION, RequestId, RpcError, RpcResponse, WorkspaceList,
    WorkspaceSummary,
};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;
use tracing::{debug, info, warn};

/// What the transport needs from the workspace server.
pub trait RequestHandler: Send + Sync + 'static {
    /// Summaries of every registered workspace, in registration order.
    fn workspaces(&self) -> Vec<WorkspaceSummary>;

    /// Run one JSON-RPC call inside the workspace named by the route.
    fn handle_request(
        &self,
        workspace_id: &str,
        method: &str,
        params: Option<Value>,
    ) -> impl Future<Output = HandlerResult> + Send;
}

#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// 0 lets the OS pick a free port
    pub port: u16,
    pub hostname: String,
    /// Answer cross-origin requests with permissive CORS headers
    pub enable_cors: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            port: 9621,
            hostname: "127.0.0.1".into(),
            enable_cors: false,
        }
    }
}

/// A running HTTP listener. Dropping it without [`stop`](Self::stop) leaves
/// the serve task running until the runtime shuts down.
pub struct TransportServer {
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
    local_addr: SocketAddr,
}

impl TransportServer {
    pub async fn start<H: RequestHandler>(
        config: TransportConfig,
        handler: H,
    ) -> io::Result<Self> {
        Self::start_with_handler(config, Arc::new(handler)).await
    }

    /// Start serving with a shared handler, so the caller can still drive it
    /// once the listener is stopped.
    pub async fn start_with_handler<H: RequestHandler>(
        config: TransportConfig,
        handler: Arc<H>,
    ) -> io::Result<Self> {
        let mut app = Router::new()
            .route("/health", get(health::<H>))
            .route("/workspaces", get(list_workspaces::<H>))
            .route("/workspaces/{workspace_id}/rpc", post(rpc::<H>))
            .with_state(handler);
        if config.enable_cors {
            app = app.layer(CorsLayer::permissive());
        }

        let listener = TcpListener::bind((config.hostname.as_str(), config.port)).await?;
        let local_addr = listener.local_addr()?;
        info!("ragspace transport listening on http://{local_addr}");

        let (shutdown, signal) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let serve = axum::serve(listener, app).with_graceful_shutdown(async {
                signal.await.ok();
            });
            if let Err(e) = serve.await {
                warn!("HTTP server exited with error: {e}");
            }
        });

        Ok(Self {
            shutdown: Some(shutdown),
            task: Some(task),
            local_addr,
        })
    }

    pub fn port(&self) -> u16 {
        self.local_addr.port()
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting connections and wait for in-flight requests to finish.
    pub async fn stop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            shutdown.send(()).ok();
        }
        if let Some(task) = self.task.take() {
            task.await.ok();
        }
        info!("ragspace transport stopped");
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Routes
// ─────────────────────────────────────────────────────────────────────────────

async fn health<H: RequestHandler>(State(handler): State<Arc<H>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "workspaces": handler.workspaces().len(),
    }))
}

async fn list_workspaces<H: RequestHandler>(
    State(handler): State<Arc<H>>,
) -> Json<WorkspaceList> {
    Json(WorkspaceList {
        workspaces: handler.workspaces(),
    })
}

async fn rpc<H: RequestHandler>(
    State(handler): State<Arc<H>>,
    Path(workspace_id): Path<String>,
    body: String,
) -> (StatusCode, Json<RpcResponse>) {
    let call = match Envelope::parse(&body) {
        Ok(call) => call,
        Err((id, error)) => return reply_error(id, error),
    };

    debug!(workspace = %workspace_id, method = %call.method, "rpc request");
    match handler.handle_request(&workspace_id, &call.method, call.params).await {
        Ok(result) => {
            let id = call.id.unwrap_or(RequestId::Number(0));
            (StatusCode::OK, Json(RpcResponse::success(id, result)))
        }
        Err(error) => {
            if error.http_status() >= 500 {
                warn!(workspace = %workspace_id, method = %call.method, "rpc failed: {error}");
            }
            reply_error(call.id, error)
        }
    }
}

/// JSON-RPC errors carry their HTTP status: envelope problems answer 400,
/// unavailable workspaces 404, method-level failures stay 200.
fn reply_error(id: Option<RequestId>, error: RpcError) -> (StatusCode, Json<RpcResponse>) {
    let status = StatusCode::from_u16(error.http_status()).unwrap_or(StatusCode::OK);
    (status, Json(RpcResponse::error(id, error)))
}

/// The parts of a request body the handler needs.
struct Envelope {
    id: Option<RequestId>,
    method: String,
    params: Option<Value>,
}

impl Envelope {
    fn parse(body: &str) -> Result<Self, (Option<RequestId>, RpcError)> {
        let value: Value = serde_json::from_str(body)
            .map_err(|_| (None, RpcError::parse_error("Failed to parse JSON")))?;

        // Keep the id even for invalid requests so the error can echo it
        let id = value
            .get("id")
            .and_then(|id| serde_json::from_value::<RequestId>(id.clone()).ok());

        let version = value.get("jsonrpc").and_then(Value::as_str);
        match (version, value.get("method").and_then(Value::as_str)) {
            (Some(version), Some(method)) if version == JSONRPC_VERSION && !method.is_empty() => {
                Ok(Self {
                    id,
                    method: method.to_string(),
                    params: value.get("params").cloned(),
                })
            }
            _ => Err((id, RpcError::invalid_request("Invalid JSON-RPC 2.0 request"))),
        }
    }
}
