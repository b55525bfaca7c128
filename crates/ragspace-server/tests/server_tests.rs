//! RagServer request handling and lifecycle.

mod common;

use std::sync::Arc;

use common::{MockEngine, Outcome, disabled, workspace, workspace_with};
use ragspace_protocol::{Methods, RpcErrorCode};
use ragspace_server::{
    RagServer, ServerState, StorageLayout, WorkspaceConfig, WorkspaceContext, WorkspaceRegistry,
};
use ragspace_transport::RequestHandler;
use serde_json::json;
use tempfile::TempDir;

fn server_with(contexts: Vec<WorkspaceContext>) -> RagServer {
    let registry = Arc::new(WorkspaceRegistry::new());
    for context in contexts {
        registry.register(context);
    }
    RagServer::new(registry)
}

fn bundled_server(dir: &TempDir, ids: &[&str]) -> RagServer {
    let layout = StorageLayout::new(dir.path().join("storage"), dir.path().join("inputs"));
    server_with(
        ids.iter()
            .map(|id| WorkspaceContext::with_bundled_engines(WorkspaceConfig::new(*id), &layout))
            .collect(),
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// Lifecycle
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn requests_before_initialize_are_refused() {
    let server = server_with(vec![workspace("docs").0]);
    assert_eq!(server.state(), ServerState::Uninitialized);

    let err = server.handle_request("docs", Methods::RAG_STATS, None).await.unwrap_err();
    assert_eq!(err.error_code(), RpcErrorCode::ServerNotInitialized);
    assert_eq!(err.http_status(), 503);
}

#[tokio::test]
async fn initialize_sets_up_every_workspace() {
    let (a, a_rag) = workspace("a");
    let (b, b_rag) = workspace_with(
        WorkspaceConfig::new("b"),
        MockEngine::new("rag").on_initialize(Outcome::Fail),
    );
    let server = server_with(vec![a, b]);

    server.initialize().await;

    assert_eq!(server.state(), ServerState::Running);
    assert_eq!(a_rag.initialize_calls(), 1);
    assert_eq!(b_rag.initialize_calls(), 1);

    let summaries = server.workspaces();
    assert!(summaries[0].enabled);
    assert!(!summaries[1].enabled);
    assert_eq!(
        summaries[1].error.as_deref(),
        Some("Failed to initialize workspace 'b': disk unavailable")
    );

    // The failed workspace answers as not found, with its own error text
    let err = server.handle_request("b", Methods::RAG_STATS, None).await.unwrap_err();
    assert_eq!(err.error_code(), RpcErrorCode::WorkspaceNotFound);
    assert_eq!(err.message, "Failed to initialize workspace 'b': disk unavailable");
}

#[tokio::test]
async fn panicking_workspace_does_not_stop_startup() {
    let (bad, _) = workspace_with(
        WorkspaceConfig::new("bad"),
        MockEngine::new("rag").on_initialize(Outcome::Panic),
    );
    let (good, good_rag) = workspace("good");
    let server = server_with(vec![bad, good]);

    server.initialize().await;

    assert_eq!(server.state(), ServerState::Running);
    assert_eq!(good_rag.initialize_calls(), 1);
    assert!(server.handle_request("good", Methods::RAG_STATS, None).await.is_ok());

    let err = server.handle_request("bad", Methods::RAG_STATS, None).await.unwrap_err();
    assert_eq!(err.error_code(), RpcErrorCode::WorkspaceNotFound);
    assert_eq!(err.message, "Failed to initialize workspace 'bad': initialize exploded");
}

#[tokio::test]
async fn shutdown_finalizes_once_and_refuses_requests() {
    let (ctx, rag) = workspace("docs");
    let server = server_with(vec![ctx]);
    server.initialize().await;

    server.shutdown().await;
    server.shutdown().await;

    assert_eq!(server.state(), ServerState::Shutdown);
    assert_eq!(rag.finalize_calls(), 1);

    let err = server.handle_request("docs", Methods::RAG_STATS, None).await.unwrap_err();
    assert_eq!(err.error_code(), RpcErrorCode::ServerShuttingDown);
    // Shutdown leaves the registry populated
    assert_eq!(server.registry().len(), 1);
}

// ─────────────────────────────────────────────────────────────────────────────
// Routing
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn requests_reach_the_named_workspace_engine() {
    let server = server_with(vec![workspace("a").0, workspace("b").0]);
    server.initialize().await;

    let result = server
        .handle_request("b", Methods::RAG_QUERY, Some(json!({ "query": "hello" })))
        .await
        .unwrap();
    assert_eq!(result["engine"], "rag");
    assert_eq!(result["method"], "rag/query");
    assert_eq!(result["params"]["query"], "hello");

    let result = server.handle_request("a", Methods::DOCUMENTS_LIST, None).await.unwrap();
    assert_eq!(result["engine"], "documents");
}

#[tokio::test]
async fn workspace_info_describes_the_bound_workspace() {
    let (ctx, _) = workspace_with(
        WorkspaceConfig::new("legal").with_display_name("Legal").with_metadata("region", "eu"),
        MockEngine::new("rag"),
    );
    let server = server_with(vec![ctx, workspace("other").0]);
    server.initialize().await;

    let info = server.handle_request("legal", Methods::WORKSPACE_INFO, None).await.unwrap();
    assert_eq!(info["id"], "legal");
    assert_eq!(info["display_name"], "Legal");
    assert_eq!(info["metadata"]["region"], "eu");
}

#[tokio::test]
async fn unknown_workspace_and_method_are_reported() {
    let server = server_with(vec![workspace("docs").0]);
    server.initialize().await;

    let err = server.handle_request("nope", Methods::RAG_STATS, None).await.unwrap_err();
    assert_eq!(err.error_code(), RpcErrorCode::WorkspaceNotFound);
    assert_eq!(err.message, "Workspace 'nope' not found");

    let err = server.handle_request("docs", "graph/query", None).await.unwrap_err();
    assert_eq!(err.error_code(), RpcErrorCode::MethodNotFound);

    // A bare namespace never reaches the engine that owns it
    for method in ["rag/", "rag", "documents/"] {
        let err = server.handle_request("docs", method, None).await.unwrap_err();
        assert_eq!(err.error_code(), RpcErrorCode::MethodNotFound, "{method}");
        assert_eq!(err.message, format!("Method not found: {method}"));
    }
}

#[tokio::test]
async fn disabled_workspace_is_not_initialized_or_served() {
    let (ctx, rag) = disabled("off");
    let server = server_with(vec![ctx]);
    server.initialize().await;

    assert_eq!(rag.initialize_calls(), 0);
    let err = server.handle_request("off", Methods::RAG_STATS, None).await.unwrap_err();
    assert_eq!(err.error_code(), RpcErrorCode::WorkspaceNotFound);
    assert_eq!(err.message, "Workspace 'off' is disabled");
}

// ─────────────────────────────────────────────────────────────────────────────
// Bundled engines
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn bundled_workspaces_keep_data_apart() {
    let dir = TempDir::new().unwrap();
    let server = bundled_server(&dir, &["alpha", "beta"]);
    server.initialize().await;

    server
        .handle_request(
            "alpha",
            Methods::RAG_INSERT,
            Some(json!({ "id": "c1", "text": "tokio task locals" })),
        )
        .await
        .unwrap();

    let alpha = server
        .handle_request("alpha", Methods::RAG_QUERY, Some(json!({ "query": "tokio" })))
        .await
        .unwrap();
    let beta = server
        .handle_request("beta", Methods::RAG_QUERY, Some(json!({ "query": "tokio" })))
        .await
        .unwrap();

    assert_eq!(alpha["matches"].as_array().unwrap().len(), 1);
    assert!(beta["matches"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn bundled_storage_survives_restart() {
    let dir = TempDir::new().unwrap();

    let server = bundled_server(&dir, &["docs"]);
    server.initialize().await;
    server
        .handle_request(
            "docs",
            Methods::RAG_INSERT,
            Some(json!({ "id": "kept", "text": "persisted across restarts" })),
        )
        .await
        .unwrap();
    server.shutdown().await;

    assert!(dir.path().join("storage/docs/kv_store_chunks.json").exists());

    let restarted = bundled_server(&dir, &["docs"]);
    restarted.initialize().await;
    let stats = restarted.handle_request("docs", Methods::RAG_STATS, None).await.unwrap();
    assert_eq!(stats["chunks"], 1);
}

#[tokio::test]
async fn similar_ids_never_share_storage() {
    let dir = TempDir::new().unwrap();
    let ids = ["a/b", "a_b", "..", "__"];

    let server = bundled_server(&dir, &ids);
    server.initialize().await;
    for id in ids {
        server
            .handle_request(id, Methods::RAG_INSERT, Some(json!({ "id": id, "text": "shared" })))
            .await
            .unwrap();
    }
    server.shutdown().await;

    let restarted = bundled_server(&dir, &ids);
    restarted.initialize().await;
    for id in ids {
        let found = restarted
            .handle_request(id, Methods::RAG_QUERY, Some(json!({ "query": "shared" })))
            .await
            .unwrap();
        let matches = found["matches"].as_array().unwrap();
        assert_eq!(matches.len(), 1, "{id}");
        assert_eq!(matches[0]["id"], id);
    }
    // Nothing escaped the storage root
    assert!(!dir.path().join("kv_store_chunks.json").exists());
}
