//! Method name constants — every per-workspace JSON-RPC method grouped by
//! engine namespace.
//!
//! Each constant is the exact string sent over the wire as the `method`
//! field of a request posted to `/workspaces/{workspace_id}/rpc`.

/// All ragspace method names, grouped by engine namespace.
pub struct Methods;

impl Methods {
    // ── Retrieval engine ────────────────────────────────────────────────
    pub const RAG_INSERT: &str = "rag/insert";
    pub const RAG_QUERY: &str = "rag/query";
    pub const RAG_DELETE: &str = "rag/delete";
    pub const RAG_STATS: &str = "rag/stats";

    // ── Document manager ────────────────────────────────────────────────
    pub const DOCUMENTS_LIST: &str = "documents/list";
    pub const DOCUMENTS_UPLOAD: &str = "documents/upload";

    // ── Workspace ───────────────────────────────────────────────────────
    pub const WORKSPACE_INFO: &str = "workspace/info";
}

/// Namespace of the retrieval engine handle.
pub const RAG_NAMESPACE: &str = "rag";
/// Namespace of the document manager handle.
pub const DOCUMENTS_NAMESPACE: &str = "documents";

/// Returns true if the method belongs to a namespace some workspace handle
/// answers for.
pub fn is_known_method(method: &str) -> bool {
    let mut parts = method.splitn(2, '/');
    match (parts.next(), parts.next()) {
        (Some("rag" | "documents" | "workspace"), Some(rest)) => !rest.is_empty(),
        _ => false,
    }
}

/// Namespace prefix of a method (`"rag/query"` → `"rag"`).
pub fn namespace_of(method: &str) -> &str {
    method.split('/').next().unwrap_or("")
}
