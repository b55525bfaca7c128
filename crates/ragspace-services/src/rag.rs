//! Keyword retrieval engine — the bundled `rag` handle of a workspace.
//!
//! Chunks live in memory and are persisted to `kv_store_chunks.json` inside
//! the workspace's storage directory. Storage is loaded by
//! `initialize_storages` and flushed by `finalize_storages`; nothing touches
//! disk in between.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use ragspace_protocol::{HandlerResult, RpcError};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::{Engine, EngineError, parse_params};

/// File name of the persisted chunk store.
pub const CHUNK_STORE_FILE: &str = "kv_store_chunks.json";

const DEFAULT_TOP_K: usize = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Chunk {
    id: String,
    text: String,
    created_at: DateTime<Utc>,
}

/// In-memory keyword index scoped to one storage directory.
pub struct KeywordRag {
    storage_dir: PathBuf,
    chunks: RwLock<Vec<Chunk>>,
}

impl KeywordRag {
    pub fn new(storage_dir: PathBuf) -> Self {
        Self {
            storage_dir,
            chunks: RwLock::new(Vec::new()),
        }
    }

    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    fn store_path(&self) -> PathBuf {
        self.storage_dir.join(CHUNK_STORE_FILE)
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.read().len()
    }

    /// Insert or replace a chunk. Returns `true` when the id was new.
    pub fn insert(&self, id: String, text: String) -> bool {
        let mut chunks = self.chunks.write();
        if let Some(existing) = chunks.iter_mut().find(|c| c.id == id) {
            existing.text = text;
            return false;
        }
        chunks.push(Chunk {
            id,
            text,
            created_at: Utc::now(),
        });
        true
    }

    pub fn delete(&self, id: &str) -> bool {
        let mut chunks = self.chunks.write();
        let before = chunks.len();
        chunks.retain(|c| c.id != id);
        chunks.len() != before
    }

    /// Rank chunks by how many distinct query terms they contain.
    /// Equal scores keep insertion order; chunks sharing no term are dropped.
    pub fn query(&self, query: &str, top_k: usize) -> Vec<(String, usize, String)> {
        let wanted = terms(query);
        if wanted.is_empty() {
            return Vec::new();
        }

        let chunks = self.chunks.read();
        let mut scored: Vec<(usize, &Chunk)> = chunks
            .iter()
            .filter_map(|chunk| {
                let have = terms(&chunk.text);
                let score = wanted.iter().filter(|t| have.contains(*t)).count();
                (score > 0).then_some((score, chunk))
            })
            .collect();
        // sort_by is stable, so ties stay in insertion order
        scored.sort_by(|a, b| b.0.cmp(&a.0));

        scored
            .into_iter()
            .take(top_k)
            .map(|(score, c)| (c.id.clone(), score, c.text.clone()))
            .collect()
    }
}

fn terms(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

impl Engine for KeywordRag {
    fn namespace(&self) -> &str {
        "rag"
    }

    async fn handle(&self, method: &str, params: Option<Value>) -> HandlerResult {
        match method {
            "rag/insert" => {
                let p: InsertParams = parse_params(params)?;
                if p.text.trim().is_empty() {
                    return Err(RpcError::invalid_params("Text must not be empty"));
                }
                let id = p.id.unwrap_or_else(|| format!("chunk-{}", uuid::Uuid::new_v4()));
                let created = self.insert(id.clone(), p.text);
                debug!("rag/insert {id} (created: {created})");
                Ok(json!({ "id": id, "created": created }))
            }

            "rag/query" => {
                let p: QueryParams = parse_params(params)?;
                let top_k = p.top_k.unwrap_or(DEFAULT_TOP_K);
                let matches: Vec<Value> = self
                    .query(&p.query, top_k)
                    .into_iter()
                    .map(|(id, score, text)| json!({ "id": id, "score": score, "text": text }))
                    .collect();
                Ok(json!({ "matches": matches }))
            }

            "rag/delete" => {
                let p: DeleteParams = parse_params(params)?;
                Ok(json!({ "deleted": self.delete(&p.id) }))
            }

            "rag/stats" => Ok(json!({
                "chunks": self.chunk_count(),
                "storageDir": self.storage_dir.display().to_string(),
            })),

            _ => Err(RpcError::method_not_found(method)),
        }
    }

    async fn initialize_storages(&self) -> Result<(), EngineError> {
        tokio::fs::create_dir_all(&self.storage_dir)
            .await
            .map_err(|e| EngineError::io(&self.storage_dir, e))?;

        let path = self.store_path();
        let loaded: Vec<Chunk> = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|source| EngineError::Corrupt { path: path.clone(), source })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(EngineError::io(&path, e)),
        };

        info!("Loaded {} chunks from {}", loaded.len(), path.display());
        *self.chunks.write() = loaded;
        Ok(())
    }

    async fn finalize_storages(&self) -> Result<(), EngineError> {
        // Serialize under the lock, write without it
        let bytes = {
            let chunks = self.chunks.read();
            serde_json::to_vec_pretty(&*chunks)
                .map_err(|e| EngineError::Other(format!("Failed to encode chunk store: {e}")))?
        };

        tokio::fs::create_dir_all(&self.storage_dir)
            .await
            .map_err(|e| EngineError::io(&self.storage_dir, e))?;
        let path = self.store_path();
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| EngineError::io(&path, e))?;

        info!("Flushed {} chunks to {}", self.chunk_count(), path.display());
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Params
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct InsertParams {
    text: String,
    #[serde(default)]
    id: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryParams {
    query: String,
    #[serde(default)]
    top_k: Option<usize>,
}

#[derive(Deserialize)]
struct DeleteParams {
    id: String,
}
