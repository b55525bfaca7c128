//! Document manager — owns a workspace's input directory.

use std::path::{Path, PathBuf};

use ragspace_protocol::{HandlerResult, RpcError};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use crate::{Engine, EngineError, parse_params};

/// Extensions accepted for upload and reported by `documents/list`.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["txt", "md", "json", "csv", "html"];

pub struct DocumentManager {
    input_dir: PathBuf,
}

impl DocumentManager {
    pub fn new(input_dir: PathBuf) -> Self {
        Self { input_dir }
    }

    pub fn input_dir(&self) -> &Path {
        &self.input_dir
    }

    pub fn is_supported(name: &str) -> bool {
        Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
    }

    /// Supported files in the input directory as `(name, size)`, sorted by name.
    /// A missing directory lists as empty.
    pub async fn list(&self) -> Result<Vec<(String, u64)>, RpcError> {
        let mut entries = match tokio::fs::read_dir(&self.input_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(RpcError::server_error(format!(
                    "Failed to read {}: {e}",
                    self.input_dir.display()
                )));
            }
        };

        let mut files = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| RpcError::server_error(format!("Failed to read entry: {e}")))?
        {
            let name = entry.file_name().to_string_lossy().to_string();
            if !Self::is_supported(&name) {
                continue;
            }
            match entry.metadata().await {
                Ok(meta) if meta.is_file() => files.push((name, meta.len())),
                _ => {}
            }
        }
        files.sort();
        Ok(files)
    }
}

impl Engine for DocumentManager {
    fn namespace(&self) -> &str {
        "documents"
    }

    async fn handle(&self, method: &str, params: Option<Value>) -> HandlerResult {
        match method {
            "documents/list" => {
                let documents: Vec<Value> = self
                    .list()
                    .await?
                    .into_iter()
                    .map(|(name, size)| json!({ "name": name, "size": size }))
                    .collect();
                Ok(json!({ "documents": documents }))
            }

            "documents/upload" => {
                let p: UploadParams = parse_params(params)?;
                if p.name.is_empty() || p.name.contains(['/', '\\']) || p.name.starts_with('.') {
                    let message = format!("Invalid document name: {}", p.name);
                    return Err(RpcError::invalid_params(message));
                }
                if !Self::is_supported(&p.name) {
                    return Err(RpcError::invalid_params(format!(
                        "Unsupported file type: {} (expected one of {})",
                        p.name,
                        SUPPORTED_EXTENSIONS.join(", ")
                    )));
                }

                if let Err(e) = tokio::fs::create_dir_all(&self.input_dir).await {
                    return Err(RpcError::server_error(format!("Failed to create directory: {e}")));
                }
                let path = self.input_dir.join(&p.name);
                match tokio::fs::write(&path, &p.content).await {
                    Ok(()) => {
                        debug!("Stored document {}", path.display());
                        Ok(json!({ "name": p.name, "size": p.content.len() }))
                    }
                    Err(e) => Err(RpcError::server_error(format!(
                        "Failed to write {}: {e}",
                        path.display()
                    ))),
                }
            }

            _ => Err(RpcError::method_not_found(method)),
        }
    }

    async fn initialize_storages(&self) -> Result<(), EngineError> {
        tokio::fs::create_dir_all(&self.input_dir)
            .await
            .map_err(|e| EngineError::io(&self.input_dir, e))
    }
}

#[derive(Deserialize)]
struct UploadParams {
    name: String,
    content: String,
}
