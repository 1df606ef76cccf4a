//! Shared document index for file search.
//!
//! Reference documents are uploaded and indexed into one vector store per
//! process. Every agent holding a clone of [`SharedDocumentIndex`] sees the
//! same store, and the lock guarantees it is built at most once.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::foundry::{AgentsApi, FileSearchResources};

/// File extensions picked up from the documents directory.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["txt", "md", "pdf", "docx", "json", "csv"];

pub const VECTOR_STORE_NAME: &str = "email_agent_vectorstore";

#[derive(Debug, Default)]
struct IndexState {
    uploaded_files: Vec<String>,
    vector_store_id: Option<String>,
}

/// Reference-counted handle to the process-wide document index.
#[derive(Debug, Clone, Default)]
pub struct SharedDocumentIndex {
    state: Arc<Mutex<IndexState>>,
}

/// Supported files under `dir`, recursively, in path order.
pub fn discover(dir: &Path) -> Vec<PathBuf> {
    let base = glob::Pattern::escape(&dir.to_string_lossy());
    let mut found = BTreeSet::new();

    for ext in SUPPORTED_EXTENSIONS {
        let pattern = format!("{}/**/*.{}", base, ext);
        match glob::glob(&pattern) {
            Ok(paths) => found.extend(paths.filter_map(|entry| entry.ok())),
            Err(e) => warn!("Bad document pattern {}: {}", pattern, e),
        }
    }

    found.into_iter().filter(|p| p.is_file()).collect()
}

impl SharedDocumentIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// File-search resources for the index, building it on first use.
    ///
    /// Returns `None` when there is nothing to index or the build failed;
    /// a failed build is attempted again by the next caller.
    pub async fn ensure(&self, api: &dyn AgentsApi, dir: &Path) -> Option<FileSearchResources> {
        let mut state = self.state.lock().await;

        if let Some(id) = &state.vector_store_id {
            info!("Reusing existing shared file search index");
            return Some(FileSearchResources {
                vector_store_ids: vec![id.clone()],
            });
        }

        if !dir.is_dir() {
            info!("No {:?} directory found, skipping file search setup", dir);
            return None;
        }

        let paths = discover(dir);
        if paths.is_empty() {
            info!("No supported files found in {:?}", dir);
            return None;
        }

        info!("Found {} files to upload", paths.len());

        let mut file_ids = Vec::with_capacity(paths.len());
        for path in &paths {
            match api.upload_file(path).await {
                Ok(file) => {
                    info!("Uploaded file: {:?}", path.file_name().unwrap_or_default());
                    state.uploaded_files.push(file.id.clone());
                    file_ids.push(file.id);
                }
                Err(e) => warn!("Failed to upload {:?}: {}", path, e),
            }
        }

        if file_ids.is_empty() {
            return None;
        }

        match api.create_vector_store(VECTOR_STORE_NAME, &file_ids).await {
            Ok(store) => {
                info!("File search capability ready ({})", store.id);
                state.vector_store_id = Some(store.id.clone());
                Some(FileSearchResources {
                    vector_store_ids: vec![store.id],
                })
            }
            Err(e) => {
                error!("Error setting up file search: {}", e);
                None
            }
        }
    }

    pub async fn vector_store_id(&self) -> Option<String> {
        self.state.lock().await.vector_store_id.clone()
    }

    /// Ids of every file uploaded so far, including ones not yet indexed.
    pub async fn uploaded_files(&self) -> Vec<String> {
        self.state.lock().await.uploaded_files.clone()
    }
}
