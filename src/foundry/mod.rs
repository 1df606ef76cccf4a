//! Agent platform API abstraction.
//!
//! This module provides:
//! - [`AgentsApi`] trait covering agents, threads, runs, files and vector stores
//! - [`FoundryClient`], the REST implementation
//! - Wire types shared by every caller

mod client;
mod types;

#[cfg(test)]
pub(crate) mod fake;

use std::path::Path;

use async_trait::async_trait;

use crate::Result;

pub use client::FoundryClient;
pub use types::*;

/// Remote agent-management API.
///
/// Everything the agents do against the platform goes through this trait,
/// so tests can swap in a scripted implementation.
#[async_trait]
pub trait AgentsApi: Send + Sync {
    async fn create_agent(&self, definition: &AgentDefinition) -> Result<RemoteAgent>;

    async fn create_thread(&self) -> Result<AgentThread>;

    async fn create_message(
        &self,
        thread_id: &str,
        role: MessageRole,
        content: &str,
    ) -> Result<ThreadMessage>;

    async fn create_run(&self, thread_id: &str, agent_id: &str) -> Result<Run>;

    async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<Run>;

    /// Submit all outputs for one requires-action episode in a single call.
    async fn submit_tool_outputs(
        &self,
        thread_id: &str,
        run_id: &str,
        outputs: &[ToolOutput],
    ) -> Result<Run>;

    async fn list_messages(&self, thread_id: &str, order: ListOrder) -> Result<Vec<ThreadMessage>>;

    /// Upload a document for agent use and wait until it is processed.
    async fn upload_file(&self, path: &Path) -> Result<UploadedFile>;

    /// Create a vector store over uploaded files and wait until indexing ends.
    async fn create_vector_store(&self, name: &str, file_ids: &[String]) -> Result<VectorStore>;

    async fn get_connection(&self, name: &str) -> Result<Connection>;
}
