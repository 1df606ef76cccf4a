//! What distinguishes one agent from another.

use async_trait::async_trait;

use super::context::AgentContext;
use crate::foundry::{AgentDefinition, AgentsApi};
use crate::tools::ToolRunner;
use crate::Result;

/// Everything an agent variant contributes on top of the shared lifecycle:
/// its remote definition, the local functions it answers, and an optional
/// post-processing step for the final reply.
#[async_trait]
pub trait AgentProfile: Send + Sync {
    /// Remote agent name
    fn name(&self) -> &str;

    /// Local functions the remote agent may call
    fn functions(&self) -> &ToolRunner;

    /// Build the definition submitted when the remote agent is created.
    async fn define(&self, ctx: &AgentContext, api: &dyn AgentsApi) -> Result<AgentDefinition>;

    /// Note appended below the final reply, if any.
    async fn annotate(&self, _reply: &str) -> Option<String> {
        None
    }
}
