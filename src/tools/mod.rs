//! Tools module - local functions the remote agent can call
//!
//! A tool registered here is advertised to the platform as a function tool
//! and executed locally when a run asks for it.

mod runner;
mod sms;

pub use runner::{ToolRunner, ToolDefinition};
pub use sms::SendSmsTool;

use async_trait::async_trait;
use serde_json::Value;
use crate::Result;

/// Tool trait - interface for all local functions
#[async_trait]
pub trait Tool: Send + Sync {
    /// Function name used in tool calls
    fn name(&self) -> &str;

    /// Description shown to the model
    fn description(&self) -> &str;

    /// JSON Schema for parameters
    fn parameters(&self) -> Value;

    /// Execute the tool with parsed arguments, returning the output payload
    async fn execute(&self, params: Value) -> Result<Value>;

    /// Convert to tool definition for the agent
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters(),
        }
    }
}

/// Dummy tool for testing
#[cfg(test)]
pub struct DummyTool {
    pub name: String,
    pub result: Value,
}

#[cfg(test)]
#[async_trait]
impl Tool for DummyTool {
    fn name(&self) -> &str { &self.name }
    fn description(&self) -> &str { "Dummy tool for testing" }
    fn parameters(&self) -> Value { serde_json::json!({"type": "object"}) }

    async fn execute(&self, _params: Value) -> Result<Value> {
        Ok(self.result.clone())
    }
}
