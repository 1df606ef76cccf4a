//! Tool runner - manages and executes local functions

use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use crate::Result;
use crate::error::Error;
use crate::foundry::{FunctionSpec, ToolSpec};
use super::Tool;

/// Function tool definition advertised to the agent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

impl From<ToolDefinition> for ToolSpec {
    fn from(def: ToolDefinition) -> Self {
        ToolSpec::Function {
            function: FunctionSpec {
                name: def.name,
                description: def.description,
                parameters: def.parameters,
            },
        }
    }
}

/// Tool runner manages registered functions and executes them by name
pub struct ToolRunner {
    tools: BTreeMap<String, Box<dyn Tool>>,
}

impl ToolRunner {
    /// Create an empty tool runner
    pub fn new() -> Self {
        Self {
            tools: BTreeMap::new(),
        }
    }

    /// Register a tool
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        self.tools.insert(tool.name().to_string(), Box::new(tool));
    }

    /// Get tool definitions in name order
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values()
            .map(|t| t.to_definition())
            .collect()
    }

    /// Execute a tool by name
    pub async fn execute(&self, name: &str, params: Value) -> Result<Value> {
        let tool = self.tools.get(name)
            .ok_or_else(|| Error::Tool(format!("Unknown function: {}", name)))?;

        tool.execute(params).await
    }

    /// Check if a tool exists
    pub fn has(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// List registered tool names
    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }
}

impl Default for ToolRunner {
    fn default() -> Self {
        Self::new()
    }
}
