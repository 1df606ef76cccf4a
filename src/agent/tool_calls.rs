//! Tool-call handling for runs waiting on outputs.

use std::collections::HashSet;

use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::foundry::{AgentsApi, Run, RunState, ToolCall, ToolOutput};
use crate::tools::ToolRunner;
use crate::Result;

/// Kind tag the platform uses for locally executed functions.
const FUNCTION_KIND: &str = "function";

/// Executes pending tool calls and submits their outputs in one batch.
pub struct ToolCallHandler<'a> {
    api: &'a dyn AgentsApi,
    functions: &'a ToolRunner,
}

impl<'a> ToolCallHandler<'a> {
    pub fn new(api: &'a dyn AgentsApi, functions: &'a ToolRunner) -> Self {
        Self { api, functions }
    }

    /// Satisfy every pending call of `run`, returning how many outputs were
    /// submitted. A run with nothing pending is left alone.
    pub async fn handle(&self, run: &Run, thread_id: &str) -> Result<usize> {
        let calls = match run.state() {
            RunState::RequiresAction(Some(calls)) if !calls.is_empty() => calls,
            _ => {
                warn!("Run {} has no pending tool calls", run.id);
                return Ok(0);
            }
        };

        let outputs = self.collect_outputs(calls).await;
        self.api
            .submit_tool_outputs(thread_id, &run.id, &outputs)
            .await?;

        info!("Submitted {} tool outputs for run {}", outputs.len(), run.id);
        Ok(outputs.len())
    }

    /// One output per distinct call id, in the order received.
    pub async fn collect_outputs(&self, calls: &[ToolCall]) -> Vec<ToolOutput> {
        let mut seen = HashSet::new();
        let mut outputs = Vec::with_capacity(calls.len());

        for call in calls {
            if !seen.insert(call.id.as_str()) {
                warn!("Ignoring repeated tool call id {}", call.id);
                continue;
            }
            outputs.push(ToolOutput {
                tool_call_id: call.id.clone(),
                output: self.execute(call).await.to_string(),
            });
        }

        outputs
    }

    async fn execute(&self, call: &ToolCall) -> Value {
        if call.kind != FUNCTION_KIND {
            debug!("Built-in tool {} needs no local output", call.kind);
            return json!({});
        }

        let Some(function) = &call.function else {
            return json!({"error": "Function call carried no function payload"});
        };

        if !self.functions.has(&function.name) {
            warn!("Unknown function requested: {}", function.name);
            return json!({"error": format!("Unknown function: {}", function.name)});
        }

        let args = match parse_arguments(&function.arguments) {
            Ok(args) => args,
            Err(reason) => {
                return json!({
                    "error": format!("Invalid arguments for {}: {}", function.name, reason)
                });
            }
        };

        info!("🔧 Executing function: {} with args: {}", function.name, args);

        match self.functions.execute(&function.name, args).await {
            Ok(result) => {
                debug!("Function {} returned {}", function.name, result);
                result
            }
            Err(e) => json!({"success": false, "error": e.to_string()}),
        }
    }
}

fn parse_arguments(raw: &str) -> std::result::Result<Value, String> {
    if raw.trim().is_empty() {
        return Ok(json!({}));
    }
    match serde_json::from_str::<Value>(raw) {
        Ok(value @ Value::Object(_)) => Ok(value),
        Ok(_) => Err("expected a JSON object".to_string()),
        Err(e) => Err(e.to_string()),
    }
}
