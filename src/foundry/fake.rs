//! Scripted in-memory agent platform for tests.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::Error;
use crate::Result;

use super::types::*;
use super::AgentsApi;

/// One scripted answer to `get_run`.
pub enum Poll {
    Run(Run),
    Fail(String),
}

pub struct ScriptedApi {
    polls: Mutex<VecDeque<Poll>>,
    /// Returned once the script is exhausted
    fallback: Option<Run>,
    /// Thread history, oldest first
    messages: Mutex<Vec<ThreadMessage>>,
    /// Posted by the assistant as each run completes
    pending_replies: Mutex<VecDeque<String>>,
    pub get_run_calls: AtomicUsize,
    pub agents_created: Mutex<Vec<AgentDefinition>>,
    pub threads_created: AtomicUsize,
    pub submitted: Mutex<Vec<Vec<ToolOutput>>>,
    pub uploads: Mutex<Vec<PathBuf>>,
    pub vector_stores_created: AtomicUsize,
    fail_submit: bool,
    connection: Option<Connection>,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self {
            polls: Mutex::new(VecDeque::new()),
            fallback: None,
            messages: Mutex::new(Vec::new()),
            pending_replies: Mutex::new(VecDeque::new()),
            get_run_calls: AtomicUsize::new(0),
            agents_created: Mutex::new(Vec::new()),
            threads_created: AtomicUsize::new(0),
            submitted: Mutex::new(Vec::new()),
            uploads: Mutex::new(Vec::new()),
            vector_stores_created: AtomicUsize::new(0),
            fail_submit: false,
            connection: None,
        }
    }

    pub fn with_polls(self, polls: Vec<Poll>) -> Self {
        *self.polls.lock().unwrap() = polls.into();
        self
    }

    pub fn with_runs(self, runs: Vec<Run>) -> Self {
        self.with_polls(runs.into_iter().map(Poll::Run).collect())
    }

    pub fn always(mut self, run: Run) -> Self {
        self.fallback = Some(run);
        self
    }

    /// Queue the assistant message posted when the next run completes.
    pub fn with_assistant_reply(self, text: &str) -> Self {
        self.pending_replies.lock().unwrap().push_back(text.to_string());
        self
    }

    /// Append a message to the history without going through a run.
    pub fn with_history(self, role: MessageRole, text: &str) -> Self {
        self.messages.lock().unwrap().push(message(role, text));
        self
    }

    pub fn with_connection(mut self, id: &str) -> Self {
        self.connection = Some(Connection {
            id: id.to_string(),
            name: None,
        });
        self
    }

    pub fn failing_submit(mut self) -> Self {
        self.fail_submit = true;
        self
    }

    pub fn polls(&self) -> usize {
        self.get_run_calls.load(Ordering::SeqCst)
    }

    pub fn submissions(&self) -> Vec<Vec<ToolOutput>> {
        self.submitted.lock().unwrap().clone()
    }
}

pub fn run(status: RunStatus) -> Run {
    Run {
        id: "run_1".to_string(),
        thread_id: Some("thread_1".to_string()),
        status,
        last_error: None,
        required_action: None,
        usage: None,
    }
}

pub fn requires(calls: Vec<ToolCall>) -> Run {
    Run {
        required_action: Some(RequiredAction::SubmitToolOutputs {
            submit_tool_outputs: SubmitToolOutputs { tool_calls: calls },
        }),
        ..run(RunStatus::RequiresAction)
    }
}

pub fn function_call(id: &str, name: &str, arguments: &str) -> ToolCall {
    ToolCall {
        id: id.to_string(),
        kind: "function".to_string(),
        function: Some(FunctionCall {
            name: name.to_string(),
            arguments: arguments.to_string(),
        }),
    }
}

pub fn builtin_call(id: &str, kind: &str) -> ToolCall {
    ToolCall {
        id: id.to_string(),
        kind: kind.to_string(),
        function: None,
    }
}

pub fn message(role: MessageRole, text: &str) -> ThreadMessage {
    ThreadMessage {
        id: format!("msg_{}", uuid::Uuid::new_v4()),
        role,
        content: vec![MessageContent::Text {
            text: TextContent {
                value: text.to_string(),
            },
        }],
    }
}

#[async_trait]
impl AgentsApi for ScriptedApi {
    async fn create_agent(&self, definition: &AgentDefinition) -> Result<RemoteAgent> {
        self.agents_created.lock().unwrap().push(definition.clone());
        Ok(RemoteAgent {
            id: "asst_1".to_string(),
            name: Some(definition.name.clone()),
            model: Some(definition.model.clone()),
        })
    }

    async fn create_thread(&self) -> Result<AgentThread> {
        let n = self.threads_created.fetch_add(1, Ordering::SeqCst);
        Ok(AgentThread {
            id: format!("thread_{}", n + 1),
        })
    }

    async fn create_message(
        &self,
        _thread_id: &str,
        role: MessageRole,
        content: &str,
    ) -> Result<ThreadMessage> {
        let msg = message(role, content);
        self.messages.lock().unwrap().push(msg.clone());
        Ok(msg)
    }

    async fn create_run(&self, _thread_id: &str, _agent_id: &str) -> Result<Run> {
        Ok(run(RunStatus::Queued))
    }

    async fn get_run(&self, _thread_id: &str, _run_id: &str) -> Result<Run> {
        self.get_run_calls.fetch_add(1, Ordering::SeqCst);
        let next = self.polls.lock().unwrap().pop_front();
        let run = match next {
            Some(Poll::Run(run)) => run,
            Some(Poll::Fail(message)) => {
                return Err(Error::Api {
                    status: 503,
                    message,
                })
            }
            None => self
                .fallback
                .clone()
                .ok_or_else(|| Error::Other("poll script exhausted".to_string()))?,
        };

        if run.status == RunStatus::Completed {
            if let Some(text) = self.pending_replies.lock().unwrap().pop_front() {
                self.messages
                    .lock()
                    .unwrap()
                    .push(message(MessageRole::Assistant, &text));
            }
        }
        Ok(run)
    }

    async fn submit_tool_outputs(
        &self,
        _thread_id: &str,
        _run_id: &str,
        outputs: &[ToolOutput],
    ) -> Result<Run> {
        if self.fail_submit {
            return Err(Error::Api {
                status: 400,
                message: "run is not awaiting outputs".to_string(),
            });
        }
        self.submitted.lock().unwrap().push(outputs.to_vec());
        Ok(run(RunStatus::Queued))
    }

    async fn list_messages(&self, _thread_id: &str, order: ListOrder) -> Result<Vec<ThreadMessage>> {
        let mut messages = self.messages.lock().unwrap().clone();
        if order == ListOrder::Descending {
            messages.reverse();
        }
        Ok(messages)
    }

    async fn upload_file(&self, path: &Path) -> Result<UploadedFile> {
        if path.to_string_lossy().contains("broken") {
            return Err(Error::Api {
                status: 400,
                message: "unsupported file".to_string(),
            });
        }
        let mut uploads = self.uploads.lock().unwrap();
        uploads.push(path.to_path_buf());
        Ok(UploadedFile {
            id: format!("file_{}", uploads.len()),
            filename: None,
            status: Some("processed".to_string()),
        })
    }

    async fn create_vector_store(&self, name: &str, _file_ids: &[String]) -> Result<VectorStore> {
        self.vector_stores_created.fetch_add(1, Ordering::SeqCst);
        Ok(VectorStore {
            id: "vs_1".to_string(),
            name: Some(name.to_string()),
            status: Some("completed".to_string()),
        })
    }

    async fn get_connection(&self, name: &str) -> Result<Connection> {
        self.connection.clone().ok_or_else(|| Error::Api {
            status: 404,
            message: format!("connection {name} not found"),
        })
    }
}
