//! Run dispatch loop - polls a remote run until it settles

use std::fmt;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::PollingConfig;
use crate::foundry::{AgentsApi, Run, RunError, RunState};
use crate::tools::ToolRunner;

use super::tool_calls::ToolCallHandler;

/// One element of a conversation's output sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Chunk {
    Text(String),
    Error(String),
}

impl Chunk {
    pub fn is_error(&self) -> bool {
        matches!(self, Chunk::Error(_))
    }
}

impl fmt::Display for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Chunk::Text(text) => f.write_str(text),
            Chunk::Error(message) => write!(f, "Error: {message}"),
        }
    }
}

/// Message carried by the chunk emitted when the poll budget runs out.
pub const TIMED_OUT: &str = "Request timed out";

/// Polling cadence and budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchSettings {
    pub poll_interval: Duration,
    pub max_iterations: usize,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        (&PollingConfig::default()).into()
    }
}

impl From<&PollingConfig> for DispatchSettings {
    fn from(polling: &PollingConfig) -> Self {
        Self {
            poll_interval: polling.interval(),
            max_iterations: polling.max_iterations,
        }
    }
}

/// How a dispatched run ended.
#[derive(Debug)]
pub enum Outcome {
    /// The run completed; its final state is attached
    Completed(Run),
    /// The call is over; the chunk says why
    Stopped(Chunk),
}

fn failure(error: Option<&RunError>) -> Chunk {
    Chunk::Error(
        error
            .map(ToString::to_string)
            .unwrap_or_else(|| "run failed".to_string()),
    )
}

/// The dispatch loop processes a run through polling and tool execution
pub struct RunDispatcher<'a> {
    api: &'a dyn AgentsApi,
    functions: &'a ToolRunner,
    settings: DispatchSettings,
}

impl<'a> RunDispatcher<'a> {
    pub fn new(api: &'a dyn AgentsApi, functions: &'a ToolRunner, settings: DispatchSettings) -> Self {
        Self {
            api,
            functions,
            settings,
        }
    }

    /// Poll `run` until it leaves the active states or the budget is spent.
    ///
    /// Sleeping before each read is the only suspension point besides the
    /// remote calls themselves.
    pub async fn drive(&self, thread_id: &str, mut run: Run) -> Outcome {
        let handler = ToolCallHandler::new(self.api, self.functions);
        let max = self.settings.max_iterations;
        let mut iterations = 0;

        while run.status.is_active() && iterations < max {
            iterations += 1;
            tokio::time::sleep(self.settings.poll_interval).await;

            run = match self.api.get_run(thread_id, &run.id).await {
                Ok(run) => run,
                Err(e) => return Outcome::Stopped(Chunk::Error(e.to_string())),
            };
            debug!("Iteration {}/{}: run {} is {}", iterations, max, run.id, run.status);

            match run.state() {
                RunState::Failed(error) => return Outcome::Stopped(failure(error)),
                RunState::RequiresAction(_) => {
                    info!("Run {} requires action", run.id);
                    if let Err(e) = handler.handle(&run, thread_id).await {
                        return Outcome::Stopped(Chunk::Error(format!(
                            "Failed to handle tool calls: {e}"
                        )));
                    }
                    run = match self.api.get_run(thread_id, &run.id).await {
                        Ok(run) => run,
                        Err(e) => return Outcome::Stopped(Chunk::Error(e.to_string())),
                    };
                }
                RunState::Working | RunState::Completed | RunState::Ended(_) => {}
            }
        }

        match run.state() {
            RunState::Completed => Outcome::Completed(run),
            RunState::Failed(error) => Outcome::Stopped(failure(error)),
            RunState::Working | RunState::RequiresAction(_) => {
                warn!("Run {} still {} after {} polls", run.id, run.status, iterations);
                Outcome::Stopped(Chunk::Error(TIMED_OUT.to_string()))
            }
            RunState::Ended(status) => {
                Outcome::Stopped(Chunk::Error(format!("Run ended with status {status}")))
            }
        }
    }
}
