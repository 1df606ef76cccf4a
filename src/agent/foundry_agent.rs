//! Agent lifecycle shared by every profile.

use std::collections::BTreeSet;
use std::sync::{Mutex, PoisonError};

use futures_util::stream::{self, Stream};
use tokio::sync::OnceCell;
use tracing::{error, info};

use super::context::AgentContext;
use super::dispatch::{Chunk, DispatchSettings, Outcome, RunDispatcher};
use super::profile::AgentProfile;
use crate::foundry::{ListOrder, MessageRole, RemoteAgent, ThreadMessage, Usage};
use crate::Result;

/// Reply used when a completed run left no assistant text behind.
pub const NO_RESPONSE: &str = "No response from agent";

/// A remote agent plus the threads this process opened on it.
pub struct FoundryAgent<P: AgentProfile> {
    ctx: AgentContext,
    profile: P,
    remote: OnceCell<RemoteAgent>,
    threads: Mutex<BTreeSet<String>>,
    last_usage: Mutex<Option<Usage>>,
    settings: DispatchSettings,
}

impl<P: AgentProfile> FoundryAgent<P> {
    pub fn new(ctx: AgentContext, profile: P) -> Self {
        let settings = DispatchSettings::from(&ctx.config().polling);
        Self::with_settings(ctx, profile, settings)
    }

    pub fn with_settings(ctx: AgentContext, profile: P, settings: DispatchSettings) -> Self {
        Self {
            ctx,
            profile,
            remote: OnceCell::new(),
            threads: Mutex::new(BTreeSet::new()),
            last_usage: Mutex::new(None),
            settings,
        }
    }

    pub fn context(&self) -> &AgentContext {
        &self.ctx
    }

    pub fn profile(&self) -> &P {
        &self.profile
    }

    /// Create the remote agent on first call; later calls return the same one.
    pub async fn create_agent(&self) -> Result<&RemoteAgent> {
        self.remote
            .get_or_try_init(|| async {
                let api = self.ctx.api()?;
                let definition = self.profile.define(&self.ctx, api.as_ref()).await?;
                let agent = api.create_agent(&definition).await?;
                info!(
                    "Created agent {} ({}) with {} tools",
                    self.profile.name(),
                    agent.id,
                    definition.tools.len()
                );
                Ok(agent)
            })
            .await
    }

    /// Open a new conversation thread and return its id.
    pub async fn create_thread(&self) -> Result<String> {
        let thread = self.ctx.api()?.create_thread().await?;
        info!("Created thread: {}", thread.id);
        self.threads
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(thread.id.clone());
        Ok(thread.id)
    }

    pub async fn send_message(&self, thread_id: &str, content: &str) -> Result<ThreadMessage> {
        let message = self
            .ctx
            .api()?
            .create_message(thread_id, MessageRole::User, content)
            .await?;
        info!("Created message: {}", message.id);
        Ok(message)
    }

    /// Send `message` on `thread_id` and produce the agent's answer.
    ///
    /// The returned stream is lazy: nothing is sent until it is first
    /// polled. It yields exactly one chunk, the reply text or an error.
    pub fn run_conversation<'a>(
        &'a self,
        thread_id: &'a str,
        message: &'a str,
    ) -> impl Stream<Item = Chunk> + Send + 'a {
        stream::once(async move {
            match self.converse(thread_id, message).await {
                Ok(chunk) => chunk,
                Err(e) => {
                    error!("Error in run_conversation: {}", e);
                    Chunk::Error(e.to_string())
                }
            }
        })
    }

    async fn converse(&self, thread_id: &str, message: &str) -> Result<Chunk> {
        let agent_id = self.create_agent().await?.id.clone();
        let api = self.ctx.api()?;

        self.send_message(thread_id, message).await?;
        let run = api.create_run(thread_id, &agent_id).await?;
        info!("Created run: {}", run.id);

        let dispatcher = RunDispatcher::new(api.as_ref(), self.profile.functions(), self.settings);
        let run = match dispatcher.drive(thread_id, run).await {
            Outcome::Completed(run) => run,
            Outcome::Stopped(chunk) => return Ok(chunk),
        };

        if let Some(usage) = run.usage {
            *self.last_usage.lock().unwrap_or_else(PoisonError::into_inner) = Some(usage);
        }

        let messages = api.list_messages(thread_id, ListOrder::Descending).await?;
        let reply = messages
            .iter()
            .filter(|m| m.role == MessageRole::Assistant)
            .find_map(ThreadMessage::text);

        let Some(reply) = reply else {
            return Ok(Chunk::Error(NO_RESPONSE.to_string()));
        };

        Ok(match self.profile.annotate(&reply).await {
            Some(note) => Chunk::Text(format!("{reply}\n\n{note}")),
            None => Chunk::Text(reply),
        })
    }

    /// Token counts of the last completed run, if it reported any.
    pub fn last_usage(&self) -> Option<Usage> {
        *self.last_usage.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn thread_ids(&self) -> Vec<String> {
        self.threads
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    /// Forget local threads and drop the cached platform handle.
    pub fn cleanup(&self) {
        let mut threads = self.threads.lock().unwrap_or_else(PoisonError::into_inner);
        info!("Cleaning up {} threads", threads.len());
        threads.clear();
        self.ctx.reset();
    }
}
