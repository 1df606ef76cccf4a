//! Agent module - core agent logic.
//!
//! This module contains:
//! - [`AgentContext`], the state agents in one process share
//! - [`AgentProfile`], what a particular agent contributes
//! - [`FoundryAgent`], the agent/thread/run lifecycle
//! - The run dispatch loop and the tool-call handler it drives
//!
//! # Adding a New Agent
//!
//! Implement [`AgentProfile`] (see `crate::profiles`) and wrap it in a
//! [`FoundryAgent`].

mod context;
mod dispatch;
mod foundry_agent;
mod profile;
mod tool_calls;

pub use context::AgentContext;
pub use dispatch::{Chunk, DispatchSettings, Outcome, RunDispatcher, TIMED_OUT};
pub use foundry_agent::{FoundryAgent, NO_RESPONSE};
pub use profile::AgentProfile;
pub use tool_calls::ToolCallHandler;
