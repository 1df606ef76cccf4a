//! Foundry agents - messaging agents on a hosted agent platform
//!
//! This library drives remote agents through their REST API: it creates
//! agents and threads, polls runs, answers tool calls locally and relays
//! the results to SMS and email providers.

pub mod agent;
pub mod config;
pub mod documents;
pub mod error;
pub mod foundry;
pub mod messaging;
pub mod profiles;
pub mod templates;
pub mod tools;
pub mod ui;

pub use error::{Error, Result};
