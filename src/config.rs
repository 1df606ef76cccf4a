//! Configuration management
//!
//! Settings come from `~/.foundry-agents/config.json` when present, then the
//! process environment overrides individual fields.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use crate::Result;
use crate::error::Error;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Agent platform connection
    #[serde(default)]
    pub foundry: FoundryConfig,

    /// Twilio SMS settings
    #[serde(default)]
    pub twilio: TwilioConfig,

    /// Microsoft Graph email settings
    #[serde(default)]
    pub email: EmailConfig,

    /// Run polling behaviour
    #[serde(default)]
    pub polling: PollingConfig,

    /// Directory scanned for reference documents
    #[serde(default = "default_documents_dir")]
    pub documents_dir: PathBuf,
}

/// Agent platform (project endpoint) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoundryConfig {
    /// Project endpoint, e.g. `https://<name>.services.ai.azure.com/api/projects/<project>`
    #[serde(default)]
    pub endpoint: String,

    /// Bearer token for the project endpoint
    #[serde(default)]
    pub access_token: String,

    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Model deployment the agents run on
    #[serde(default = "default_model")]
    pub model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwilioConfig {
    #[serde(default)]
    pub account_sid: String,

    #[serde(default)]
    pub auth_token: String,

    #[serde(default)]
    pub from_number: String,

    /// Recipient used when a send_sms call names none
    #[serde(default)]
    pub default_to_number: String,

    #[serde(default = "default_twilio_api_base")]
    pub api_base: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    #[serde(default = "default_graph_base")]
    pub graph_base: String,

    /// Mailbox the agent sends from
    #[serde(default)]
    pub sender_address: String,

    #[serde(default)]
    pub access_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Seconds to wait between run status reads
    #[serde(default = "default_poll_interval_secs")]
    pub interval_secs: u64,

    /// Maximum number of status polls before giving up
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

fn default_documents_dir() -> PathBuf {
    PathBuf::from("documents")
}

fn default_api_version() -> String {
    "v1".to_string()
}

fn default_model() -> String {
    "gpt-4o".to_string()
}

fn default_twilio_api_base() -> String {
    "https://api.twilio.com".to_string()
}

fn default_graph_base() -> String {
    "https://graph.microsoft.com/v1.0".to_string()
}

fn default_poll_interval_secs() -> u64 {
    2
}

fn default_max_iterations() -> usize {
    25
}

impl Default for FoundryConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            access_token: String::new(),
            api_version: default_api_version(),
            model: default_model(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            foundry: FoundryConfig::default(),
            twilio: TwilioConfig::default(),
            email: EmailConfig::default(),
            polling: PollingConfig::default(),
            documents_dir: default_documents_dir(),
        }
    }
}

impl Default for TwilioConfig {
    fn default() -> Self {
        Self {
            account_sid: String::new(),
            auth_token: String::new(),
            from_number: String::new(),
            default_to_number: String::new(),
            api_base: default_twilio_api_base(),
        }
    }
}

impl TwilioConfig {
    /// Environment names of the mandatory settings that are still empty
    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.account_sid.is_empty() {
            missing.push("TWILIO_ACCOUNT_SID");
        }
        if self.auth_token.is_empty() {
            missing.push("TWILIO_AUTH_TOKEN");
        }
        if self.from_number.is_empty() {
            missing.push("TWILIO_FROM_NUMBER");
        }
        missing
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            graph_base: default_graph_base(),
            sender_address: String::new(),
            access_token: String::new(),
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_poll_interval_secs(),
            max_iterations: default_max_iterations(),
        }
    }
}

impl Config {
    /// Apply overrides from a key lookup (the process environment in production)
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let set = |target: &mut String, key: &str| {
            if let Some(value) = lookup(key).filter(|v| !v.is_empty()) {
                *target = value;
            }
        };

        set(&mut self.foundry.endpoint, "AZURE_AI_FOUNDRY_PROJECT_ENDPOINT");
        set(&mut self.foundry.access_token, "AZURE_AI_FOUNDRY_ACCESS_TOKEN");
        set(&mut self.foundry.model, "AZURE_AI_AGENT_MODEL_DEPLOYMENT_NAME");
        set(&mut self.twilio.account_sid, "TWILIO_ACCOUNT_SID");
        set(&mut self.twilio.auth_token, "TWILIO_AUTH_TOKEN");
        set(&mut self.twilio.from_number, "TWILIO_FROM_NUMBER");
        set(&mut self.twilio.default_to_number, "TWILIO_DEFAULT_TO_NUMBER");
        set(&mut self.email.access_token, "GRAPH_ACCESS_TOKEN");
        set(&mut self.email.sender_address, "EMAIL_SENDER_ADDRESS");

        if let Some(dir) = lookup("AGENT_DOCUMENTS_DIR").filter(|v| !v.is_empty()) {
            self.documents_dir = PathBuf::from(dir);
        }
    }
}

/// Get the config directory path
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".foundry-agents")
}

/// Get the config file path
pub fn config_path() -> PathBuf {
    config_dir().join("config.json")
}

/// Read configuration from file (if any) and the environment, unvalidated
pub fn read() -> Result<Config> {
    let path = config_path();

    let mut config = if path.exists() {
        let content = std::fs::read_to_string(&path)?;
        serde_json::from_str(&content)?
    } else {
        Config::default()
    };

    config.apply_overrides(|key| std::env::var(key).ok());
    Ok(config)
}

/// Load configuration, requiring a project endpoint
pub fn load() -> Result<Config> {
    let config = read()?;

    if config.foundry.endpoint.is_empty() {
        return Err(Error::Config(
            "AZURE_AI_FOUNDRY_PROJECT_ENDPOINT is not set".to_string(),
        ));
    }

    Ok(config)
}

/// Save configuration to file
pub fn save(config: &Config) -> Result<()> {
    let path = config_path();

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let content = serde_json::to_string_pretty(config)?;
    std::fs::write(&path, content)?;
    Ok(())
}

/// Write a default config file unless one already exists
pub fn init() -> Result<PathBuf> {
    let path = config_path();
    if !path.exists() {
        save(&Config::default())?;
    }
    Ok(path)
}
