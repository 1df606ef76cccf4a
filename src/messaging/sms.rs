//! SMS delivery via Twilio.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::{error, info, warn};

use crate::config::TwilioConfig;
use crate::error::Error;
use crate::Result;

/// Longest body sent in one request; longer messages are cut with "...".
pub const MAX_SMS_CHARS: usize = 1600;

/// Message accepted by the provider.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProviderMessage {
    pub sid: String,
    #[serde(default)]
    pub status: String,
}

/// Low-level SMS transport.
#[async_trait]
pub trait SmsProvider: Send + Sync {
    async fn create_message(&self, body: &str, from: &str, to: &str) -> Result<ProviderMessage>;
}

#[derive(Debug, Deserialize)]
struct TwilioError {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: Option<String>,
}

/// Twilio REST Messages API.
#[derive(Clone)]
pub struct TwilioSmsProvider {
    account_sid: String,
    auth_token: String,
    api_base: String,
    client: Client,
}

impl TwilioSmsProvider {
    pub fn new(account_sid: &str, auth_token: &str, api_base: &str) -> Self {
        Self {
            account_sid: account_sid.to_string(),
            auth_token: auth_token.to_string(),
            api_base: api_base.trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.api_base, self.account_sid
        )
    }
}

#[async_trait]
impl SmsProvider for TwilioSmsProvider {
    async fn create_message(&self, body: &str, from: &str, to: &str) -> Result<ProviderMessage> {
        let response = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[("Body", body), ("From", from), ("To", to)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let (code, message) = match serde_json::from_str::<TwilioError>(&text) {
                Ok(err) => (err.code, err.message.unwrap_or(text)),
                Err(_) => (None, text),
            };
            return Err(Error::Sms {
                message: format!("Twilio returned {}: {}", status.as_u16(), message),
                code,
            });
        }

        Ok(response.json().await?)
    }
}

/// Result of a send_sms call, serialized as the tool output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SmsResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_sid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<i64>,
}

impl SmsResult {
    pub fn failed(error: impl Into<String>, error_code: Option<i64>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            error_code,
            ..Self::default()
        }
    }
}

/// Cut a message to [`MAX_SMS_CHARS`] characters, ending in "..." when cut.
pub fn truncate_for_sms(message: &str) -> String {
    if message.chars().count() <= MAX_SMS_CHARS {
        return message.to_string();
    }
    let mut cut: String = message.chars().take(MAX_SMS_CHARS - 3).collect();
    cut.push_str("...");
    cut
}

/// Sends SMS messages from the configured number.
///
/// The provider is created on first use so a missing credential only
/// surfaces as a failed send.
pub struct SmsSender {
    config: TwilioConfig,
    provider: OnceCell<Arc<dyn SmsProvider>>,
}

impl SmsSender {
    pub fn new(config: TwilioConfig) -> Self {
        Self {
            config,
            provider: OnceCell::new(),
        }
    }

    /// Use a ready-made provider instead of building the Twilio client.
    pub fn with_provider(config: TwilioConfig, provider: Arc<dyn SmsProvider>) -> Self {
        Self {
            config,
            provider: OnceCell::new_with(Some(provider)),
        }
    }

    async fn provider(&self) -> Result<&Arc<dyn SmsProvider>> {
        self.provider
            .get_or_try_init(|| async {
                if self.config.account_sid.is_empty() || self.config.auth_token.is_empty() {
                    return Err(Error::Config(
                        "Twilio credentials not configured. Set TWILIO_ACCOUNT_SID and TWILIO_AUTH_TOKEN"
                            .to_string(),
                    ));
                }
                let provider: Arc<dyn SmsProvider> = Arc::new(TwilioSmsProvider::new(
                    &self.config.account_sid,
                    &self.config.auth_token,
                    &self.config.api_base,
                ));
                Ok(provider)
            })
            .await
    }

    /// Send `message` to `to_number`, or to the default recipient when absent.
    pub async fn send_sms(&self, message: &str, to_number: Option<&str>) -> SmsResult {
        let provider = match self.provider().await {
            Ok(provider) => provider,
            Err(e) => {
                error!("❌ Unexpected error sending SMS: {}", e);
                return SmsResult::failed(e.to_string(), None);
            }
        };

        let recipient = match to_number.filter(|n| !n.is_empty()) {
            Some(number) => number,
            None if !self.config.default_to_number.is_empty() => self.config.default_to_number.as_str(),
            None => {
                return SmsResult::failed(
                    "No recipient phone number provided and no default configured",
                    None,
                );
            }
        };

        if message.trim().is_empty() {
            return SmsResult::failed("Message body is empty", None);
        }

        let body = truncate_for_sms(message);
        if body.len() != message.len() {
            warn!("Message truncated to {} characters for SMS", MAX_SMS_CHARS);
        }

        match provider
            .create_message(&body, &self.config.from_number, recipient)
            .await
        {
            Ok(sent) => {
                info!("✅ SMS sent successfully: SID={}, To={}", sent.sid, recipient);
                SmsResult {
                    success: true,
                    message_sid: Some(sent.sid),
                    from: Some(self.config.from_number.clone()),
                    to: Some(recipient.to_string()),
                    status: Some(sent.status),
                    body_length: Some(body.chars().count()),
                    ..SmsResult::default()
                }
            }
            Err(Error::Sms { message, code }) => {
                error!("❌ Twilio API error: {}", message);
                SmsResult::failed(message, code)
            }
            Err(e) => {
                error!("❌ Unexpected error sending SMS: {}", e);
                SmsResult::failed(e.to_string(), None)
            }
        }
    }
}
