//! Email delivery through Microsoft Graph `sendMail`.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::config::EmailConfig;
use crate::error::Error;
use crate::Result;

/// Outcome of one send attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailResult {
    pub success: bool,
    pub message: String,
}

/// Email sending collaborator.
///
/// `Err` means the send could not be attempted at all (e.g. missing
/// configuration); a provider rejection comes back as `success: false`.
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<EmailResult> {
        self.send_with_cc(to, subject, body, &[]).await
    }

    async fn send_with_cc(
        &self,
        to: &str,
        subject: &str,
        body: &str,
        cc: &[String],
    ) -> Result<EmailResult>;
}

/// Sends HTML mail from one mailbox using a Graph access token.
#[derive(Clone)]
pub struct GraphEmailSender {
    config: EmailConfig,
    client: Client,
}

fn recipients(addresses: &[&str]) -> Vec<Value> {
    addresses
        .iter()
        .map(|address| json!({"emailAddress": {"address": address}}))
        .collect()
}

impl GraphEmailSender {
    pub fn new(config: EmailConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    fn send_mail_url(&self) -> String {
        format!(
            "{}/users/{}/sendMail",
            self.config.graph_base.trim_end_matches('/'),
            self.config.sender_address
        )
    }

    fn build_message(to: &str, subject: &str, body: &str, cc: &[String]) -> Value {
        let mut message = json!({
            "subject": subject,
            "body": {"contentType": "HTML", "content": body},
            "toRecipients": recipients(&[to]),
        });

        if !cc.is_empty() {
            let cc: Vec<&str> = cc.iter().map(String::as_str).collect();
            message["ccRecipients"] = Value::Array(recipients(&cc));
        }

        json!({"message": message, "saveToSentItems": true})
    }
}

#[async_trait]
impl EmailSender for GraphEmailSender {
    async fn send_with_cc(
        &self,
        to: &str,
        subject: &str,
        body: &str,
        cc: &[String],
    ) -> Result<EmailResult> {
        if self.config.access_token.is_empty() || self.config.sender_address.is_empty() {
            return Err(Error::Email(
                "Graph mail is not configured. Set GRAPH_ACCESS_TOKEN and EMAIL_SENDER_ADDRESS"
                    .to_string(),
            ));
        }

        let response = self
            .client
            .post(self.send_mail_url())
            .bearer_auth(&self.config.access_token)
            .json(&Self::build_message(to, subject, body, cc))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            info!("Email sent to {} ({} cc)", to, cc.len());
            let message = if cc.is_empty() {
                format!("Email sent successfully to {to}")
            } else {
                format!("Email sent successfully to {to} (cc: {})", cc.join(", "))
            };
            return Ok(EmailResult {
                success: true,
                message,
            });
        }

        let detail = response.text().await.unwrap_or_default();
        warn!("Graph rejected email to {}: {} {}", to, status, detail);
        Ok(EmailResult {
            success: false,
            message: format!("Failed to send email ({}): {}", status.as_u16(), detail),
        })
    }
}
