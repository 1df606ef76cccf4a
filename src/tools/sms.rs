//! send_sms tool - lets the agent text a phone number

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use super::Tool;
use crate::error::Error;
use crate::messaging::SmsSender;
use crate::Result;

/// Function name the agent calls.
pub const SEND_SMS: &str = "send_sms";

#[derive(Debug, Deserialize)]
struct SendSmsArgs {
    #[serde(default)]
    message: String,
    #[serde(default)]
    to_number: Option<String>,
}

/// Send an SMS through the configured provider
pub struct SendSmsTool {
    sender: Arc<SmsSender>,
}

impl SendSmsTool {
    pub fn new(sender: Arc<SmsSender>) -> Self {
        Self { sender }
    }
}

#[async_trait]
impl Tool for SendSmsTool {
    fn name(&self) -> &str {
        SEND_SMS
    }

    fn description(&self) -> &str {
        "Send an SMS message to a phone number using Twilio"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "message": {
                    "type": "string",
                    "description": "The SMS message content to send"
                },
                "to_number": {
                    "type": "string",
                    "description": "Phone number in E.164 format (e.g. +15551234567). Uses the default recipient when omitted."
                }
            },
            "required": ["message"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, params: Value) -> Result<Value> {
        let args: SendSmsArgs = serde_json::from_value(params)
            .map_err(|e| Error::Tool(format!("Invalid send_sms arguments: {}", e)))?;

        let result = self
            .sender
            .send_sms(&args.message, args.to_number.as_deref())
            .await;

        Ok(serde_json::to_value(result)?)
    }
}
