//! SMS notification agent

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Local;
use tracing::{error, info};

use crate::agent::{AgentContext, AgentProfile};
use crate::config::TwilioConfig;
use crate::error::Error;
use crate::foundry::{AgentDefinition, AgentsApi, ToolSpec};
use crate::messaging::SmsSender;
use crate::templates;
use crate::tools::{SendSmsTool, ToolRunner};
use crate::Result;

pub const SMS_AGENT_NAME: &str = "foundry-twilio-sms-agent";

/// Agent that answers requests by sending text messages.
pub struct SmsProfile {
    twilio: TwilioConfig,
    functions: ToolRunner,
}

impl SmsProfile {
    pub fn new(twilio: TwilioConfig) -> Self {
        let sender = Arc::new(SmsSender::new(twilio.clone()));
        Self::with_sender(twilio, sender)
    }

    pub fn with_sender(twilio: TwilioConfig, sender: Arc<SmsSender>) -> Self {
        let mut functions = ToolRunner::new();
        functions.register(SendSmsTool::new(sender));
        Self { twilio, functions }
    }
}

#[async_trait]
impl AgentProfile for SmsProfile {
    fn name(&self) -> &str {
        SMS_AGENT_NAME
    }

    fn functions(&self) -> &ToolRunner {
        &self.functions
    }

    async fn define(&self, ctx: &AgentContext, _api: &dyn AgentsApi) -> Result<AgentDefinition> {
        let missing = self.twilio.missing();
        if !missing.is_empty() {
            error!("Missing Twilio configuration: {}", missing.join(", "));
            return Err(Error::Config(format!(
                "Twilio configuration is incomplete, missing {}",
                missing.join(", ")
            )));
        }

        let tools: Vec<ToolSpec> = self
            .functions
            .definitions()
            .into_iter()
            .map(ToolSpec::from)
            .collect();
        info!("Added send_sms function tool");

        Ok(AgentDefinition {
            model: ctx.config().foundry.model.clone(),
            name: SMS_AGENT_NAME.to_string(),
            instructions: templates::render(templates::SMS_AGENT, Local::now()),
            tools,
            tool_resources: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::foundry::fake::ScriptedApi;

    fn twilio() -> TwilioConfig {
        TwilioConfig {
            account_sid: "AC123".to_string(),
            auth_token: "token".to_string(),
            from_number: "+15550001111".to_string(),
            ..TwilioConfig::default()
        }
    }

    #[tokio::test]
    async fn test_definition_has_send_sms() {
        let api = ScriptedApi::new();
        let ctx = AgentContext::new(Config::default());
        let profile = SmsProfile::new(twilio());

        let definition = profile.define(&ctx, &api).await.unwrap();

        assert_eq!(definition.name, SMS_AGENT_NAME);
        assert_eq!(definition.model, "gpt-4o");
        assert_eq!(definition.tools.len(), 1);
        match &definition.tools[0] {
            ToolSpec::Function { function } => {
                assert_eq!(function.name, "send_sms");
                assert_eq!(function.parameters["required"][0], "message");
            }
            other => panic!("unexpected tool {other:?}"),
        }
        assert!(!definition.instructions.contains("{now}"));
        assert!(profile.functions().has("send_sms"));
    }

    #[tokio::test]
    async fn test_incomplete_twilio_config_refused() {
        let api = ScriptedApi::new();
        let ctx = AgentContext::new(Config::default());
        let profile = SmsProfile::new(TwilioConfig {
            from_number: String::new(),
            ..twilio()
        });

        let err = profile.define(&ctx, &api).await.unwrap_err();

        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("TWILIO_FROM_NUMBER"));
    }
}
