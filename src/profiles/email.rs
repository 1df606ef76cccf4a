//! Email composition agent
//!
//! Drafts are agreed with the user in conversation; once approved the agent
//! emits a fenced send block, which is parsed out of the final reply and
//! delivered through the configured [`EmailSender`].

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Local;
use tracing::{info, warn};

use crate::agent::{AgentContext, AgentProfile};
use crate::config::EmailConfig;
use crate::foundry::{AgentDefinition, AgentsApi, ToolResources, ToolSpec};
use crate::messaging::{deliver_email_block, EmailSender, GraphEmailSender};
use crate::templates;
use crate::tools::ToolRunner;
use crate::Result;

pub const EMAIL_AGENT_NAME: &str = "email-agent";

/// Project connection used for web grounding.
pub const BING_CONNECTION: &str = "agentbing";

pub struct EmailProfile {
    sender: Arc<dyn EmailSender>,
    functions: ToolRunner,
}

impl EmailProfile {
    pub fn new(config: EmailConfig) -> Self {
        Self::with_sender(Arc::new(GraphEmailSender::new(config)))
    }

    pub fn with_sender(sender: Arc<dyn EmailSender>) -> Self {
        Self {
            sender,
            functions: ToolRunner::new(),
        }
    }
}

#[async_trait]
impl AgentProfile for EmailProfile {
    fn name(&self) -> &str {
        EMAIL_AGENT_NAME
    }

    fn functions(&self) -> &ToolRunner {
        &self.functions
    }

    async fn define(&self, ctx: &AgentContext, api: &dyn AgentsApi) -> Result<AgentDefinition> {
        let mut tools = Vec::new();
        let mut tool_resources = None;

        match api.get_connection(BING_CONNECTION).await {
            Ok(connection) => {
                tools.push(ToolSpec::bing_grounding(connection.id));
                info!("Added Bing search capability");
            }
            Err(e) => warn!("Could not add Bing search: {}", e),
        }

        let documents = ctx
            .documents()
            .ensure(api, &ctx.config().documents_dir)
            .await;
        if let Some(file_search) = documents {
            tools.push(ToolSpec::FileSearch);
            tool_resources = Some(ToolResources {
                file_search: Some(file_search),
            });
            info!("Added file search capability");
        }

        Ok(AgentDefinition {
            model: ctx.config().foundry.model.clone(),
            name: EMAIL_AGENT_NAME.to_string(),
            instructions: templates::render(templates::EMAIL_AGENT, Local::now()),
            tools,
            tool_resources,
        })
    }

    async fn annotate(&self, reply: &str) -> Option<String> {
        deliver_email_block(reply, self.sender.as_ref()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::foundry::fake::ScriptedApi;
    use crate::messaging::EmailResult;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Outbox {
        sent: AtomicUsize,
    }

    #[async_trait]
    impl EmailSender for Outbox {
        async fn send_with_cc(
            &self,
            to: &str,
            _subject: &str,
            _body: &str,
            _cc: &[String],
        ) -> Result<EmailResult> {
            self.sent.fetch_add(1, Ordering::SeqCst);
            Ok(EmailResult {
                success: true,
                message: format!("Email sent successfully to {to}"),
            })
        }
    }

    fn context(documents_dir: &std::path::Path) -> AgentContext {
        let config = Config {
            documents_dir: documents_dir.to_path_buf(),
            ..Config::default()
        };
        AgentContext::new(config)
    }

    #[tokio::test]
    async fn test_bare_definition() {
        let api = ScriptedApi::new();
        let dir = tempfile::tempdir().unwrap();
        let profile = EmailProfile::with_sender(Arc::new(Outbox::default()));

        let definition = profile.define(&context(dir.path()), &api).await.unwrap();

        assert_eq!(definition.name, EMAIL_AGENT_NAME);
        assert!(definition.tools.is_empty());
        assert!(definition.tool_resources.is_none());
        assert!(definition.instructions.contains("EMAIL_TO_SEND"));
    }

    #[tokio::test]
    async fn test_bing_and_file_search_added() {
        let api = ScriptedApi::new().with_connection("conn_bing");
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("policy.md"), "# Policy").unwrap();
        let profile = EmailProfile::with_sender(Arc::new(Outbox::default()));

        let definition = profile.define(&context(dir.path()), &api).await.unwrap();

        assert_eq!(
            definition.tools,
            vec![ToolSpec::bing_grounding("conn_bing"), ToolSpec::FileSearch]
        );
        let resources = definition.tool_resources.unwrap().file_search.unwrap();
        assert_eq!(resources.vector_store_ids, vec!["vs_1"]);
    }

    #[tokio::test]
    async fn test_index_shared_between_profiles() {
        let api = ScriptedApi::new();
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("faq.txt"), "faq").unwrap();
        let ctx = context(dir.path());

        let first = EmailProfile::with_sender(Arc::new(Outbox::default()));
        let second = EmailProfile::with_sender(Arc::new(Outbox::default()));
        first.define(&ctx, &api).await.unwrap();
        second.define(&ctx.clone(), &api).await.unwrap();

        assert_eq!(api.vector_stores_created.load(Ordering::SeqCst), 1);
        assert_eq!(api.uploads.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_annotate_sends_block() {
        let outbox = Arc::new(Outbox::default());
        let profile = EmailProfile::with_sender(outbox.clone());
        let reply = "Sending now.\n```EMAIL_TO_SEND\nTO: a@b.com\nSUBJECT: Hi\nBODY:\n<p>Hello</p>\n```END_EMAIL";

        let note = profile.annotate(reply).await;

        assert_eq!(note.as_deref(), Some("✅ Email sent successfully to a@b.com"));
        assert_eq!(outbox.sent.load(Ordering::SeqCst), 1);
        assert_eq!(profile.annotate("Just a draft").await, None);
    }
}
