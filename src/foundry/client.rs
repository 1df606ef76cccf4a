//! Agent platform client over REST (bearer token authentication).

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};
use url::Url;
use uuid::Uuid;

use crate::config::FoundryConfig;
use crate::error::Error;
use crate::Result;

use super::types::*;
use super::AgentsApi;

/// Delay between status reads while a file or vector store is processing.
const PROCESSING_POLL_INTERVAL: Duration = Duration::from_secs(1);
const PROCESSING_POLL_LIMIT: usize = 60;

/// Largest page the platform serves for list endpoints.
const PAGE_SIZE: &str = "100";

#[derive(Debug, Deserialize)]
struct ListResponse<T> {
    data: Vec<T>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    last_id: Option<String>,
}

/// Agent platform client for one project endpoint.
#[derive(Clone)]
pub struct FoundryClient {
    endpoint: String,
    api_version: String,
    access_token: String,
    client: Client,
}

impl FoundryClient {
    /// Create a client for the given project endpoint.
    pub fn new(endpoint: &str, access_token: &str, api_version: &str) -> Result<Self> {
        // Validate once so later joins cannot fail on the base part.
        Url::parse(endpoint)?;

        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_version: api_version.to_string(),
            access_token: access_token.to_string(),
            client: Client::new(),
        })
    }

    pub fn from_config(config: &FoundryConfig) -> Result<Self> {
        if config.endpoint.is_empty() {
            return Err(Error::Config(
                "agent service endpoint is not configured".to_string(),
            ));
        }
        Self::new(&config.endpoint, &config.access_token, &config.api_version)
    }

    fn url(&self, path: &str, query: &[(&str, &str)]) -> Result<Url> {
        let mut url = Url::parse(&format!("{}/{}", self.endpoint, path))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("api-version", &self.api_version);
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .bearer_auth(&self.access_token)
            .header("x-ms-client-request-id", Uuid::new_v4().to_string())
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = self.authorized(request).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        let url = self.url(path, query)?;
        self.send(self.client.get(url)).await
    }

    async fn post<T: DeserializeOwned>(&self, path: &str, body: &serde_json::Value) -> Result<T> {
        let url = self.url(path, &[])?;
        self.send(self.client.post(url).json(body)).await
    }

    async fn wait_for_file(&self, mut file: UploadedFile) -> Result<UploadedFile> {
        for _ in 0..PROCESSING_POLL_LIMIT {
            match file.status.as_deref() {
                Some("uploaded") | Some("pending") | Some("running") => {
                    tokio::time::sleep(PROCESSING_POLL_INTERVAL).await;
                    file = self.get(&format!("files/{}", file.id), &[]).await?;
                }
                Some("error") => {
                    return Err(Error::Other(format!("file {} failed processing", file.id)));
                }
                _ => return Ok(file),
            }
        }
        Err(Error::Other(format!("file {} did not finish processing", file.id)))
    }
}

#[async_trait]
impl AgentsApi for FoundryClient {
    async fn create_agent(&self, definition: &AgentDefinition) -> Result<RemoteAgent> {
        let body = serde_json::to_value(definition)?;
        let agent: RemoteAgent = self.post("assistants", &body).await?;
        info!("Created remote agent {} ({})", agent.id, definition.name);
        Ok(agent)
    }

    async fn create_thread(&self) -> Result<AgentThread> {
        self.post("threads", &json!({})).await
    }

    async fn create_message(
        &self,
        thread_id: &str,
        role: MessageRole,
        content: &str,
    ) -> Result<ThreadMessage> {
        let body = json!({"role": role.as_str(), "content": content});
        self.post(&format!("threads/{thread_id}/messages"), &body).await
    }

    async fn create_run(&self, thread_id: &str, agent_id: &str) -> Result<Run> {
        let body = json!({"assistant_id": agent_id});
        self.post(&format!("threads/{thread_id}/runs"), &body).await
    }

    async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<Run> {
        self.get(&format!("threads/{thread_id}/runs/{run_id}"), &[]).await
    }

    async fn submit_tool_outputs(
        &self,
        thread_id: &str,
        run_id: &str,
        outputs: &[ToolOutput],
    ) -> Result<Run> {
        let body = json!({"tool_outputs": outputs});
        self.post(
            &format!("threads/{thread_id}/runs/{run_id}/submit_tool_outputs"),
            &body,
        )
        .await
    }

    async fn list_messages(&self, thread_id: &str, order: ListOrder) -> Result<Vec<ThreadMessage>> {
        let path = format!("threads/{thread_id}/messages");
        let mut messages = Vec::new();
        let mut after: Option<String> = None;

        loop {
            let mut query = vec![("order", order.as_query()), ("limit", PAGE_SIZE)];
            if let Some(cursor) = after.as_deref() {
                query.push(("after", cursor));
            }

            let page: ListResponse<ThreadMessage> = self.get(&path, &query).await?;
            messages.extend(page.data);

            match page.last_id {
                Some(last_id) if page.has_more => {
                    debug!("Fetching messages after {}", last_id);
                    after = Some(last_id);
                }
                _ => break,
            }
        }

        Ok(messages)
    }

    async fn upload_file(&self, path: &Path) -> Result<UploadedFile> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());

        debug!("Uploading {} ({} bytes)", file_name, bytes.len());

        let form = Form::new()
            .text("purpose", "assistants")
            .part("file", Part::bytes(bytes).file_name(file_name));

        let url = self.url("files", &[])?;
        let file: UploadedFile = self.send(self.client.post(url).multipart(form)).await?;
        self.wait_for_file(file).await
    }

    async fn create_vector_store(&self, name: &str, file_ids: &[String]) -> Result<VectorStore> {
        let body = json!({"name": name, "file_ids": file_ids});
        let mut store: VectorStore = self.post("vector_stores", &body).await?;

        for _ in 0..PROCESSING_POLL_LIMIT {
            match store.status.as_deref() {
                Some("in_progress") => {
                    tokio::time::sleep(PROCESSING_POLL_INTERVAL).await;
                    store = self.get(&format!("vector_stores/{}", store.id), &[]).await?;
                }
                Some("completed") | None => return Ok(store),
                Some(other) => {
                    return Err(Error::Other(format!(
                        "vector store {} ended with status {other}",
                        store.id
                    )));
                }
            }
        }

        Err(Error::Other(format!(
            "vector store {} did not finish indexing",
            store.id
        )))
    }

    async fn get_connection(&self, name: &str) -> Result<Connection> {
        self.get(&format!("connections/{name}"), &[]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{
        body_json, header, method, path, query_param, query_param_is_missing,
    };
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer) -> FoundryClient {
        FoundryClient::new(&server.uri(), "secret-token", "v1").unwrap()
    }

    #[test]
    fn test_rejects_invalid_endpoint() {
        assert!(FoundryClient::new("not a url", "t", "v1").is_err());
    }

    #[test]
    fn test_url_carries_api_version() {
        let client = FoundryClient::new("https://proj.example/api/projects/p/", "t", "v1").unwrap();
        let url = client.url("threads/t1/messages", &[("order", "asc")]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://proj.example/api/projects/p/threads/t1/messages?api-version=v1&order=asc"
        );
    }

    #[tokio::test]
    async fn test_get_run_sends_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/threads/thread_1/runs/run_1"))
            .and(query_param("api-version", "v1"))
            .and(header("authorization", "Bearer secret-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "run_1",
                "status": "in_progress"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let run = client.get_run("thread_1", "run_1").await.unwrap();
        assert_eq!(run.status, RunStatus::InProgress);
    }

    #[tokio::test]
    async fn test_submit_tool_outputs_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/threads/t/runs/r/submit_tool_outputs"))
            .and(body_json(json!({
                "tool_outputs": [{"tool_call_id": "call_1", "output": "{}"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "r",
                "status": "queued"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let outputs = vec![ToolOutput {
            tool_call_id: "call_1".to_string(),
            output: "{}".to_string(),
        }];
        let run = client.submit_tool_outputs("t", "r", &outputs).await.unwrap();
        assert_eq!(run.status, RunStatus::Queued);
    }

    #[tokio::test]
    async fn test_error_status_maps_to_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/threads"))
            .respond_with(ResponseTemplate::new(401).set_body_string("token expired"))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        match client.create_thread().await {
            Err(Error::Api { status, message }) => {
                assert_eq!(status, 401);
                assert_eq!(message, "token expired");
            }
            other => panic!("expected api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_list_messages_unwraps_data() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/threads/t/messages"))
            .and(query_param("order", "asc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "object": "list",
                "data": [
                    {"id": "m1", "role": "user", "content": [{"type": "text", "text": {"value": "hi"}}]},
                    {"id": "m2", "role": "assistant", "content": [{"type": "text", "text": {"value": "hello"}}]}
                ]
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let messages = client.list_messages("t", ListOrder::Ascending).await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].text().as_deref(), Some("hello"));
    }

    fn text_message(id: &str, role: &str, text: &str) -> serde_json::Value {
        json!({"id": id, "role": role, "content": [{"type": "text", "text": {"value": text}}]})
    }

    #[tokio::test]
    async fn test_list_messages_follows_pages() {
        let server = MockServer::start().await;
        let first_page: Vec<serde_json::Value> = (0..100)
            .map(|i| {
                let role = if i % 2 == 0 { "user" } else { "assistant" };
                text_message(&format!("m{i}"), role, &format!("old {i}"))
            })
            .collect();

        Mock::given(method("GET"))
            .and(path("/threads/t/messages"))
            .and(query_param_is_missing("after"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": first_page,
                "has_more": true,
                "last_id": "m99"
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/threads/t/messages"))
            .and(query_param("after", "m99"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [
                    text_message("m100", "user", "latest question"),
                    text_message("m101", "assistant", "NEWEST ANSWER")
                ],
                "has_more": false,
                "last_id": "m101"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let messages = client.list_messages("t", ListOrder::Ascending).await.unwrap();

        assert_eq!(messages.len(), 102);
        let latest = messages
            .iter()
            .rev()
            .filter(|m| m.role == MessageRole::Assistant)
            .find_map(ThreadMessage::text);
        assert_eq!(latest.as_deref(), Some("NEWEST ANSWER"));
    }

    #[tokio::test]
    async fn test_create_agent_serializes_tools() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/assistants"))
            .and(body_json(json!({
                "model": "gpt-4o",
                "name": "email-agent",
                "instructions": "be nice",
                "tools": [{"type": "file_search"}],
                "tool_resources": {"file_search": {"vector_store_ids": ["vs_1"]}}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "asst_1"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let definition = AgentDefinition {
            model: "gpt-4o".to_string(),
            name: "email-agent".to_string(),
            instructions: "be nice".to_string(),
            tools: vec![ToolSpec::FileSearch],
            tool_resources: Some(ToolResources {
                file_search: Some(FileSearchResources {
                    vector_store_ids: vec!["vs_1".to_string()],
                }),
            }),
        };
        let agent = client.create_agent(&definition).await.unwrap();
        assert_eq!(agent.id, "asst_1");
    }

    #[tokio::test]
    async fn test_upload_file_returns_processed_file() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/files"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "file_1",
                "filename": "notes.md",
                "status": "processed"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("notes.md");
        std::fs::write(&file_path, "# notes").unwrap();

        let client = client_for(&server).await;
        let file = client.upload_file(&file_path).await.unwrap();
        assert_eq!(file.id, "file_1");
    }

    #[tokio::test]
    async fn test_vector_store_failure_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/vector_stores"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "vs_1",
                "status": "expired"
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let result = client.create_vector_store("store", &["f".to_string()]).await;
        assert!(result.is_err());
    }
}
