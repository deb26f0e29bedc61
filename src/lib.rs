pub mod api;
pub mod cli;
pub mod error;
pub mod message;
pub mod render;
pub mod session;
pub mod web;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use api::{
    AgentChatRequest, ChatResponse, ContinueDebateRequest, DebateStateResponse,
    ListSessionsResponse, LlmChatRequest, LoadDebateResponse, PrdTextResponse,
    SaveDebateResponse, StartDebateRequest,
};
pub use error::ClientError;

// ---------------------------------------------------------------------------
// DebateClient — HTTP client over the debate backend
// ---------------------------------------------------------------------------

/// Thin client over the debate backend's JSON API. Each call is independent
/// and one-shot: no retries, no timeouts beyond reqwest defaults, and a
/// failure leaves whatever session state the caller holds untouched.
pub struct DebateClient {
    client: Client,
    base_url: String,
}

impl DebateClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        DebateClient { client: Client::new(), base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // -----------------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------------

    pub async fn start_debate(&self, topic: &str) -> Result<DebateStateResponse, ClientError> {
        self.post_json("/start_debate", &StartDebateRequest { topic: topic.to_string() })
            .await
    }

    pub async fn continue_debate(
        &self,
        mention: &str,
    ) -> Result<DebateStateResponse, ClientError> {
        self.post_json(
            "/continue_debate",
            &ContinueDebateRequest { mention: mention.to_string() },
        )
        .await
    }

    pub async fn llm_chat(&self, question: &str) -> Result<ChatResponse, ClientError> {
        self.post_json("/llm_chat", &LlmChatRequest { question: question.to_string() })
            .await
    }

    pub async fn agent_chat(
        &self,
        agent: &str,
        question: &str,
    ) -> Result<ChatResponse, ClientError> {
        self.post_json(
            "/agent_chat",
            &AgentChatRequest { agent: agent.to_string(), question: question.to_string() },
        )
        .await
    }

    pub async fn save_debate(&self) -> Result<SaveDebateResponse, ClientError> {
        self.post_json("/save_debate", &Value::Object(Default::default())).await
    }

    pub async fn load_debate(&self, session_id: &str) -> Result<LoadDebateResponse, ClientError> {
        self.get_json(&format!("/load_debate/{session_id}")).await
    }

    pub async fn list_sessions(&self) -> Result<ListSessionsResponse, ClientError> {
        self.get_json("/list_sessions").await
    }

    pub async fn prd_text(&self) -> Result<PrdTextResponse, ClientError> {
        self.get_json("/prd_text").await
    }

    /// Fetch the exported PRD document as raw bytes (the web client opened
    /// this in a new tab; here the caller writes it to a file).
    pub async fn download_prd(&self) -> Result<Vec<u8>, ClientError> {
        let url = format!("{}/download_prd", self.base_url);
        debug!(%url, "GET");
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = error_message(response.text().await.unwrap_or_default());
            return Err(ClientError::Http { status: status.as_u16(), message });
        }
        Ok(response.bytes().await?.to_vec())
    }

    // -----------------------------------------------------------------------
    // Transport plumbing
    // -----------------------------------------------------------------------

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "POST");
        let response = self.client.post(&url).json(body).send().await?;
        Self::decode(response).await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "GET");
        let response = self.client.get(&url).send().await?;
        Self::decode(response).await
    }

    /// Map the server-side failure modes before deserializing: a non-OK
    /// status, or an `error` field smuggled inside a 200 body.
    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
        let status = response.status();
        if !status.is_success() {
            let message = error_message(response.text().await.unwrap_or_default());
            return Err(ClientError::Http { status: status.as_u16(), message });
        }
        let value: Value = response.json().await?;
        if let Some(err) = value.get("error").and_then(Value::as_str) {
            return Err(ClientError::Api { message: err.to_string() });
        }
        Ok(serde_json::from_value(value)?)
    }
}

/// Prefer the server's own `error` field when the failure body is JSON;
/// otherwise the raw body; otherwise a generic fallback.
fn error_message(body: String) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(&body) {
        if let Some(message) = value.get("error").and_then(Value::as_str) {
            return message.to_string();
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "request failed".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_trims_trailing_slash() {
        let client = DebateClient::new("http://localhost:5000/api/");
        assert_eq!(client.base_url(), "http://localhost:5000/api");
    }

    #[test]
    fn test_new_keeps_clean_base() {
        let client = DebateClient::new("http://localhost:5000/api");
        assert_eq!(client.base_url(), "http://localhost:5000/api");
    }

    #[test]
    fn test_error_message_prefers_json_error_field() {
        let message = error_message(r#"{"error": "Please start the debate first."}"#.to_string());
        assert_eq!(message, "Please start the debate first.");
    }

    #[test]
    fn test_error_message_falls_back_to_body() {
        assert_eq!(error_message("Internal Server Error".to_string()), "Internal Server Error");
    }

    #[test]
    fn test_error_message_generic_when_empty() {
        assert_eq!(error_message("  ".to_string()), "request failed");
    }

    #[test]
    fn test_unreachable_backend_is_transport_error() {
        let client = DebateClient::new("http://127.0.0.1:9/api");
        let err = tokio_test::block_on(client.prd_text()).unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)), "got: {err}");
    }
}
