//! Assistant backend API client.
//!
//! One thin method per backend endpoint. Streaming endpoints return an
//! [`HttpTransport`] regardless of response status (the stream orchestrator
//! owns the non-success handling), while single-shot endpoints map a
//! non-success status to a transport error directly.

use crate::config::ClientConfig;
use crate::transport::HttpTransport;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use strand_core::{Result, StrandError};

/// Default step budget sent with advanced agent tasks.
const DEFAULT_MAX_STEPS: u32 = 10;

/// Request body for the advanced agent endpoints.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvancedTaskRequest {
    pub prompt: String,
    pub session_id: String,
    pub system_prompt: String,
    pub max_steps: u32,
}

impl AdvancedTaskRequest {
    pub fn new(
        prompt: impl Into<String>,
        session_id: impl Into<String>,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            prompt: prompt.into(),
            session_id: session_id.into(),
            system_prompt: system_prompt.into(),
            max_steps: DEFAULT_MAX_STEPS,
        }
    }
}

/// HTTP client for the assistant backend.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl ApiClient {
    /// Creates a client from configuration.
    ///
    /// The configured timeout bounds connection setup and single-shot
    /// requests; streaming responses stay open until closed by either side.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let http = reqwest::Client::builder()
            .connect_timeout(timeout)
            .build()
            .map_err(|e| StrandError::config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // ========================================================================
    // Streaming endpoints
    // ========================================================================

    /// Opens an advanced agent stream (`POST /api/agent/stream/advanced`).
    pub async fn post_advanced_stream(
        &self,
        request: &AdvancedTaskRequest,
    ) -> Result<HttpTransport> {
        tracing::debug!(
            "[ApiClient] Advanced stream request for session {}",
            request.session_id
        );
        let response = self
            .http
            .post(self.url("/api/agent/stream/advanced"))
            .header(reqwest::header::ACCEPT, "application/json, text/plain, */*")
            .header(reqwest::header::CACHE_CONTROL, "no-cache")
            .json(request)
            .send()
            .await
            .map_err(|e| StrandError::transport(format!("Advanced stream request failed: {e}")))?;

        Ok(HttpTransport::new(response))
    }

    /// Opens a chat stream (`GET /api/ai/chat/stream`).
    pub async fn get_chat_stream(
        &self,
        message: &str,
        chat_id: &str,
        system_prompt: &str,
    ) -> Result<HttpTransport> {
        tracing::debug!("[ApiClient] Chat stream request for chat {}", chat_id);
        let mut query: Vec<(&str, &str)> = vec![("message", message), ("chatId", chat_id)];
        if !system_prompt.is_empty() {
            query.push(("systemPrompt", system_prompt));
        }

        let response = self
            .http
            .get(self.url("/api/ai/chat/stream"))
            .query(&query)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .header(reqwest::header::CACHE_CONTROL, "no-cache")
            .send()
            .await
            .map_err(|e| StrandError::transport(format!("Chat stream request failed: {e}")))?;

        Ok(HttpTransport::new(response))
    }

    // ========================================================================
    // Single-shot endpoints
    // ========================================================================

    /// Executes a plain agent task (`POST /api/agent/execute`).
    pub async fn execute_task(&self, prompt: &str) -> Result<Value> {
        self.post_json(
            "/api/agent/execute",
            &serde_json::json!({ "prompt": prompt }),
        )
        .await
    }

    /// Executes an advanced agent task (`POST /api/agent/execute/advanced`).
    pub async fn execute_advanced_task(&self, request: &AdvancedTaskRequest) -> Result<Value> {
        self.post_json("/api/agent/execute/advanced", request).await
    }

    /// Sends a single-shot chat message (`POST /api/ai/chat`).
    pub async fn chat(&self, message: &str, chat_id: &str) -> Result<Value> {
        self.post_json(
            "/api/ai/chat",
            &serde_json::json!({ "message": message, "chatId": chat_id }),
        )
        .await
    }

    /// Asks the backend to release a streaming session
    /// (`POST /api/agent/stream/close/{sessionId}`).
    pub async fn close_stream(&self, session_id: &str) -> Result<Value> {
        let path = format!("/api/agent/stream/close/{session_id}");
        self.post_json(&path, &Value::Null).await
    }

    /// Probes backend status (`GET /api/agent/status`).
    pub async fn status(&self) -> Result<Value> {
        let response = self
            .http
            .get(self.url("/api/agent/status"))
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| StrandError::transport(format!("Status request failed: {e}")))?;
        Self::json_body(response).await
    }

    async fn post_json<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<Value> {
        let response = self
            .http
            .post(self.url(path))
            .timeout(self.timeout)
            .json(body)
            .send()
            .await
            .map_err(|e| StrandError::transport(format!("Request to {path} failed: {e}")))?;
        Self::json_body(response).await
    }

    async fn json_body(response: reqwest::Response) -> Result<Value> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            return Err(StrandError::transport(format!(
                "HTTP {status}: {body}"
            )));
        }
        response
            .json()
            .await
            .map_err(|e| StrandError::Serialization {
                format: "JSON".to_string(),
                message: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advanced_request_serializes_camel_case() {
        let request = AdvancedTaskRequest::new("plan a trip", "chat_1", "be helpful");
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["prompt"], "plan a trip");
        assert_eq!(json["sessionId"], "chat_1");
        assert_eq!(json["systemPrompt"], "be helpful");
        assert_eq!(json["maxSteps"], 10);
    }

    #[test]
    fn base_url_trailing_slash_is_normalized() {
        let client = ApiClient::new(&ClientConfig {
            base_url: "http://localhost:8080/".to_string(),
            timeout_secs: 30,
        })
        .unwrap();
        assert_eq!(
            client.url("/api/agent/status"),
            "http://localhost:8080/api/agent/status"
        );
    }
}
