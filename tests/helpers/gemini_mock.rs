//! Mock Gemini API server for testing
//!
//! This module provides a mock HTTP server that simulates the Gemini
//! `generateContent` endpoint. It uses wiremock to create configurable mock responses.

use serde_json::{json, Value};
use std::time::Duration;
use wiremock::{
    matchers::{method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};
use StudyBuddy::config::GeminiConfig;

pub const TEST_MODEL: &str = "gemini-2.5-flash";
pub const TEST_API_KEY: &str = "test-api-key";

/// Mock Gemini API server for testing
pub struct GeminiMockServer {
    pub server: MockServer,
}

/// Configuration for mock responses
#[derive(Debug, Clone)]
pub struct MockResponseConfig {
    pub status: u16,
    pub delay_ms: Option<u64>,
    pub body: Value,
    /// Serve this response at most this many times
    pub times: Option<u64>,
}

impl MockResponseConfig {
    pub fn success(text: &str) -> Self {
        Self {
            status: 200,
            delay_ms: None,
            body: generate_content_body(text),
            times: None,
        }
    }

    pub fn overloaded() -> Self {
        Self {
            status: 503,
            delay_ms: None,
            body: error_body(503, "The model is overloaded. Please try again later.", "UNAVAILABLE"),
            times: None,
        }
    }

    pub fn invalid_key() -> Self {
        Self {
            status: 400,
            delay_ms: None,
            body: error_body(400, "API key not valid. Please pass a valid API key.", "INVALID_ARGUMENT"),
            times: None,
        }
    }

    pub fn times(mut self, times: u64) -> Self {
        self.times = Some(times);
        self
    }

    pub fn delay(mut self, delay_ms: u64) -> Self {
        self.delay_ms = Some(delay_ms);
        self
    }
}

/// Successful `generateContent` response carrying `text`
pub fn generate_content_body(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "finishReason": "STOP",
            "index": 0
        }],
        "usageMetadata": {"promptTokenCount": 12, "candidatesTokenCount": 40, "totalTokenCount": 52}
    })
}

pub fn error_body(code: u16, message: &str, status: &str) -> Value {
    json!({"error": {"code": code, "message": message, "status": status}})
}

impl GeminiMockServer {
    /// Create a new mock Gemini API server
    pub async fn new() -> Self {
        Self { server: MockServer::start().await }
    }

    /// Base URL to put in `GeminiConfig::base_url`
    pub fn base_url(&self) -> String {
        format!("{}/v1beta", self.server.uri())
    }

    /// Client configuration pointed at this server
    pub fn gemini_config(&self) -> GeminiConfig {
        GeminiConfig {
            api_key: TEST_API_KEY.to_string(),
            model: TEST_MODEL.to_string(),
            base_url: self.base_url(),
            timeout_seconds: 5,
        }
    }

    /// Mount a response for generateContent.
    ///
    /// Limited mocks take precedence until used up, so mounting
    /// `overloaded().times(2)` then `success(..)` scripts two failures
    /// followed by success.
    pub async fn mock_generate(&self, config: MockResponseConfig) {
        let mut response = ResponseTemplate::new(config.status).set_body_json(config.body);
        if let Some(delay) = config.delay_ms {
            response = response.set_delay(Duration::from_millis(delay));
        }

        let mut mock = Mock::given(method("POST"))
            .and(path(format!("/v1beta/models/{}:generateContent", TEST_MODEL)))
            .and(query_param("key", TEST_API_KEY))
            .respond_with(response);

        if let Some(times) = config.times {
            mock = mock.up_to_n_times(times).with_priority(1);
        }

        mock.mount(&self.server).await;
    }

    /// Number of generateContent calls received so far
    pub async fn request_count(&self) -> usize {
        self.server
            .received_requests()
            .await
            .map(|requests| requests.len())
            .unwrap_or(0)
    }

    /// Prompt text of the most recent request
    pub async fn last_prompt(&self) -> Option<String> {
        let requests = self.server.received_requests().await?;
        let body: Value = serde_json::from_slice(&requests.last()?.body).ok()?;
        body["contents"][0]["parts"][0]["text"].as_str().map(|s| s.to_string())
    }

    /// Reset all mocks
    pub async fn reset(&self) {
        self.server.reset().await;
    }
}
