//! Test data helpers for creating test objects
//!
//! This module provides builders for settings, gateways and scripted
//! generators used across the integration tests.

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use StudyBuddy::config::Settings;
use StudyBuddy::models::study_session::StudySession;
use StudyBuddy::services::{BackoffPolicy, GeminiClient, GenerationGateway, StudyTools, TextGenerator};
use StudyBuddy::utils::errors::{ProviderError, ProviderResult};

use super::gemini_mock::{GeminiMockServer, TEST_MODEL};

/// Backoff unit small enough to keep retry tests fast
pub const FAST_BACKOFF: Duration = Duration::from_millis(5);

/// Settings pointing the Gemini client at a mock server
pub fn test_settings(mock: &GeminiMockServer) -> Settings {
    let mut settings = Settings::default();
    settings.gemini = mock.gemini_config();
    settings.generation.backoff_unit_ms = FAST_BACKOFF.as_millis() as u64;
    if let Ok(url) = std::env::var("TEST_DATABASE_URL") {
        settings.database.url = url;
    }
    settings
}

/// Gateway over a real HTTP client talking to the mock server
pub fn mock_gateway(mock: &GeminiMockServer) -> GenerationGateway {
    let client = GeminiClient::new(&mock.gemini_config()).expect("Failed to build Gemini client");
    GenerationGateway::new(Arc::new(client), TEST_MODEL).with_backoff(BackoffPolicy::new(FAST_BACKOFF))
}

pub fn mock_study_tools(mock: &GeminiMockServer) -> StudyTools {
    StudyTools::new(mock_gateway(mock))
}

/// Text generator replaying a script, repeating its last entry
pub struct ScriptedGenerator {
    script: Mutex<VecDeque<ProviderResult<String>>>,
    last: Mutex<Option<ProviderResult<String>>>,
    calls: AtomicU32,
}

impl ScriptedGenerator {
    pub fn new(script: Vec<ProviderResult<String>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            last: Mutex::new(None),
            calls: AtomicU32::new(0),
        })
    }

    pub fn always(result: ProviderResult<String>) -> Arc<Self> {
        Self::new(vec![result])
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate_content(&self, _model: &str, _prompt: &str) -> ProviderResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        let mut last = self.last.lock().unwrap();
        if let Some(result) = next {
            *last = Some(result);
        }
        last.clone().unwrap_or(Err(ProviderError::EmptyResponse))
    }
}

pub fn overloaded_error() -> ProviderError {
    ProviderError::Http {
        status: 503,
        body: "The model is overloaded. Please try again later.".to_string(),
    }
}

/// Session fixture for analysis tests
pub fn study_session(topic: &str, duration: &str, days_ago: i64) -> StudySession {
    StudySession {
        id: 0,
        user_id: 1,
        topic_name: topic.to_string(),
        duration_input: duration.to_string(),
        generated_content: String::new(),
        created_at: Utc::now() - ChronoDuration::days(days_ago),
    }
}
