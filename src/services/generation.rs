//! Generation gateway
//!
//! Wraps a text-generation client with bounded retries and exponential
//! backoff. Errors whose text mentions an overloaded or unavailable service
//! are retried; anything else ends the call on the first failure.

use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use tracing::{debug, warn};
use crate::config::settings::{GenerationConfig, Settings};
use crate::utils::errors::{GenerationError, ProviderResult};
use crate::utils::logging;

/// Retry budget used when callers do not pick one
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Lower-cased substrings that mark a provider error as transient
const TRANSIENT_MARKERS: [&str; 3] = ["overload", "503", "unavailable"];

/// Capability of an external text-generation service
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate text for `prompt` with the model named `model`
    async fn generate_content(&self, model: &str, prompt: &str) -> ProviderResult<String>;
}

/// Whether an error description denotes a transient service condition
pub fn is_transient_error(message: &str) -> bool {
    let message = message.to_lowercase();
    TRANSIENT_MARKERS.iter().any(|marker| message.contains(marker))
}

/// Exponential backoff schedule: attempt `i` (0-indexed) waits `2^(i+1)` units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    unit: Duration,
}

impl BackoffPolicy {
    pub fn new(unit: Duration) -> Self {
        Self { unit }
    }

    pub fn from_config(config: &GenerationConfig) -> Self {
        Self::new(Duration::from_millis(config.backoff_unit_ms))
    }

    /// Wait after the failed attempt `attempt` (0-indexed)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt.saturating_add(1)).unwrap_or(u32::MAX);
        self.unit.saturating_mul(factor)
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

/// Stateless gateway in front of an injected [`TextGenerator`]
#[derive(Clone)]
pub struct GenerationGateway {
    client: Arc<dyn TextGenerator>,
    model: String,
    backoff: BackoffPolicy,
    max_retries: u32,
}

impl GenerationGateway {
    pub fn new(client: Arc<dyn TextGenerator>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            backoff: BackoffPolicy::default(),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Build a gateway using the model and retry policy from settings
    pub fn from_settings(client: Arc<dyn TextGenerator>, settings: &Settings) -> Self {
        Self::new(client, settings.gemini.model.clone())
            .with_backoff(BackoffPolicy::from_config(&settings.generation))
            .with_max_retries(settings.generation.max_retries)
    }

    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Generate text with the configured retry budget
    pub async fn generate_default(&self, prompt: &str) -> Result<String, GenerationError> {
        self.generate(prompt, self.max_retries).await
    }

    /// Generate text, making at most `max_retries` attempts (at least one).
    ///
    /// Transient failures are retried after the backoff delay; there is no
    /// wait after the final attempt. Dropping the returned future cancels any
    /// pending wait.
    pub async fn generate(&self, prompt: &str, max_retries: u32) -> Result<String, GenerationError> {
        let max_attempts = max_retries.max(1);

        for attempt in 0..max_attempts {
            debug!(attempt = attempt + 1, max_attempts, model = %self.model, "Requesting generation");

            let error = match self.client.generate_content(&self.model, prompt).await {
                Ok(text) => return Ok(text),
                Err(error) => error.to_string(),
            };

            if !is_transient_error(&error) {
                logging::log_api_error("generation", &error, Some(self.model.as_str()));
                return Err(GenerationError::Failed { detail: error });
            }

            if attempt + 1 < max_attempts {
                let wait = self.backoff.delay_for(attempt);
                logging::log_generation_retry(attempt + 1, max_attempts, wait, &error);
                tokio::time::sleep(wait).await;
            }
        }

        warn!(attempts = max_attempts, model = %self.model, "AI service still overloaded, returning fallback");
        Err(GenerationError::Overloaded { attempts: max_attempts })
    }

    /// Like [`generate`](Self::generate) but always yields a string: the
    /// generated text, the overload fallback, or a message embedding the error.
    pub async fn generate_text(&self, prompt: &str, max_retries: u32) -> String {
        match self.generate(prompt, max_retries).await {
            Ok(text) => text,
            Err(error) => error.user_message(),
        }
    }
}

impl std::fmt::Debug for GenerationGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationGateway")
            .field("model", &self.model)
            .field("backoff", &self.backoff)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;
    use crate::utils::errors::{ProviderError, OVERLOADED_FALLBACK_MESSAGE};

    /// Replays scripted results, repeating the last one when exhausted
    struct ScriptedGenerator {
        script: Mutex<VecDeque<ProviderResult<String>>>,
        last: Mutex<Option<ProviderResult<String>>>,
        calls: AtomicU32,
    }

    impl ScriptedGenerator {
        fn new(script: Vec<ProviderResult<String>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                last: Mutex::new(None),
                calls: AtomicU32::new(0),
            })
        }

        fn calls(&self) -> u32 {
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

    fn overloaded() -> ProviderResult<String> {
        Err(ProviderError::Http {
            status: 503,
            body: "The model is overloaded. Please try again later.".to_string(),
        })
    }

    fn gateway(stub: &Arc<ScriptedGenerator>) -> GenerationGateway {
        GenerationGateway::new(stub.clone(), "test-model")
    }

    #[test]
    fn test_transient_classification() {
        assert!(is_transient_error("Service UNAVAILABLE right now"));
        assert!(is_transient_error("HTTP 503: busy"));
        assert!(is_transient_error("The model is Overloaded"));
        assert!(!is_transient_error("invalid api key"));
        assert!(!is_transient_error("HTTP 400: bad request"));
    }

    #[test]
    fn test_backoff_schedule() {
        let backoff = BackoffPolicy::default();
        assert_eq!(backoff.delay_for(0), Duration::from_secs(2));
        assert_eq!(backoff.delay_for(1), Duration::from_secs(4));
        assert_eq!(backoff.delay_for(2), Duration::from_secs(8));

        let fast = BackoffPolicy::new(Duration::from_millis(10));
        assert_eq!(fast.delay_for(1), Duration::from_millis(40));
    }

    #[test]
    fn test_backoff_saturates() {
        let backoff = BackoffPolicy::default();
        assert!(backoff.delay_for(200) >= backoff.delay_for(30));
    }

    #[tokio::test(start_paused = true)]
    async fn test_immediate_success() {
        let stub = ScriptedGenerator::new(vec![Ok("Study notes".to_string())]);
        let start = Instant::now();

        let result = gateway(&stub).generate("prompt", 3).await;

        assert_eq!(result, Ok("Study notes".to_string()));
        assert_eq!(stub.calls(), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_always_transient_exhausts_budget() {
        let stub = ScriptedGenerator::new(vec![overloaded()]);
        let start = Instant::now();

        let text = gateway(&stub).generate_text("prompt", 3).await;

        assert_eq!(text, OVERLOADED_FALLBACK_MESSAGE);
        assert_eq!(stub.calls(), 3);
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(6), "elapsed {:?}", elapsed);
        assert!(elapsed < Duration::from_secs(14), "no wait after the last attempt, elapsed {:?}", elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_always_transient_returns_tagged_overload() {
        let stub = ScriptedGenerator::new(vec![Err(ProviderError::Network(
            "Service UNAVAILABLE right now".to_string(),
        ))]);

        let result = gateway(&stub).generate("prompt", 4).await;

        assert_eq!(result, Err(GenerationError::Overloaded { attempts: 4 }));
        assert_eq!(stub.calls(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_transient_is_not_retried() {
        let stub = ScriptedGenerator::new(vec![
            Err(ProviderError::InvalidResponse("invalid api key".to_string())),
            Ok("never reached".to_string()),
        ]);
        let start = Instant::now();

        let text = gateway(&stub).generate_text("prompt", 3).await;

        assert!(text.contains("invalid api key"));
        assert_eq!(stub.calls(), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_after_transient_failures() {
        for k in 1..=3u32 {
            let mut script: Vec<ProviderResult<String>> = (1..k).map(|_| overloaded()).collect();
            script.push(Ok(format!("answer {}", k)));
            let stub = ScriptedGenerator::new(script);

            let result = gateway(&stub).generate("prompt", 3).await;

            assert_eq!(result, Ok(format!("answer {}", k)));
            assert_eq!(stub.calls(), k);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_attempt_budget_has_no_sleep() {
        let stub = ScriptedGenerator::new(vec![overloaded()]);
        let start = Instant::now();

        let result = gateway(&stub).generate("prompt", 1).await;

        assert_eq!(result, Err(GenerationError::Overloaded { attempts: 1 }));
        assert_eq!(stub.calls(), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_budget_still_attempts_once() {
        let stub = ScriptedGenerator::new(vec![Ok("text".to_string())]);

        let result = gateway(&stub).generate("prompt", 0).await;

        assert_eq!(result, Ok("text".to_string()));
        assert_eq!(stub.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_future_cancels_retries() {
        let stub = ScriptedGenerator::new(vec![overloaded()]);
        let gw = gateway(&stub);

        let outcome = tokio::time::timeout(Duration::from_secs(1), gw.generate("prompt", 3)).await;

        assert!(outcome.is_err());
        assert_eq!(stub.calls(), 1);
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(stub.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_from_settings_uses_configured_policy() {
        let mut settings = Settings::default();
        settings.generation.max_retries = 2;
        settings.generation.backoff_unit_ms = 10;
        let stub = ScriptedGenerator::new(vec![overloaded()]);
        let gw = GenerationGateway::from_settings(stub.clone(), &settings);
        let start = Instant::now();

        let result = gw.generate_default("prompt").await;

        assert_eq!(result, Err(GenerationError::Overloaded { attempts: 2 }));
        assert_eq!(gw.model(), "gemini-2.5-flash");
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(20) && elapsed < Duration::from_secs(1), "elapsed {:?}", elapsed);
    }
}
