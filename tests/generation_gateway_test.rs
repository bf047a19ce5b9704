//! Generation gateway integration tests
//!
//! Exercises the retry loop against a mock Gemini server and scripted
//! generators.

mod helpers;

use assert_matches::assert_matches;
use helpers::*;
use proptest::prelude::*;
use std::time::{Duration, Instant};
use StudyBuddy::services::{is_transient_error, GenerationGateway, TextGenerator};
use StudyBuddy::utils::errors::{GenerationError, ProviderError, OVERLOADED_FALLBACK_MESSAGE};
use StudyBuddy::services::GeminiClient;

#[tokio::test]
async fn test_gemini_client_returns_text() {
    init_test_env();
    let mock = GeminiMockServer::new().await;
    mock.mock_generate(MockResponseConfig::success("Photosynthesis turns light into energy.")).await;

    let client = GeminiClient::new(&mock.gemini_config()).unwrap();
    let text = client.generate_content(TEST_MODEL, "Explain photosynthesis").await.unwrap();

    assert_eq!(text, "Photosynthesis turns light into energy.");
    assert_eq!(mock.last_prompt().await.as_deref(), Some("Explain photosynthesis"));
}

#[tokio::test]
async fn test_gemini_client_maps_http_errors() {
    let mock = GeminiMockServer::new().await;
    mock.mock_generate(MockResponseConfig::invalid_key()).await;

    let client = GeminiClient::new(&mock.gemini_config()).unwrap();
    let error = client.generate_content(TEST_MODEL, "hi").await.unwrap_err();

    assert_matches!(&error, ProviderError::Http { status: 400, body } if body.contains("API key not valid"));
    assert!(!is_transient_error(&error.to_string()));
}

#[tokio::test]
async fn test_gemini_503_is_transient() {
    let mock = GeminiMockServer::new().await;
    mock.mock_generate(MockResponseConfig::overloaded()).await;

    let client = GeminiClient::new(&mock.gemini_config()).unwrap();
    let error = client.generate_content(TEST_MODEL, "hi").await.unwrap_err();

    assert_matches!(error, ProviderError::Http { status: 503, .. });
    assert!(is_transient_error(&error.to_string()));
}

#[tokio::test]
async fn test_gemini_client_timeout() {
    let mock = GeminiMockServer::new().await;
    mock.mock_generate(MockResponseConfig::success("late").delay(2_500)).await;

    let mut config = mock.gemini_config();
    config.timeout_seconds = 1;
    let client = GeminiClient::new(&config).unwrap();

    let error = client.generate_content(TEST_MODEL, "hi").await.unwrap_err();
    assert_eq!(error, ProviderError::Timeout);
}

#[tokio::test]
async fn test_gateway_retries_overload_then_succeeds() {
    let mock = GeminiMockServer::new().await;
    mock.mock_generate(MockResponseConfig::overloaded().times(2)).await;
    mock.mock_generate(MockResponseConfig::success("Recovered answer")).await;

    let result = mock_gateway(&mock).generate("Explain entropy", 3).await;

    assert_eq!(result, Ok("Recovered answer".to_string()));
    assert_eq!(mock.request_count().await, 3);
}

#[tokio::test]
async fn test_gateway_exhausts_budget_on_persistent_overload() {
    let mock = GeminiMockServer::new().await;
    mock.mock_generate(MockResponseConfig::overloaded()).await;

    let start = Instant::now();
    let text = mock_gateway(&mock).generate_text("Explain entropy", 3).await;

    assert_eq!(text, OVERLOADED_FALLBACK_MESSAGE);
    assert_eq!(mock.request_count().await, 3);
    // 2 + 4 backoff units
    assert!(start.elapsed() >= FAST_BACKOFF * 6);
}

#[tokio::test]
async fn test_gateway_stops_on_non_transient_error() {
    let mock = GeminiMockServer::new().await;
    mock.mock_generate(MockResponseConfig::invalid_key()).await;

    let result = mock_gateway(&mock).generate("Explain entropy", 3).await;

    assert_matches!(result, Err(GenerationError::Failed { ref detail }) if detail.contains("API key not valid"));
    assert_eq!(mock.request_count().await, 1);
}

#[tokio::test]
async fn test_gateway_single_attempt_budget() {
    let mock = GeminiMockServer::new().await;
    mock.mock_generate(MockResponseConfig::overloaded()).await;

    let result = mock_gateway(&mock).generate("prompt", 1).await;

    assert_eq!(result, Err(GenerationError::Overloaded { attempts: 1 }));
    assert_eq!(mock.request_count().await, 1);
}

#[tokio::test]
async fn test_scripted_success_after_failures() {
    let stub = ScriptedGenerator::new(vec![
        Err(overloaded_error()),
        Err(ProviderError::Network("Service UNAVAILABLE right now".to_string())),
        Ok("third time lucky".to_string()),
    ]);
    let gateway = GenerationGateway::new(stub.clone(), TEST_MODEL)
        .with_backoff(StudyBuddy::services::BackoffPolicy::new(Duration::from_millis(1)));

    let result = gateway.generate("prompt", 5).await;

    assert_eq!(result, Ok("third time lucky".to_string()));
    assert_eq!(stub.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_default_backoff_schedule_in_virtual_time() {
    let stub = ScriptedGenerator::always(Err(overloaded_error()));
    let gateway = GenerationGateway::new(stub.clone(), TEST_MODEL);
    let start = tokio::time::Instant::now();

    let result = gateway.generate("prompt", 3).await;

    assert_matches!(result, Err(GenerationError::Overloaded { attempts: 3 }));
    assert_eq!(stub.calls(), 3);
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_secs(6) && elapsed < Duration::from_secs(14), "elapsed {:?}", elapsed);
}

proptest! {
    #[test]
    fn prop_marker_anywhere_is_transient(prefix in "[a-z ]{0,12}", suffix in "[a-z ]{0,12}", marker in prop::sample::select(vec!["overload", "503", "UNAVAILABLE", "Overloaded"])) {
        let message = format!("{}{}{}", prefix, marker, suffix);
        prop_assert!(is_transient_error(&message));
    }

    #[test]
    fn prop_digits_without_503_are_not_transient(code in 100u16..600) {
        prop_assume!(code != 503);
        let message = format!("HTTP {}: request failed", code);
        prop_assert!(!is_transient_error(&message));
    }
}
