// ABOUTME: Integration tests for the model invocation client policy
// ABOUTME: Covers timeouts on a paused clock, the single transient retry, capability checks and stream supervision
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FridgeChef Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{fridge_photo, init_test_logging, recipe, recipe_json};
use fridge_chef::errors::{AppError, ErrorCode};
use fridge_chef::llm::{
    ClientConfig, LlmCapabilities, ModelClient, ModelRequest, ScriptedProvider, StreamEvent,
};
use fridge_chef::models::Recipe;
use tokio_stream::StreamExt;

fn config(retry_transient: bool) -> ClientConfig {
    ClientConfig {
        request_timeout: Duration::from_secs(60),
        stream_idle_timeout: Duration::from_secs(30),
        retry_transient,
    }
}

fn client(provider: &Arc<ScriptedProvider>, retry_transient: bool) -> ModelClient {
    init_test_logging();
    ModelClient::with_config(provider.clone(), config(retry_transient))
}

// ============================================================================
// Blocking calls
// ============================================================================

#[tokio::test]
async fn test_invoke_validates_shape() {
    let provider = Arc::new(ScriptedProvider::new());
    provider.push_response(recipe_json(&recipe("Toast")));

    let parsed: Recipe = client(&provider, true)
        .invoke(&ModelRequest::new("make toast"))
        .await
        .unwrap();

    assert_eq!(parsed, recipe("Toast"));
    assert!(provider.requests()[0].response_schema.is_some());
}

#[tokio::test]
async fn test_invoke_skips_schema_without_json_mode() {
    let provider = Arc::new(ScriptedProvider::new().with_capabilities(LlmCapabilities::text_only()));
    provider.push_response(recipe_json(&recipe("Toast")));

    let _: Recipe = client(&provider, true)
        .invoke(&ModelRequest::new("make toast"))
        .await
        .unwrap();

    assert!(provider.requests()[0].response_schema.is_none());
}

#[tokio::test]
async fn test_invoke_reports_schema_violation() {
    let provider = Arc::new(ScriptedProvider::new());
    provider.push_response("I would suggest toast.");

    let error = client(&provider, true)
        .invoke::<Recipe>(&ModelRequest::new("make toast"))
        .await
        .unwrap_err();

    assert_eq!(error.code, ErrorCode::SchemaViolation);
    assert_eq!(provider.call_count(), 1);
}

#[tokio::test]
async fn test_transient_failure_is_retried_once() {
    let provider = Arc::new(ScriptedProvider::new());
    provider.push_error(AppError::network_failure("scripted", "connection reset"));
    provider.push_response("Hello there");

    let reply: String = client(&provider, true)
        .invoke(&ModelRequest::new("hi"))
        .await
        .unwrap();

    assert_eq!(reply, "Hello there");
    assert_eq!(provider.call_count(), 2);
}

#[tokio::test]
async fn test_second_transient_failure_surfaces() {
    let provider = Arc::new(ScriptedProvider::new());
    provider.push_error(AppError::network_failure("scripted", "reset"));
    provider.push_error(AppError::provider_timeout("scripted", "504"));
    provider.push_response("never reached");

    let error = client(&provider, true)
        .invoke::<String>(&ModelRequest::new("hi"))
        .await
        .unwrap_err();

    assert_eq!(error.code, ErrorCode::ProviderTimeout);
    assert_eq!(provider.call_count(), 2);
}

#[tokio::test]
async fn test_retry_can_be_disabled() {
    let provider = Arc::new(ScriptedProvider::new());
    provider.push_error(AppError::network_failure("scripted", "reset"));
    provider.push_response("never reached");

    let error = client(&provider, false)
        .invoke::<String>(&ModelRequest::new("hi"))
        .await
        .unwrap_err();

    assert_eq!(error.code, ErrorCode::NetworkFailure);
    assert_eq!(provider.call_count(), 1);
}

#[tokio::test]
async fn test_non_transient_failures_are_not_retried() {
    for error in [
        AppError::rate_limited("quota"),
        AppError::invalid_response("scripted", "garbled"),
        AppError::new(ErrorCode::ProviderAuthFailed, "bad key"),
    ] {
        let provider = Arc::new(ScriptedProvider::new());
        let code = error.code;
        provider.push_error(error);
        provider.push_response("never reached");

        let surfaced = client(&provider, true)
            .invoke::<String>(&ModelRequest::new("hi"))
            .await
            .unwrap_err();

        assert_eq!(surfaced.code, code);
        assert_eq!(provider.call_count(), 1);
    }
}

#[tokio::test(start_paused = true)]
async fn test_slow_provider_times_out_after_retry() {
    let provider = Arc::new(ScriptedProvider::new().with_response_delay(Duration::from_secs(120)));
    provider.push_response("too late");
    provider.push_response("too late");

    let error = client(&provider, true)
        .invoke::<String>(&ModelRequest::new("hi"))
        .await
        .unwrap_err();

    assert_eq!(error.code, ErrorCode::ProviderTimeout);
    assert_eq!(provider.call_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_timeout_without_retry() {
    let provider = Arc::new(ScriptedProvider::new().with_response_delay(Duration::from_secs(61)));
    provider.push_response("too late");

    let error = client(&provider, false)
        .invoke::<String>(&ModelRequest::new("hi"))
        .await
        .unwrap_err();

    assert_eq!(error.code, ErrorCode::ProviderTimeout);
    assert!(error.is_retryable());
    assert_eq!(provider.call_count(), 1);
}

#[tokio::test]
async fn test_image_request_needs_vision() {
    let provider = Arc::new(ScriptedProvider::new().with_capabilities(LlmCapabilities::text_only()));

    let error = client(&provider, true)
        .complete(&ModelRequest::new("look").with_image(fridge_photo()))
        .await
        .unwrap_err();

    assert_eq!(error.code, ErrorCode::ConfigError);
    assert_eq!(provider.call_count(), 0);
}

// ============================================================================
// Streaming calls
// ============================================================================

#[tokio::test]
async fn test_stream_passes_events_through() {
    let provider = Arc::new(ScriptedProvider::new());
    provider.push_stream(vec![
        StreamEvent::text("hello"),
        StreamEvent::tool_start("1", "recipe"),
        StreamEvent::tool_args("1", "{}"),
        StreamEvent::tool_complete("1"),
        StreamEvent::StreamEnd,
    ]);

    let events: Vec<StreamEvent> = client(&provider, true)
        .invoke_stream(&ModelRequest::new("hi"))
        .await
        .unwrap()
        .collect()
        .await;

    assert_eq!(events.len(), 5);
    assert_eq!(events[0], StreamEvent::text("hello"));
    assert_eq!(events[4], StreamEvent::StreamEnd);
}

#[tokio::test]
async fn test_stream_gets_synthetic_end() {
    let provider = Arc::new(ScriptedProvider::new());
    provider.push_stream(vec![StreamEvent::text("partial")]);

    let events: Vec<StreamEvent> = client(&provider, true)
        .invoke_stream(&ModelRequest::new("hi"))
        .await
        .unwrap()
        .collect()
        .await;

    assert_eq!(events, vec![StreamEvent::text("partial"), StreamEvent::StreamEnd]);
}

#[tokio::test]
async fn test_stream_stops_after_terminal_event() {
    let provider = Arc::new(ScriptedProvider::new());
    provider.push_stream(vec![
        StreamEvent::error(ErrorCode::NetworkFailure, "reset"),
        StreamEvent::text("late"),
        StreamEvent::StreamEnd,
    ]);
    let probe = provider.release_probe();

    let events: Vec<StreamEvent> = client(&provider, true)
        .invoke_stream(&ModelRequest::new("hi"))
        .await
        .unwrap()
        .collect()
        .await;

    assert_eq!(events, vec![StreamEvent::error(ErrorCode::NetworkFailure, "reset")]);
    assert!(probe.all_released());
}

#[tokio::test(start_paused = true)]
async fn test_stream_idle_timeout() {
    let provider = Arc::new(ScriptedProvider::new().with_event_delay(Duration::from_secs(45)));
    provider.push_stream(vec![StreamEvent::text("slow"), StreamEvent::StreamEnd]);
    let probe = provider.release_probe();

    let events: Vec<StreamEvent> = client(&provider, true)
        .invoke_stream(&ModelRequest::new("hi"))
        .await
        .unwrap()
        .collect()
        .await;

    assert_eq!(events.len(), 1);
    assert!(matches!(
        &events[0],
        StreamEvent::StreamError { kind: ErrorCode::ProviderTimeout, .. }
    ));
    assert!(probe.all_released());
}

#[tokio::test]
async fn test_stream_establishment_is_retried() {
    let provider = Arc::new(ScriptedProvider::new());
    provider.push_stream_error(AppError::network_failure("scripted", "refused"));
    provider.push_stream(vec![StreamEvent::StreamEnd]);

    let events: Vec<StreamEvent> = client(&provider, true)
        .invoke_stream(&ModelRequest::new("hi"))
        .await
        .unwrap()
        .collect()
        .await;

    assert_eq!(events, vec![StreamEvent::StreamEnd]);
    assert_eq!(provider.call_count(), 2);
}

#[tokio::test]
async fn test_stream_establishment_rate_limit_surfaces() {
    let provider = Arc::new(ScriptedProvider::new());
    provider.push_stream_error(AppError::rate_limited("quota"));
    provider.push_stream(vec![StreamEvent::StreamEnd]);

    let result = client(&provider, true)
        .invoke_stream(&ModelRequest::new("hi"))
        .await;

    assert_eq!(result.err().map(|e| e.code), Some(ErrorCode::RateLimited));
    assert_eq!(provider.call_count(), 1);
}

#[test]
fn test_client_config_from_chef_config() {
    let chef_config = fridge_chef::config::ChefConfig {
        request_timeout: Duration::from_secs(5),
        stream_idle_timeout: Duration::from_secs(7),
        retry_transient: false,
        ..Default::default()
    };

    let config = ClientConfig::from(&chef_config);

    assert_eq!(config.request_timeout, Duration::from_secs(5));
    assert_eq!(config.stream_idle_timeout, Duration::from_secs(7));
    assert!(!config.retry_transient);
}
