// ABOUTME: Tests for the shared SSE line-buffering parser and provider stream translators
// ABOUTME: Covers partial lines, split UTF-8, [DONE] handling, error classification and tool call expansion
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FridgeChef Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use bytes::Bytes;
use fridge_chef::errors::ErrorCode;
use fridge_chef::llm::sse_parser::{
    classify_status, create_event_stream, friendly_rate_limit_message, is_retryable_status,
    SseEvent, SseLineBuffer, StreamTranslator,
};
use fridge_chef::llm::{GeminiStreamTranslator, OpenAiStreamTranslator, StreamEvent};
use futures_util::stream;
use tokio_stream::StreamExt;

async fn translate_chunks<T: StreamTranslator>(chunks: &[&str], translator: T) -> Vec<StreamEvent> {
    common::init_test_logging();
    let bytes: Vec<Result<Bytes, reqwest::Error>> = chunks
        .iter()
        .map(|chunk| Ok(Bytes::copy_from_slice(chunk.as_bytes())))
        .collect();
    create_event_stream(stream::iter(bytes), translator, "test")
        .collect()
        .await
}

// ============================================================================
// Line Buffer
// ============================================================================

#[test]
fn test_complete_line() {
    let mut parser = SseLineBuffer::new();
    let events = parser.feed(b"data: {\"a\":1}\n\n");
    assert_eq!(events, vec![SseEvent::Data("{\"a\":1}".to_owned())]);
}

#[test]
fn test_multiple_events_in_one_chunk() {
    let mut parser = SseLineBuffer::new();
    let events = parser.feed(b"data: {\"a\":1}\n\ndata: {\"b\":2}\n\n");
    assert_eq!(
        events,
        vec![
            SseEvent::Data("{\"a\":1}".to_owned()),
            SseEvent::Data("{\"b\":2}".to_owned()),
        ]
    );
}

#[test]
fn test_partial_line_across_chunks() {
    let mut parser = SseLineBuffer::new();
    assert!(parser.feed(b"data: {\"text\":\"hel").is_empty());
    let events = parser.feed(b"lo\"}\n\n");
    assert_eq!(events, vec![SseEvent::Data("{\"text\":\"hello\"}".to_owned())]);
}

#[test]
fn test_utf8_split_across_chunks() {
    let line = "data: {\"text\":\"crème\"}\n".as_bytes();
    let split = line.iter().position(|&b| b == 0xC3).unwrap() + 1;

    let mut parser = SseLineBuffer::new();
    assert!(parser.feed(&line[..split]).is_empty());
    let events = parser.feed(&line[split..]);

    assert_eq!(events, vec![SseEvent::Data("{\"text\":\"crème\"}".to_owned())]);
}

#[test]
fn test_done_and_ignored_fields() {
    let mut parser = SseLineBuffer::new();
    let events = parser.feed(b": keep-alive\nevent: message\nid: 7\ndata: [DONE]\n\n");
    assert_eq!(events, vec![SseEvent::Done]);
}

#[test]
fn test_flush_emits_unterminated_line() {
    let mut parser = SseLineBuffer::new();
    assert!(parser.feed(b"data: {\"last\":true}").is_empty());
    assert_eq!(parser.flush(), vec![SseEvent::Data("{\"last\":true}".to_owned())]);
    assert!(parser.flush().is_empty());
}

// ============================================================================
// Gemini translation
// ============================================================================

#[tokio::test]
async fn test_gemini_text_and_function_calls() {
    let chunks = [
        "data: {\"candidates\":[{\"content\":{\"role\":\"model\",\"parts\":[{\"text\":\"Here you go\"}]}}]}\n\n",
        "data: {\"candidates\":[{\"content\":{\"parts\":[{\"functionCall\":{\"name\":\"recipe\",\"args\":{\"name\":\"Omelette\"}}}]}}]}\n\n",
    ];

    let events = translate_chunks(&chunks, GeminiStreamTranslator).await;

    assert_eq!(events.len(), 5);
    assert_eq!(events[0], StreamEvent::text("Here you go"));
    let StreamEvent::ToolCallStart { id, name } = &events[1] else {
        panic!("expected ToolCallStart, got {:?}", events[1]);
    };
    assert_eq!(name, "recipe");
    assert!(!id.is_empty());
    let StreamEvent::ToolCallArgsDelta { fragment, .. } = &events[2] else {
        panic!("expected ToolCallArgsDelta, got {:?}", events[2]);
    };
    let args: serde_json::Value = serde_json::from_str(fragment).unwrap();
    assert_eq!(args["name"], "Omelette");
    assert_eq!(events[3], StreamEvent::tool_complete(id.clone()));
    assert_eq!(events[4], StreamEvent::StreamEnd);
}

#[tokio::test]
async fn test_gemini_calls_get_distinct_ids() {
    let chunk = "data: {\"candidates\":[{\"content\":{\"parts\":[\
        {\"functionCall\":{\"name\":\"recipe\",\"args\":{}}},\
        {\"functionCall\":{\"name\":\"recipe\",\"args\":{}}}]}}]}\n\n";

    let events = translate_chunks(&[chunk], GeminiStreamTranslator).await;

    let ids: Vec<&str> = events
        .iter()
        .filter_map(|event| match event {
            StreamEvent::ToolCallStart { id, .. } => Some(id.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(ids.len(), 2);
    assert_ne!(ids[0], ids[1]);
}

#[tokio::test]
async fn test_gemini_malformed_chunk_ends_stream() {
    let chunks = [
        "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"ok\"}]}}]}\n\n",
        "data: {not json}\n\n",
        "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"never\"}]}}]}\n\n",
    ];

    let events = translate_chunks(&chunks, GeminiStreamTranslator).await;

    assert_eq!(events.len(), 2);
    assert_eq!(events[0], StreamEvent::text("ok"));
    assert!(matches!(
        &events[1],
        StreamEvent::StreamError { kind: ErrorCode::InvalidResponse, .. }
    ));
}

#[tokio::test]
async fn test_gemini_inline_error_is_classified() {
    let chunk = "data: {\"error\":{\"code\":429,\"message\":\"Please retry in 6.4s\"}}\n\n";

    let events = translate_chunks(&[chunk], GeminiStreamTranslator).await;

    assert_eq!(
        events,
        vec![StreamEvent::error(
            ErrorCode::RateLimited,
            "AI service quota exceeded. Please try again in 7 seconds."
        )]
    );
}

// ============================================================================
// OpenAI-compatible translation
// ============================================================================

#[tokio::test]
async fn test_openai_fragmented_tool_call() {
    let chunks = [
        "data: {\"choices\":[{\"delta\":{\"tool_calls\":[{\"index\":0,\"id\":\"call_a\",\"function\":{\"name\":\"recipe\",\"arguments\":\"\"}}]}}]}\n\n",
        "data: {\"choices\":[{\"delta\":{\"tool_calls\":[{\"index\":0,\"function\":{\"arguments\":\"{\\\"name\\\":\"}}]}}]}\n\n",
        "data: {\"choices\":[{\"delta\":{\"tool_calls\":[{\"index\":0,\"function\":{\"arguments\":\"\\\"Soup\\\"}\"}}]}}]}\n\n",
        "data: {\"choices\":[{\"delta\":{},\"finish_reason\":\"tool_calls\"}]}\n\n",
        "data: [DONE]\n\n",
    ];

    let events = translate_chunks(&chunks, OpenAiStreamTranslator::new("test")).await;

    assert_eq!(
        events,
        vec![
            StreamEvent::tool_start("call_a", "recipe"),
            StreamEvent::tool_args("call_a", "{\"name\":"),
            StreamEvent::tool_args("call_a", "\"Soup\"}"),
            StreamEvent::tool_complete("call_a"),
            StreamEvent::StreamEnd,
        ]
    );
}

#[tokio::test]
async fn test_openai_parallel_calls_by_index() {
    let chunks = [
        "data: {\"choices\":[{\"delta\":{\"tool_calls\":[{\"index\":0,\"id\":\"a\",\"function\":{\"name\":\"recipe\"}},{\"index\":1,\"id\":\"b\",\"function\":{\"name\":\"recipe\"}}]}}]}\n\n",
        "data: {\"choices\":[{\"delta\":{\"tool_calls\":[{\"index\":1,\"function\":{\"arguments\":\"{}\"}}]}}]}\n\n",
        "data: [DONE]\n\n",
    ];

    let events = translate_chunks(&chunks, OpenAiStreamTranslator::new("test")).await;

    assert_eq!(
        events,
        vec![
            StreamEvent::tool_start("a", "recipe"),
            StreamEvent::tool_start("b", "recipe"),
            StreamEvent::tool_args("b", "{}"),
            StreamEvent::tool_complete("a"),
            StreamEvent::tool_complete("b"),
            StreamEvent::StreamEnd,
        ]
    );
}

#[tokio::test]
async fn test_openai_body_end_without_done() {
    let chunks = ["data: {\"choices\":[{\"delta\":{\"content\":\"Hi\"}}]}"];

    let events = translate_chunks(&chunks, OpenAiStreamTranslator::new("test")).await;

    assert_eq!(events, vec![StreamEvent::text("Hi"), StreamEvent::StreamEnd]);
}

#[tokio::test]
async fn test_openai_events_after_done_are_ignored() {
    let chunks = [
        "data: [DONE]\n\ndata: {\"choices\":[{\"delta\":{\"content\":\"late\"}}]}\n\n",
    ];

    let events = translate_chunks(&chunks, OpenAiStreamTranslator::new("test")).await;

    assert_eq!(events, vec![StreamEvent::StreamEnd]);
}

// ============================================================================
// Error classification
// ============================================================================

#[test]
fn test_classify_status() {
    assert_eq!(classify_status("p", 429, "quota").code, ErrorCode::RateLimited);
    assert_eq!(classify_status("p", 401, "no").code, ErrorCode::ProviderAuthFailed);
    assert_eq!(classify_status("p", 403, "no").code, ErrorCode::ProviderAuthFailed);
    assert_eq!(classify_status("p", 504, "slow").code, ErrorCode::ProviderTimeout);
    assert_eq!(classify_status("p", 503, "down").code, ErrorCode::NetworkFailure);
    assert_eq!(classify_status("p", 400, "bad").code, ErrorCode::InvalidResponse);
}

#[test]
fn test_retryable_statuses_match_transient_codes() {
    for status in [408_u16, 500, 502, 503, 504] {
        assert!(is_retryable_status(status), "{status}");
        assert!(classify_status("p", status, "").is_retryable(), "{status}");
    }
    for status in [400_u16, 401, 403, 404, 429] {
        assert!(!is_retryable_status(status), "{status}");
        assert!(!classify_status("p", status, "").is_retryable(), "{status}");
    }
}

#[test]
fn test_friendly_rate_limit_message() {
    assert_eq!(
        friendly_rate_limit_message("Quota exceeded. Please retry in 6.4s."),
        "AI service quota exceeded. Please try again in 7 seconds."
    );
    assert_eq!(
        friendly_rate_limit_message("Rate limit reached, try again in 20s"),
        "AI service quota exceeded. Please try again in 20 seconds."
    );
    assert_eq!(
        friendly_rate_limit_message("Resource exhausted"),
        "AI service quota exceeded. Please wait a moment and try again."
    );
}
