// ABOUTME: Shared SSE line-buffering parser and HTTP error classification for providers
// ABOUTME: Turns raw response bytes into provider-neutral stream events via a translator
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FridgeChef Contributors

//! # SSE Stream Parser
//!
//! A shared line-buffering parser for Server-Sent Events (SSE) used by all providers.
//! It handles two transport realities:
//!
//! 1. **Multiple events per TCP chunk**: every `data:` line of a chunk is emitted.
//! 2. **Partial JSON across TCP boundaries**: incomplete lines stay buffered until
//!    their newline arrives.
//!
//! Each provider supplies a [`StreamTranslator`] that converts one `data:` payload
//! into zero or more [`StreamEvent`]s. SSE framing, `[DONE]` detection and the
//! terminal `StreamEnd` are handled once here.

use std::collections::VecDeque;
use std::mem;
use std::pin::Pin;

use bytes::Bytes;
use futures_util::stream::unfold;
use futures_util::{Stream, StreamExt};
use tracing::debug;

use super::{EventStream, StreamEvent};
use crate::errors::{AppError, AppResult, ErrorCode};

/// A parsed SSE event from the stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseEvent {
    /// A `data:` payload with the JSON string (prefix stripped)
    Data(String),
    /// The `[DONE]` termination signal (OpenAI convention)
    Done,
}

/// Line-buffering SSE parser that handles partial lines across TCP chunk boundaries
#[derive(Debug, Default)]
pub struct SseLineBuffer {
    /// Accumulated text not yet terminated by a newline
    buffer: String,
    /// Trailing bytes of an incomplete UTF-8 sequence
    utf8_tail: Vec<u8>,
}

impl SseLineBuffer {
    /// Create a new empty line buffer
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes from a TCP chunk into the buffer, returning any complete SSE events
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<SseEvent> {
        self.utf8_tail.extend_from_slice(bytes);
        let valid_up_to = match std::str::from_utf8(&self.utf8_tail) {
            Ok(text) => {
                self.buffer.push_str(text);
                self.utf8_tail.len()
            }
            Err(e) if e.error_len().is_none() => {
                // Multi-byte character split across chunks
                let valid_up_to = e.valid_up_to();
                self.buffer
                    .push_str(&String::from_utf8_lossy(&self.utf8_tail[..valid_up_to]));
                valid_up_to
            }
            Err(_) => {
                self.buffer
                    .push_str(&String::from_utf8_lossy(&self.utf8_tail));
                self.utf8_tail.len()
            }
        };
        self.utf8_tail.drain(..valid_up_to);

        let mut events = Vec::new();
        while let Some(newline_pos) = self.buffer.find('\n') {
            let line: String = self.buffer.drain(..=newline_pos).collect();
            if let Some(event) = Self::parse_line(&line) {
                events.push(event);
            }
        }
        events
    }

    /// Flush any remaining buffered content as a final event
    pub fn flush(&mut self) -> Vec<SseEvent> {
        let mut remaining = mem::take(&mut self.buffer);
        let tail = mem::take(&mut self.utf8_tail);
        remaining.push_str(&String::from_utf8_lossy(&tail));
        Self::parse_line(&remaining).into_iter().collect()
    }

    fn parse_line(line: &str) -> Option<SseEvent> {
        let trimmed = line.trim();
        // Empty lines separate events; non-data fields (event:, id:, comments) are ignored
        let data = trimmed
            .strip_prefix("data:")
            .map(str::trim_start)
            .filter(|data| !data.trim().is_empty())?;
        if data == "[DONE]" {
            return Some(SseEvent::Done);
        }
        Some(SseEvent::Data(data.to_owned()))
    }
}

// ============================================================================
// Event Translation
// ============================================================================

/// Converts provider-specific SSE payloads into stream events
///
/// Translators hold per-stream state (e.g. tool call ids keyed by index), so a
/// fresh translator is created for every stream.
pub trait StreamTranslator: Send + 'static {
    /// Translate one `data:` payload
    ///
    /// # Errors
    ///
    /// Returns `INVALID_RESPONSE` if the payload cannot be decoded; the stream
    /// then ends with a `StreamError`.
    fn translate(&mut self, data: &str) -> AppResult<Vec<StreamEvent>>;

    /// Events to emit when the provider signals the end of the stream
    ///
    /// Must end with [`StreamEvent::StreamEnd`].
    fn finish(&mut self) -> Vec<StreamEvent>;
}

type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, reqwest::Error>> + Send>>;

/// Internal state for the SSE stream unfold
struct SseStreamState<T> {
    byte_stream: ByteStream,
    parser: SseLineBuffer,
    translator: T,
    pending: VecDeque<StreamEvent>,
    finished: bool,
    provider_name: &'static str,
}

impl<T: StreamTranslator> SseStreamState<T> {
    fn absorb(&mut self, events: Vec<SseEvent>) {
        for event in events {
            if self.finished {
                break;
            }
            match event {
                SseEvent::Data(json_str) => match self.translator.translate(&json_str) {
                    Ok(translated) => self.pending.extend(translated),
                    Err(e) => {
                        self.pending.push_back(StreamEvent::from(e));
                        self.finished = true;
                    }
                },
                SseEvent::Done => self.finish(),
            }
        }
    }

    fn finish(&mut self) {
        if !self.finished {
            self.pending.extend(self.translator.finish());
            self.finished = true;
        }
    }
}

/// Create a properly-buffered event stream from a raw byte stream
///
/// The returned stream ends after `StreamEnd` or `StreamError`. Dropping it
/// drops the underlying response body and releases the connection.
pub fn create_event_stream<S, T>(
    byte_stream: S,
    translator: T,
    provider_name: &'static str,
) -> EventStream
where
    S: Stream<Item = Result<Bytes, reqwest::Error>> + Send + 'static,
    T: StreamTranslator,
{
    let state = SseStreamState {
        byte_stream: Box::pin(byte_stream),
        parser: SseLineBuffer::new(),
        translator,
        pending: VecDeque::new(),
        finished: false,
        provider_name,
    };

    let stream = unfold(state, |mut state| async move {
        loop {
            if let Some(event) = state.pending.pop_front() {
                return Some((event, state));
            }
            if state.finished {
                return None;
            }

            match state.byte_stream.next().await {
                Some(Ok(bytes)) => {
                    let events = state.parser.feed(&bytes);
                    state.absorb(events);
                }
                Some(Err(e)) => {
                    state.finished = true;
                    let error = classify_request_error(state.provider_name, &e);
                    state.pending.push_back(StreamEvent::from(error));
                }
                None => {
                    debug!(provider = state.provider_name, "Response body ended");
                    let events = state.parser.flush();
                    state.absorb(events);
                    state.finish();
                }
            }
        }
    });

    Box::pin(stream)
}

// ============================================================================
// Error Classification
// ============================================================================

/// Classify a non-success HTTP status into a provider error
///
/// `message` is the provider's own error text, already extracted from the body.
#[must_use]
pub fn classify_status(provider_name: &str, status: u16, message: &str) -> AppError {
    match status {
        429 => AppError::rate_limited(friendly_rate_limit_message(message)),
        401 | 403 => AppError::new(
            ErrorCode::ProviderAuthFailed,
            format!("{provider_name} rejected the credentials ({status}): {message}"),
        ),
        408 | 504 => AppError::provider_timeout(provider_name, format!("HTTP {status}: {message}")),
        500 | 502 | 503 => {
            AppError::network_failure(provider_name, format!("HTTP {status}: {message}"))
        }
        _ => AppError::invalid_response(provider_name, format!("HTTP {status}: {message}")),
    }
}

/// Classify a transport-level request error
#[must_use]
pub fn classify_request_error(provider_name: &str, error: &reqwest::Error) -> AppError {
    if error.is_timeout() {
        AppError::provider_timeout(provider_name, error)
    } else if error.is_decode() {
        AppError::invalid_response(provider_name, error)
    } else {
        AppError::network_failure(provider_name, error)
    }
}

/// Check if an HTTP error status code is worth one immediate retry
#[must_use]
pub const fn is_retryable_status(status: u16) -> bool {
    matches!(status, 408 | 500 | 502 | 503 | 504)
}

/// Turn a provider rate-limit message into a user-facing one
///
/// Recognizes "Please retry in 6.4s" (Gemini) and "try again in 20s" (OpenAI style).
#[must_use]
pub fn friendly_rate_limit_message(message: &str) -> String {
    let lower = message.to_lowercase();
    let after = ["please retry in ", "try again in "]
        .iter()
        .find_map(|marker| lower.find(marker).map(|pos| &lower[pos + marker.len()..]));

    if let Some(after) = after {
        let end = after
            .find(|c: char| !c.is_ascii_digit() && c != '.')
            .unwrap_or(after.len());
        if let Ok(seconds) = after[..end].parse::<f64>() {
            let seconds_int = seconds.ceil() as u64;
            return format!("AI service quota exceeded. Please try again in {seconds_int} seconds.");
        }
    }
    "AI service quota exceeded. Please wait a moment and try again.".to_owned()
}
