// ABOUTME: Deterministic scripted provider for tests, demos and offline development
// ABOUTME: Replays queued responses and event scripts and records calls and stream releases
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FridgeChef Contributors

//! # Scripted Provider
//!
//! [`ScriptedProvider`] implements [`ModelProvider`] without touching the
//! network. Blocking calls pop from a response queue; streaming calls take
//! the first script routed to a matching prompt fragment, or else pop from
//! the stream queue. Every call is recorded for later assertion.
//!
//! Streams yield to the scheduler between events so that concurrently driven
//! streams interleave at the event level. A [`ReleaseProbe`] counts how many
//! scripted streams were opened and how many have been dropped.

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use super::{EventStream, LlmCapabilities, ModelProvider, ModelRequest, ModelResponse, StreamEvent};
use crate::errors::{AppError, AppResult};

const PROVIDER_NAME: &str = "scripted";
const DEFAULT_MODEL: &str = "scripted-model";

/// What a streaming call returns
enum StreamScript {
    Events(Vec<StreamEvent>),
    Fail(AppError),
}

/// Counts scripted streams opened and released
#[derive(Debug, Clone, Default)]
pub struct ReleaseProbe {
    opened: Arc<AtomicUsize>,
    released: Arc<AtomicUsize>,
}

impl ReleaseProbe {
    /// Streams handed out so far
    #[must_use]
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    /// Streams dropped so far
    #[must_use]
    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    /// Whether every opened stream has been dropped
    #[must_use]
    pub fn all_released(&self) -> bool {
        self.opened() == self.released()
    }

    fn open(&self) -> StreamGuard {
        self.opened.fetch_add(1, Ordering::SeqCst);
        StreamGuard {
            released: Arc::clone(&self.released),
        }
    }
}

/// Marks its stream as released when dropped
struct StreamGuard {
    released: Arc<AtomicUsize>,
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

/// Queue-based provider replaying scripted output
pub struct ScriptedProvider {
    capabilities: LlmCapabilities,
    responses: Mutex<VecDeque<AppResult<String>>>,
    streams: Mutex<VecDeque<StreamScript>>,
    routed: Mutex<Vec<(String, StreamScript)>>,
    requests: Mutex<Vec<ModelRequest>>,
    response_delay: Option<Duration>,
    event_delay: Option<Duration>,
    calls: AtomicUsize,
    probe: ReleaseProbe,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Default for ScriptedProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedProvider {
    /// Empty, full-featured provider
    #[must_use]
    pub fn new() -> Self {
        Self {
            capabilities: LlmCapabilities::full_featured(),
            responses: Mutex::new(VecDeque::new()),
            streams: Mutex::new(VecDeque::new()),
            routed: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
            response_delay: None,
            event_delay: None,
            calls: AtomicUsize::new(0),
            probe: ReleaseProbe::default(),
        }
    }

    /// Override advertised capabilities
    #[must_use]
    pub const fn with_capabilities(mut self, capabilities: LlmCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Delay every blocking call and stream establishment
    #[must_use]
    pub const fn with_response_delay(mut self, delay: Duration) -> Self {
        self.response_delay = Some(delay);
        self
    }

    /// Delay before every stream event
    #[must_use]
    pub const fn with_event_delay(mut self, delay: Duration) -> Self {
        self.event_delay = Some(delay);
        self
    }

    /// Queue a blocking response text
    pub fn push_response(&self, text: impl Into<String>) {
        lock(&self.responses).push_back(Ok(text.into()));
    }

    /// Queue a blocking failure
    pub fn push_error(&self, error: AppError) {
        lock(&self.responses).push_back(Err(error));
    }

    /// Queue a stream script
    pub fn push_stream(&self, events: Vec<StreamEvent>) {
        lock(&self.streams).push_back(StreamScript::Events(events));
    }

    /// Queue a stream establishment failure
    pub fn push_stream_error(&self, error: AppError) {
        lock(&self.streams).push_back(StreamScript::Fail(error));
    }

    /// Route a stream script to the first request whose prompt contains `fragment`
    pub fn push_stream_for(&self, fragment: impl Into<String>, events: Vec<StreamEvent>) {
        lock(&self.routed).push((fragment.into(), StreamScript::Events(events)));
    }

    /// Total blocking and streaming calls received
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Requests received, in call order
    #[must_use]
    pub fn requests(&self) -> Vec<ModelRequest> {
        lock(&self.requests).clone()
    }

    /// Probe observing stream release
    #[must_use]
    pub fn release_probe(&self) -> ReleaseProbe {
        self.probe.clone()
    }

    async fn record(&self, request: &ModelRequest) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.requests).push(request.clone());
        if let Some(delay) = self.response_delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn next_script(&self, prompt: &str) -> Option<StreamScript> {
        {
            let mut routed = lock(&self.routed);
            if let Some(index) = routed
                .iter()
                .position(|(fragment, _)| prompt.contains(fragment.as_str()))
            {
                return Some(routed.remove(index).1);
            }
        }
        lock(&self.streams).pop_front()
    }
}

#[async_trait]
impl ModelProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    fn display_name(&self) -> &'static str {
        "Scripted"
    }

    fn capabilities(&self) -> LlmCapabilities {
        self.capabilities
    }

    fn default_model(&self) -> &str {
        DEFAULT_MODEL
    }

    async fn complete(&self, request: &ModelRequest) -> AppResult<ModelResponse> {
        self.record(request).await;
        let next = lock(&self.responses).pop_front();
        let text = next.ok_or_else(|| AppError::internal("No scripted response left"))??;
        Ok(ModelResponse {
            text,
            model: request.model.clone().unwrap_or_else(|| DEFAULT_MODEL.to_owned()),
            usage: None,
            finish_reason: Some("stop".to_owned()),
        })
    }

    async fn complete_stream(&self, request: &ModelRequest) -> AppResult<EventStream> {
        self.record(request).await;
        let events = match self.next_script(&request.prompt) {
            Some(StreamScript::Events(events)) => events,
            Some(StreamScript::Fail(error)) => return Err(error),
            None => return Err(AppError::internal("No scripted stream left")),
        };

        let guard = self.probe.open();
        let event_delay = self.event_delay;
        Ok(Box::pin(async_stream::stream! {
            let _guard = guard;
            for event in events {
                match event_delay {
                    Some(delay) => tokio::time::sleep(delay).await,
                    None => tokio::task::yield_now().await,
                }
                yield event;
            }
        }))
    }
}

impl fmt::Debug for ScriptedProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptedProvider")
            .field("capabilities", &self.capabilities)
            .field("calls", &self.call_count())
            .field("queued_responses", &lock(&self.responses).len())
            .field("queued_streams", &lock(&self.streams).len())
            .finish_non_exhaustive()
    }
}
