// ABOUTME: Model invocation client applying timeout, retry and validation policy over a provider
// ABOUTME: Offers blocking shape-validated calls and supervised streaming calls with an idle timeout
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FridgeChef Contributors

//! # Model Invocation Client
//!
//! [`ModelClient`] is constructed explicitly and passed to every flow. It owns
//! the policy that providers do not:
//!
//! - capability checks (image input needs vision, tools need function calling)
//! - a per-call timeout surfacing as `PROVIDER_TIMEOUT`
//! - exactly one immediate retry for `NETWORK_FAILURE` / `PROVIDER_TIMEOUT`
//! - validation of blocking responses against a [`Shape`]
//! - an idle timeout between stream events, and a synthetic `StreamEnd` for
//!   provider streams that stop without one

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::time::timeout;
use tokio_stream::StreamExt;
use tracing::{debug, instrument, warn};

use super::{EventStream, ModelProvider, ModelRequest, ModelResponse, StreamEvent};
use crate::config::ChefConfig;
use crate::constants::llm::{DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_STREAM_IDLE_TIMEOUT_SECS};
use crate::errors::{AppError, AppResult, ErrorCode};
use crate::logging::FlowLogger;
use crate::validation::Shape;

/// Attempts per call when transient retry is enabled
const MAX_ATTEMPTS: u32 = 2;

/// Invocation policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientConfig {
    /// Timeout for a blocking call or for stream establishment
    pub request_timeout: Duration,
    /// Maximum wait between two stream events
    pub stream_idle_timeout: Duration,
    /// Retry `NETWORK_FAILURE` / `PROVIDER_TIMEOUT` once
    pub retry_transient: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            stream_idle_timeout: Duration::from_secs(DEFAULT_STREAM_IDLE_TIMEOUT_SECS),
            retry_transient: true,
        }
    }
}

impl From<&ChefConfig> for ClientConfig {
    fn from(config: &ChefConfig) -> Self {
        Self {
            request_timeout: config.request_timeout,
            stream_idle_timeout: config.stream_idle_timeout,
            retry_transient: config.retry_transient,
        }
    }
}

/// Client wrapping a model provider with invocation policy
///
/// Cloning is cheap; clones share the provider.
#[derive(Clone)]
pub struct ModelClient {
    provider: Arc<dyn ModelProvider>,
    config: ClientConfig,
}

impl ModelClient {
    /// Create a client with the default policy
    #[must_use]
    pub fn new(provider: Arc<dyn ModelProvider>) -> Self {
        Self::with_config(provider, ClientConfig::default())
    }

    /// Create a client with an explicit policy
    #[must_use]
    pub fn with_config(provider: Arc<dyn ModelProvider>, config: ClientConfig) -> Self {
        Self { provider, config }
    }

    /// Active policy
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Provider identifier
    #[must_use]
    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Refuse requests the provider cannot serve, before any network call
    fn check_capabilities(&self, request: &ModelRequest) -> AppResult<()> {
        let capabilities = self.provider.capabilities();
        if request.has_image() && !capabilities.supports_vision() {
            return Err(AppError::config(format!(
                "Provider {} does not accept image input",
                self.provider.display_name()
            )));
        }
        if request.has_tools() && !capabilities.supports_function_calling() {
            return Err(AppError::config(format!(
                "Provider {} does not support tool calling",
                self.provider.display_name()
            )));
        }
        Ok(())
    }

    /// Run `call` under the per-call timeout, retrying once on transient failure
    async fn with_policy<T, F, Fut>(&self, mode: &'static str, mut call: F) -> AppResult<T>
    where
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = AppResult<T>> + Send,
        T: Send,
    {
        let provider = self.provider.name();
        let max_attempts = if self.config.retry_transient {
            MAX_ATTEMPTS
        } else {
            1
        };
        let mut attempt = 1;
        loop {
            let started = Instant::now();
            let result = timeout(self.config.request_timeout, call())
                .await
                .unwrap_or_else(|_| {
                    Err(AppError::provider_timeout(
                        provider,
                        format!("no response within {:?}", self.config.request_timeout),
                    ))
                });
            FlowLogger::log_model_call(
                provider,
                mode,
                attempt,
                started.elapsed(),
                result.as_ref().map(|_| ()),
            );

            match result {
                Err(error) if error.is_retryable() && attempt < max_attempts => {
                    warn!(
                        provider,
                        attempt,
                        error.code = %error.code,
                        "Transient provider failure, retrying immediately"
                    );
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    /// Blocking completion returning the raw response
    ///
    /// # Errors
    ///
    /// Returns a configuration error for unsupported input, or the provider
    /// error after the retry policy has been applied
    #[instrument(skip(self, request), fields(provider = self.provider.name()))]
    pub async fn complete(&self, request: &ModelRequest) -> AppResult<ModelResponse> {
        self.check_capabilities(request)?;
        self.with_policy("blocking", || self.provider.complete(request))
            .await
    }

    /// Blocking completion validated against `S`
    ///
    /// The shape's JSON Schema is attached to the request when the caller
    /// did not set one and the provider supports structured output.
    ///
    /// # Errors
    ///
    /// Returns provider errors as for [`ModelClient::complete`], and
    /// `SCHEMA_VIOLATION` if the response does not match `S`
    pub async fn invoke<S: Shape>(&self, request: &ModelRequest) -> AppResult<S> {
        let attach_schema = request.response_schema.is_none()
            && self.provider.capabilities().supports_json_mode();
        let response = match S::json_schema().filter(|_| attach_schema) {
            Some(schema) => {
                let request = request.clone().with_response_schema(schema);
                self.complete(&request).await?
            }
            None => self.complete(request).await?,
        };
        S::from_model_text(&response.text).inspect_err(|error| {
            debug!(shape = S::NAME, "Model output rejected: {}", error.message);
        })
    }

    /// Open a supervised event stream
    ///
    /// Timeout and retry cover only stream establishment; once events flow
    /// the stream is never restarted. The returned stream always ends with
    /// exactly one terminal event and releases the provider stream when it
    /// is dropped.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for unsupported input, or the provider
    /// error if the stream could not be established
    #[instrument(skip(self, request), fields(provider = self.provider.name()))]
    pub async fn invoke_stream(&self, request: &ModelRequest) -> AppResult<EventStream> {
        self.check_capabilities(request)?;
        let inner = self
            .with_policy("streaming", || self.provider.complete_stream(request))
            .await?;
        Ok(supervise(
            inner,
            self.config.stream_idle_timeout,
            self.provider.name(),
        ))
    }
}

impl fmt::Debug for ModelClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelClient")
            .field("provider", &self.provider.name())
            .field("config", &self.config)
            .finish()
    }
}

/// Enforce the idle timeout and the single terminal event
fn supervise(mut inner: EventStream, idle: Duration, provider: &'static str) -> EventStream {
    Box::pin(async_stream::stream! {
        loop {
            match timeout(idle, inner.next()).await {
                Ok(Some(event)) => {
                    let terminal = event.is_terminal();
                    yield event;
                    if terminal {
                        break;
                    }
                }
                Ok(None) => {
                    debug!(provider, "Provider stream ended without StreamEnd");
                    yield StreamEvent::StreamEnd;
                    break;
                }
                Err(_) => {
                    warn!(provider, idle_timeout = ?idle, "Stream idle timeout");
                    yield StreamEvent::error(
                        ErrorCode::ProviderTimeout,
                        format!("{provider}: no stream event within {idle:?}"),
                    );
                    break;
                }
            }
        }
    })
}
