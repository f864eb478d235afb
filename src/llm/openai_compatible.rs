// ABOUTME: Generic OpenAI-compatible provider for local and cloud chat-completions endpoints
// ABOUTME: Supports Ollama, vLLM, LocalAI and any server speaking the chat completions API
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FridgeChef Contributors

//! # `OpenAI`-Compatible Provider
//!
//! Generic implementation for any `OpenAI`-compatible endpoint.
//!
//! ## Configuration
//!
//! - `LOCAL_LLM_BASE_URL`: Base URL (default: <http://localhost:11434/v1> for Ollama)
//! - `LOCAL_LLM_MODEL`: Model to use (default: `llava:13b`, a vision model)
//! - `LOCAL_LLM_API_KEY`: API key (optional, empty for local servers)
//!
//! ## Streaming tool calls
//!
//! Chat-completions streams identify tool calls by their position (`index`);
//! only the first delta of a call carries its `id`. [`OpenAiStreamTranslator`]
//! remembers the id per index and closes every open call when the choice
//! finishes or `[DONE]` arrives.

use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info, instrument};

use super::sse_parser::{classify_request_error, classify_status, create_event_stream, StreamTranslator};
use super::{
    EventStream, LlmCapabilities, ModelProvider, ModelRequest, ModelResponse, StreamEvent,
    TokenUsage,
};
use crate::constants::llm::{CONNECT_TIMEOUT_SECS, LOCAL_DEFAULT_BASE_URL, LOCAL_DEFAULT_MODEL};
use crate::errors::{AppError, AppResult};

// ============================================================================
// API Request/Response Types (OpenAI-compatible format)
// ============================================================================

/// OpenAI-compatible API request structure
#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<OpenAiTool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

/// Tool definition for OpenAI-compatible API
#[derive(Debug, Clone, Serialize)]
struct OpenAiTool {
    #[serde(rename = "type")]
    tool_type: &'static str,
    function: OpenAiFunction,
}

/// Function definition within a tool
#[derive(Debug, Clone, Serialize)]
struct OpenAiFunction {
    name: String,
    description: String,
    parameters: Value,
}

/// Message structure for OpenAI-compatible API
#[derive(Debug, Clone, Serialize)]
struct OpenAiMessage {
    role: &'static str,
    content: MessageContent,
}

/// Plain text or multi-part (text plus image) content
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<MessagePart>),
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum MessagePart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, Serialize)]
struct ImageUrl {
    url: String,
}

/// Structured output request
#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
    json_schema: JsonSchemaFormat,
}

#[derive(Debug, Serialize)]
struct JsonSchemaFormat {
    name: &'static str,
    schema: Value,
}

/// OpenAI-compatible API response structure
#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
    #[serde(default)]
    usage: Option<OpenAiUsage>,
    model: String,
}

/// Choice in response
#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
    finish_reason: Option<String>,
}

/// Message in response
#[derive(Debug, Deserialize)]
struct OpenAiResponseMessage {
    content: Option<String>,
}

/// Usage statistics in response
#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    #[serde(rename = "prompt_tokens")]
    prompt: u32,
    #[serde(rename = "completion_tokens")]
    completion: u32,
    #[serde(rename = "total_tokens")]
    total: u32,
}

/// Streaming chunk structure
#[derive(Debug, Deserialize)]
struct OpenAiStreamChunk {
    #[serde(default)]
    choices: Vec<OpenAiStreamChoice>,
    error: Option<OpenAiErrorDetail>,
}

/// Choice in streaming chunk
#[derive(Debug, Deserialize)]
struct OpenAiStreamChoice {
    #[serde(default)]
    delta: OpenAiDelta,
    finish_reason: Option<String>,
}

/// Delta content in streaming chunk
#[derive(Debug, Default, Deserialize)]
struct OpenAiDelta {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<OpenAiToolCallDelta>,
}

/// Incremental tool call in streaming chunk
#[derive(Debug, Deserialize)]
struct OpenAiToolCallDelta {
    #[serde(default)]
    index: u32,
    id: Option<String>,
    function: Option<OpenAiFunctionDelta>,
}

#[derive(Debug, Deserialize)]
struct OpenAiFunctionDelta {
    name: Option<String>,
    arguments: Option<String>,
}

/// Error response structure
#[derive(Debug, Deserialize)]
struct OpenAiErrorResponse {
    error: OpenAiErrorDetail,
}

/// Error detail structure
#[derive(Debug, Deserialize)]
struct OpenAiErrorDetail {
    message: String,
}

// ============================================================================
// Stream Translation
// ============================================================================

/// Translates chat-completions SSE chunks into stream events
#[derive(Debug)]
pub struct OpenAiStreamTranslator {
    provider_name: &'static str,
    /// Open tool calls: stream index to invocation id
    open_calls: BTreeMap<u32, String>,
}

impl OpenAiStreamTranslator {
    /// Create a translator reporting errors under `provider_name`
    #[must_use]
    pub const fn new(provider_name: &'static str) -> Self {
        Self {
            provider_name,
            open_calls: BTreeMap::new(),
        }
    }

    fn close_all(&mut self, events: &mut Vec<StreamEvent>) {
        for (_, id) in std::mem::take(&mut self.open_calls) {
            events.push(StreamEvent::tool_complete(id));
        }
    }

    fn apply_tool_delta(&mut self, delta: OpenAiToolCallDelta, events: &mut Vec<StreamEvent>) {
        let index = delta.index;
        let (name, arguments) = delta
            .function
            .map_or((None, None), |f| (f.name, f.arguments));
        let new_id = delta.id.filter(|id| !id.is_empty());

        let open = self.open_calls.get(&index).cloned();
        let id = match (open, new_id) {
            (Some(open), Some(new_id)) if open != new_id => {
                // A new call reusing the index means the previous one is finished
                events.push(StreamEvent::tool_complete(open));
                events.push(StreamEvent::tool_start(&new_id, name.unwrap_or_default()));
                self.open_calls.insert(index, new_id.clone());
                new_id
            }
            (Some(open), _) => open,
            (None, new_id) => {
                let id = new_id.unwrap_or_else(|| format!("call_{index}"));
                events.push(StreamEvent::tool_start(&id, name.unwrap_or_default()));
                self.open_calls.insert(index, id.clone());
                id
            }
        };

        if let Some(fragment) = arguments.filter(|a| !a.is_empty()) {
            events.push(StreamEvent::tool_args(id, fragment));
        }
    }
}

impl StreamTranslator for OpenAiStreamTranslator {
    fn translate(&mut self, data: &str) -> AppResult<Vec<StreamEvent>> {
        let chunk: OpenAiStreamChunk = serde_json::from_str(data).map_err(|e| {
            AppError::invalid_response(self.provider_name, format!("Failed to parse streaming chunk: {e}"))
        })?;
        if let Some(error) = chunk.error {
            return Err(AppError::invalid_response(self.provider_name, error.message));
        }

        let mut events = Vec::new();
        if let Some(choice) = chunk.choices.into_iter().next() {
            if let Some(text) = choice.delta.content.filter(|t| !t.is_empty()) {
                events.push(StreamEvent::text(text));
            }
            for tool_delta in choice.delta.tool_calls {
                self.apply_tool_delta(tool_delta, &mut events);
            }
            if choice.finish_reason.is_some() {
                self.close_all(&mut events);
            }
        }
        Ok(events)
    }

    fn finish(&mut self) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        self.close_all(&mut events);
        events.push(StreamEvent::StreamEnd);
        events
    }
}

// ============================================================================
// Provider Configuration
// ============================================================================

/// Configuration for the `OpenAI`-compatible provider
#[derive(Clone)]
pub struct OpenAiCompatibleConfig {
    /// Base URL for the API (e.g., <http://localhost:11434/v1>)
    pub base_url: String,
    /// API key (optional for local servers)
    pub api_key: Option<String>,
    /// Default model to use
    pub default_model: String,
    /// Provider name for errors and logging
    pub provider_name: &'static str,
    /// Provider display name
    pub display_name: &'static str,
    /// Capabilities of this provider
    pub capabilities: LlmCapabilities,
}

impl OpenAiCompatibleConfig {
    /// Configuration for an endpoint, naming it after well-known local server ports
    #[must_use]
    pub fn for_endpoint(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        let base_url = base_url.into();
        let (provider_name, display_name) = if base_url.contains(":11434") {
            ("ollama", "Ollama (Local)")
        } else if base_url.contains(":8000") {
            ("vllm", "vLLM (Local)")
        } else if base_url.contains(":8080") {
            ("localai", "LocalAI")
        } else {
            ("local", "Local LLM")
        };
        Self {
            base_url,
            api_key: None,
            default_model: model.into(),
            provider_name,
            display_name,
            capabilities: LlmCapabilities::full_featured(),
        }
    }

    /// Set the API key
    #[must_use]
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|k| !k.is_empty());
        self
    }

    /// Override the advertised capabilities
    #[must_use]
    pub const fn with_capabilities(mut self, capabilities: LlmCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }
}

impl Default for OpenAiCompatibleConfig {
    fn default() -> Self {
        Self::for_endpoint(LOCAL_DEFAULT_BASE_URL, LOCAL_DEFAULT_MODEL)
    }
}

impl Debug for OpenAiCompatibleConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("OpenAiCompatibleConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("default_model", &self.default_model)
            .field("provider_name", &self.provider_name)
            .field("capabilities", &self.capabilities)
            .finish()
    }
}

// ============================================================================
// Provider Implementation
// ============================================================================

/// Generic `OpenAI`-compatible provider
pub struct OpenAiCompatibleProvider {
    client: Client,
    config: OpenAiCompatibleConfig,
}

impl OpenAiCompatibleProvider {
    /// Create a new provider with the given configuration
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the HTTP client cannot be created
    pub fn new(config: OpenAiCompatibleConfig) -> AppResult<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::config(format!("Failed to create HTTP client: {e}")))?;

        info!(
            "Initializing {} provider: base_url={}, model={}",
            config.display_name, config.base_url, config.default_model
        );

        Ok(Self { client, config })
    }

    /// JSON body sent to `/chat/completions` for a request
    ///
    /// # Errors
    ///
    /// Returns a serialization error if the body cannot be encoded
    pub fn request_body(&self, request: &ModelRequest, stream: bool) -> AppResult<Value> {
        Ok(serde_json::to_value(self.build_request(request, stream))?)
    }

    /// Build the API URL for a given endpoint
    fn api_url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), endpoint)
    }

    fn build_request(&self, request: &ModelRequest, stream: bool) -> OpenAiRequest {
        let content = request.image.as_ref().map_or_else(
            || MessageContent::Text(request.prompt.clone()),
            |image| {
                MessageContent::Parts(vec![
                    MessagePart::Text {
                        text: request.prompt.clone(),
                    },
                    MessagePart::ImageUrl {
                        image_url: ImageUrl {
                            url: image.to_data_uri(),
                        },
                    },
                ])
            },
        );

        let tools: Vec<OpenAiTool> = request
            .tools
            .iter()
            .map(|tool| OpenAiTool {
                tool_type: "function",
                function: OpenAiFunction {
                    name: tool.name.clone(),
                    description: tool.description.clone(),
                    parameters: tool.parameters.clone(),
                },
            })
            .collect();
        let tool_choice = (!tools.is_empty()).then_some("auto");

        let response_format = request
            .response_schema
            .clone()
            .filter(|_| self.config.capabilities.supports_json_mode())
            .map(|schema| ResponseFormat {
                format_type: "json_schema",
                json_schema: JsonSchemaFormat {
                    name: "response",
                    schema,
                },
            });

        OpenAiRequest {
            model: request
                .model
                .clone()
                .unwrap_or_else(|| self.config.default_model.clone()),
            messages: vec![OpenAiMessage {
                role: "user",
                content,
            }],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            stream,
            tools,
            tool_choice,
            response_format,
        }
    }

    /// Parse error response from API
    fn parse_error_response(&self, status: u16, body: &str) -> AppError {
        let message = serde_json::from_str::<OpenAiErrorResponse>(body).map_or_else(
            |_| body.chars().take(200).collect::<String>(),
            |e| e.error.message,
        );
        classify_status(self.config.provider_name, status, &message)
    }

    async fn send(&self, request: &ModelRequest, stream: bool) -> AppResult<reqwest::Response> {
        let mut http_request = self
            .client
            .post(self.api_url("chat/completions"))
            .json(&self.build_request(request, stream));
        if let Some(ref api_key) = self.config.api_key {
            http_request = http_request.bearer_auth(api_key);
        }

        let response = http_request.send().await.map_err(|e| {
            error!("Failed to send request to {}: {}", self.config.provider_name, e);
            classify_request_error(self.config.provider_name, &e)
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        error!(status = %status, provider = self.config.provider_name, "Chat completion failed");
        Err(self.parse_error_response(status.as_u16(), &body))
    }
}

#[async_trait]
impl ModelProvider for OpenAiCompatibleProvider {
    fn name(&self) -> &'static str {
        self.config.provider_name
    }

    fn display_name(&self) -> &'static str {
        self.config.display_name
    }

    fn capabilities(&self) -> LlmCapabilities {
        self.config.capabilities
    }

    fn default_model(&self) -> &str {
        &self.config.default_model
    }

    #[instrument(skip(self, request), fields(provider = self.config.provider_name))]
    async fn complete(&self, request: &ModelRequest) -> AppResult<ModelResponse> {
        let response = self.send(request, false).await?;
        let response: OpenAiResponse = response.json().await.map_err(|e| {
            AppError::invalid_response(self.config.provider_name, format!("Failed to parse response: {e}"))
        })?;

        let usage = response.usage.map(|u| TokenUsage {
            prompt_tokens: u.prompt,
            completion_tokens: u.completion,
            total_tokens: u.total,
        });
        let choice = response.choices.into_iter().next().ok_or_else(|| {
            AppError::invalid_response(self.config.provider_name, "Response contained no choices")
        })?;
        let text = choice.message.content.ok_or_else(|| {
            AppError::invalid_response(self.config.provider_name, "Response contained no text")
        })?;

        debug!(provider = self.config.provider_name, "Received chat completion");
        Ok(ModelResponse {
            text,
            model: response.model,
            usage,
            finish_reason: choice.finish_reason,
        })
    }

    #[instrument(skip(self, request), fields(provider = self.config.provider_name))]
    async fn complete_stream(&self, request: &ModelRequest) -> AppResult<EventStream> {
        let response = self.send(request, true).await?;
        Ok(create_event_stream(
            response.bytes_stream(),
            OpenAiStreamTranslator::new(self.config.provider_name),
            self.config.provider_name,
        ))
    }
}

impl Debug for OpenAiCompatibleProvider {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("OpenAiCompatibleProvider")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
