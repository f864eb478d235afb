// ABOUTME: Google Gemini provider implementation with streaming tool-call support
// ABOUTME: Speaks the Generative Language REST API and translates SSE chunks into stream events
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FridgeChef Contributors

//! # Gemini Provider
//!
//! Implementation of the `ModelProvider` trait for Google's Gemini models.
//!
//! ## Configuration
//!
//! Set the `GEMINI_API_KEY` environment variable with your API key from
//! Google AI Studio: <https://aistudio.google.com/app/apikey>
//!
//! ## Streaming function calls
//!
//! Gemini delivers each `functionCall` part whole, inside a single SSE chunk.
//! [`GeminiStreamTranslator`] expands every call into a
//! `ToolCallStart` / `ToolCallArgsDelta` / `ToolCallComplete` triple so the
//! reducer sees the same event shape regardless of vendor.

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, instrument};
use uuid::Uuid;

use super::sse_parser::{classify_request_error, classify_status, create_event_stream, StreamTranslator};
use super::{
    EventStream, LlmCapabilities, ModelProvider, ModelRequest, ModelResponse, StreamEvent,
    TokenUsage, ToolDeclaration,
};
use crate::constants::llm::{CONNECT_TIMEOUT_SECS, GEMINI_API_BASE_URL, GEMINI_DEFAULT_MODEL};
use crate::errors::{AppError, AppResult};

/// Provider identifier used in errors and logs
const PROVIDER_NAME: &str = "gemini";

// ============================================================================
// API Request/Response Types
// ============================================================================

/// Gemini API request structure
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<GeminiTool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_config: Option<ToolConfig>,
}

/// Content structure for Gemini API
#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<ContentPart>,
}

/// Part of content
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum ContentPart {
    /// Text content
    Text { text: String },
    /// Inline base64 media
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
    /// Function call from the model
    FunctionCall {
        #[serde(rename = "functionCall")]
        function_call: FunctionCall,
    },
    /// Part kinds this client does not use (code execution, thoughts, ...)
    Other(Value),
}

/// Inline media payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

/// Function call made by the model
#[derive(Debug, Clone, Serialize, Deserialize)]
struct FunctionCall {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    name: String,
    #[serde(default)]
    args: Value,
}

/// Function declaration for tool definitions
#[derive(Debug, Clone, Serialize)]
struct FunctionDeclaration {
    name: String,
    description: String,
    parameters: Value,
}

/// Tool definition for Gemini API
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiTool {
    function_declarations: Vec<FunctionDeclaration>,
}

/// Forces the model to answer through the declared functions
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ToolConfig {
    function_calling_config: FunctionCallingConfig,
}

#[derive(Debug, Serialize)]
struct FunctionCallingConfig {
    mode: &'static str,
}

/// Generation configuration
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<Value>,
}

/// Gemini API response structure (also used for streamed chunks)
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    candidates: Option<Vec<Candidate>>,
    usage_metadata: Option<UsageMetadata>,
    error: Option<GeminiError>,
}

/// Response candidate
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

/// Usage metadata from Gemini API response
#[derive(Debug, Deserialize)]
struct UsageMetadata {
    #[serde(rename = "promptTokenCount")]
    prompt: Option<u32>,
    #[serde(rename = "candidatesTokenCount")]
    candidates: Option<u32>,
    #[serde(rename = "totalTokenCount")]
    total: Option<u32>,
}

/// API error response from Gemini
#[derive(Debug, Deserialize)]
struct GeminiError {
    code: Option<u16>,
    message: String,
}

/// Error envelope returned with non-success statuses
#[derive(Debug, Deserialize)]
struct GeminiErrorEnvelope {
    error: GeminiError,
}

// ============================================================================
// Stream Translation
// ============================================================================

/// Translates Gemini `streamGenerateContent?alt=sse` chunks into stream events
#[derive(Debug, Default)]
pub struct GeminiStreamTranslator;

impl StreamTranslator for GeminiStreamTranslator {
    fn translate(&mut self, data: &str) -> AppResult<Vec<StreamEvent>> {
        let chunk: GeminiResponse = serde_json::from_str(data).map_err(|e| {
            AppError::invalid_response(PROVIDER_NAME, format!("Failed to parse streaming chunk: {e}"))
        })?;

        if let Some(error) = chunk.error {
            return Err(classify_status(
                PROVIDER_NAME,
                error.code.unwrap_or(500),
                &error.message,
            ));
        }

        let parts = chunk
            .candidates
            .into_iter()
            .flatten()
            .take(1)
            .filter_map(|candidate| candidate.content)
            .flat_map(|content| content.parts);

        let mut events = Vec::new();
        for part in parts {
            match part {
                ContentPart::Text { text } if !text.is_empty() => {
                    events.push(StreamEvent::text(text));
                }
                ContentPart::FunctionCall { function_call } => {
                    let id = function_call
                        .id
                        .filter(|id| !id.is_empty())
                        .unwrap_or_else(|| Uuid::new_v4().to_string());
                    debug!(tool_call_id = %id, name = %function_call.name, "Function call received");
                    events.push(StreamEvent::tool_start(&id, function_call.name));
                    events.push(StreamEvent::tool_args(&id, function_call.args.to_string()));
                    events.push(StreamEvent::tool_complete(id));
                }
                ContentPart::Text { .. } | ContentPart::InlineData { .. } | ContentPart::Other(_) => {}
            }
        }
        Ok(events)
    }

    fn finish(&mut self) -> Vec<StreamEvent> {
        vec![StreamEvent::StreamEnd]
    }
}

// ============================================================================
// Provider Implementation
// ============================================================================

/// Google Gemini provider
pub struct GeminiProvider {
    api_key: String,
    client: Client,
    default_model: String,
}

impl GeminiProvider {
    /// Create a new Gemini provider with an API key
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the key is blank or the HTTP client cannot be built
    pub fn new(api_key: impl Into<String>) -> AppResult<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(AppError::config("Gemini API key is empty"));
        }
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::config(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self {
            api_key,
            client,
            default_model: GEMINI_DEFAULT_MODEL.to_owned(),
        })
    }

    /// Set a custom default model
    #[must_use]
    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    /// JSON body sent to `generateContent` for a request
    ///
    /// # Errors
    ///
    /// Returns a serialization error if the body cannot be encoded
    pub fn request_body(request: &ModelRequest) -> AppResult<Value> {
        Ok(serde_json::to_value(Self::build_gemini_request(request))?)
    }

    /// Build the API URL for a model and method
    fn build_url(model: &str, method: &str) -> String {
        format!("{GEMINI_API_BASE_URL}/models/{model}:{method}")
    }

    /// Build a Gemini API request from a `ModelRequest`
    fn build_gemini_request(request: &ModelRequest) -> GeminiRequest {
        let mut parts = vec![ContentPart::Text {
            text: request.prompt.clone(),
        }];
        if let Some(image) = &request.image {
            parts.push(ContentPart::InlineData {
                inline_data: InlineData {
                    mime_type: image.mime_type.clone(),
                    data: image.base64_payload.clone(),
                },
            });
        }

        let response_schema = request.response_schema.as_ref().map(to_gemini_schema);
        let generation_config = if request.temperature.is_some()
            || request.max_tokens.is_some()
            || response_schema.is_some()
        {
            Some(GenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_tokens,
                response_mime_type: response_schema.as_ref().map(|_| "application/json"),
                response_schema,
            })
        } else {
            None
        };

        let tools = if request.tools.is_empty() {
            Vec::new()
        } else {
            vec![GeminiTool {
                function_declarations: request.tools.iter().map(Self::convert_tool).collect(),
            }]
        };
        let tool_config = (!request.tools.is_empty()).then_some(ToolConfig {
            function_calling_config: FunctionCallingConfig { mode: "ANY" },
        });

        GeminiRequest {
            contents: vec![GeminiContent {
                role: Some("user".to_owned()),
                parts,
            }],
            generation_config,
            tools,
            tool_config,
        }
    }

    fn convert_tool(tool: &ToolDeclaration) -> FunctionDeclaration {
        FunctionDeclaration {
            name: tool.name.clone(),
            description: tool.description.clone(),
            parameters: to_gemini_schema(&tool.parameters),
        }
    }

    /// Concatenate the text parts of the first candidate
    fn extract_content(response: &GeminiResponse) -> AppResult<String> {
        let texts: Vec<&str> = response
            .candidates
            .iter()
            .flatten()
            .take(1)
            .filter_map(|candidate| candidate.content.as_ref())
            .flat_map(|content| content.parts.iter())
            .filter_map(|part| match part {
                ContentPart::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect();

        if texts.is_empty() {
            return Err(AppError::invalid_response(
                PROVIDER_NAME,
                "No text content in Gemini response",
            ));
        }
        Ok(texts.concat())
    }

    /// Convert usage metadata to our token usage format
    fn convert_usage(metadata: &UsageMetadata) -> TokenUsage {
        TokenUsage {
            prompt_tokens: metadata.prompt.unwrap_or(0),
            completion_tokens: metadata.candidates.unwrap_or(0),
            total_tokens: metadata.total.unwrap_or(0),
        }
    }

    /// Map API error status to the provider error taxonomy
    fn map_api_error(status: u16, response_text: &str) -> AppError {
        let message = serde_json::from_str::<GeminiErrorEnvelope>(response_text)
            .map_or_else(|_| response_text.to_owned(), |e| e.error.message);
        classify_status(PROVIDER_NAME, status, &message)
    }

    async fn send(&self, request: &ModelRequest, method: &str, sse: bool) -> AppResult<reqwest::Response> {
        let model = request.model.as_deref().unwrap_or(&self.default_model);
        let mut http_request = self
            .client
            .post(Self::build_url(model, method))
            .header("x-goog-api-key", &self.api_key)
            .json(&Self::build_gemini_request(request));
        if sse {
            http_request = http_request.query(&[("alt", "sse")]);
        }

        let response = http_request
            .send()
            .await
            .map_err(|e| classify_request_error(PROVIDER_NAME, &e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_owned());
        error!(status = %status, "Gemini API error");
        Err(Self::map_api_error(status.as_u16(), &error_text))
    }
}

/// Gemini's schema dialect spells types in upper case and has no `additionalProperties`
fn to_gemini_schema(schema: &Value) -> Value {
    match schema {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(key, _)| key.as_str() != "additionalProperties")
                .map(|(key, value)| {
                    let converted = match (key.as_str(), value) {
                        ("type", Value::String(kind)) => Value::String(kind.to_uppercase()),
                        _ => to_gemini_schema(value),
                    };
                    (key.clone(), converted)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(to_gemini_schema).collect()),
        other => other.clone(),
    }
}

#[async_trait]
impl ModelProvider for GeminiProvider {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    fn display_name(&self) -> &'static str {
        "Google Gemini"
    }

    fn capabilities(&self) -> LlmCapabilities {
        LlmCapabilities::full_featured()
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }

    #[instrument(skip(self, request), fields(provider = PROVIDER_NAME, model = %request.model.as_deref().unwrap_or(&self.default_model)))]
    async fn complete(&self, request: &ModelRequest) -> AppResult<ModelResponse> {
        debug!("Sending request to Gemini API");
        let response = self.send(request, "generateContent", false).await?;

        let response_text = response
            .text()
            .await
            .map_err(|e| classify_request_error(PROVIDER_NAME, &e))?;
        let gemini_response: GeminiResponse =
            serde_json::from_str(&response_text).map_err(|e| {
                error!(error = %e, "Failed to parse Gemini response");
                AppError::invalid_response(PROVIDER_NAME, format!("Failed to parse response: {e}"))
            })?;

        if let Some(error) = gemini_response.error {
            return Err(classify_status(
                PROVIDER_NAME,
                error.code.unwrap_or(500),
                &error.message,
            ));
        }

        let text = Self::extract_content(&gemini_response)?;
        let usage = gemini_response
            .usage_metadata
            .as_ref()
            .map(Self::convert_usage);
        let finish_reason = gemini_response
            .candidates
            .as_ref()
            .and_then(|c| c.first())
            .and_then(|c| c.finish_reason.clone());

        debug!("Successfully received Gemini response");

        Ok(ModelResponse {
            text,
            model: request
                .model
                .clone()
                .unwrap_or_else(|| self.default_model.clone()),
            usage,
            finish_reason,
        })
    }

    #[instrument(skip(self, request), fields(provider = PROVIDER_NAME, model = %request.model.as_deref().unwrap_or(&self.default_model)))]
    async fn complete_stream(&self, request: &ModelRequest) -> AppResult<EventStream> {
        debug!("Starting streaming request to Gemini API");
        let response = self.send(request, "streamGenerateContent", true).await?;
        Ok(create_event_stream(
            response.bytes_stream(),
            GeminiStreamTranslator,
            PROVIDER_NAME,
        ))
    }
}

impl Debug for GeminiProvider {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("GeminiProvider")
            .field("default_model", &self.default_model)
            .field("api_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}
