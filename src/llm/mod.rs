// ABOUTME: Generative model abstraction layer for pluggable provider integration
// ABOUTME: Defines requests, the provider-neutral stream event union and the provider trait
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FridgeChef Contributors

//! # Model Provider Service Provider Interface
//!
//! This module defines the contract that generative model providers implement
//! and the vendor-neutral types flowing between providers, the invocation
//! client and the streaming reducer.
//!
//! ## Key Concepts
//!
//! - **`LlmCapabilities`**: Bitflags describing provider features (streaming, function calling, vision)
//! - **`ModelProvider`**: Async trait for blocking and streaming completion
//! - **`ModelRequest`**: Prompt text plus optional image, tool declarations and response schema
//! - **`StreamEvent`**: Tagged union every provider stream is translated into
//! - **`ModelClient`**: Timeout, retry and validation policy on top of a provider
//! - **`ToolCallReducer`**: Assembles validated objects out of streamed tool calls
//!
//! ## Example: Streaming recipes
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use fridge_chef::llm::{ChatProvider, ModelClient, ModelRequest};
//! use tokio_stream::StreamExt;
//!
//! async fn example() -> Result<(), fridge_chef::errors::AppError> {
//!     let provider = Arc::new(ChatProvider::from_env()?);
//!     let client = ModelClient::new(provider);
//!     let mut events = client.invoke_stream(&ModelRequest::new("hello")).await?;
//!     while let Some(event) = events.next().await {
//!         println!("{event:?}");
//!     }
//!     Ok(())
//! }
//! ```

mod client;
mod gemini;
mod openai_compatible;
mod provider;
mod reducer;
#[cfg(any(test, feature = "testing"))]
mod scripted;
pub mod sse_parser;

pub use client::{ClientConfig, ModelClient};
pub use gemini::{GeminiProvider, GeminiStreamTranslator};
pub use openai_compatible::{
    OpenAiCompatibleConfig, OpenAiCompatibleProvider, OpenAiStreamTranslator,
};
pub use provider::ChatProvider;
pub use reducer::{ReduceSummary, ReducerState, Step, ToolCallReducer};
#[cfg(any(test, feature = "testing"))]
pub use scripted::{ReleaseProbe, ScriptedProvider};

use std::pin::Pin;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_stream::Stream;

use crate::errors::{AppError, AppResult, ErrorCode};
use crate::models::ImageData;

// ============================================================================
// Capability Flags
// ============================================================================

bitflags::bitflags! {
    /// Provider capability flags
    ///
    /// The invocation client checks these before sending a request so that an
    /// image or tool request never reaches a provider that cannot serve it.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct LlmCapabilities: u8 {
        /// Provider supports streaming responses
        const STREAMING = 0b0000_0001;
        /// Provider supports function/tool calling
        const FUNCTION_CALLING = 0b0000_0010;
        /// Provider supports vision/image input
        const VISION = 0b0000_0100;
        /// Provider supports JSON mode output
        const JSON_MODE = 0b0000_1000;
        /// Provider supports system messages
        const SYSTEM_MESSAGES = 0b0001_0000;
    }
}

impl LlmCapabilities {
    /// Capabilities of a basic text-only provider
    #[must_use]
    pub const fn text_only() -> Self {
        Self::STREAMING.union(Self::SYSTEM_MESSAGES)
    }

    /// Capabilities of a full-featured provider (like Gemini Flash)
    #[must_use]
    pub const fn full_featured() -> Self {
        Self::STREAMING
            .union(Self::FUNCTION_CALLING)
            .union(Self::VISION)
            .union(Self::JSON_MODE)
            .union(Self::SYSTEM_MESSAGES)
    }

    /// Check if streaming is supported
    #[must_use]
    pub const fn supports_streaming(&self) -> bool {
        self.contains(Self::STREAMING)
    }

    /// Check if function calling is supported
    #[must_use]
    pub const fn supports_function_calling(&self) -> bool {
        self.contains(Self::FUNCTION_CALLING)
    }

    /// Check if vision is supported
    #[must_use]
    pub const fn supports_vision(&self) -> bool {
        self.contains(Self::VISION)
    }

    /// Check if JSON mode is supported
    #[must_use]
    pub const fn supports_json_mode(&self) -> bool {
        self.contains(Self::JSON_MODE)
    }
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// A tool the model may call to emit structured arguments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDeclaration {
    /// Name the model uses when calling the tool
    pub name: String,
    /// What the tool is for
    pub description: String,
    /// JSON Schema of the arguments object
    pub parameters: serde_json::Value,
}

impl ToolDeclaration {
    /// Create a tool declaration
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// A single model invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelRequest {
    /// Rendered prompt text
    pub prompt: String,
    /// Optional image sent alongside the prompt
    pub image: Option<ImageData>,
    /// Tools the model may call
    pub tools: Vec<ToolDeclaration>,
    /// JSON Schema the response text must follow (JSON mode)
    pub response_schema: Option<serde_json::Value>,
    /// Model identifier (provider-specific)
    pub model: Option<String>,
    /// Temperature for response randomness (0.0 - 2.0)
    pub temperature: Option<f32>,
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
}

impl ModelRequest {
    /// Create a text-only request
    #[must_use]
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            image: None,
            tools: Vec::new(),
            response_schema: None,
            model: None,
            temperature: None,
            max_tokens: None,
        }
    }

    /// Attach an image
    #[must_use]
    pub fn with_image(mut self, image: ImageData) -> Self {
        self.image = Some(image);
        self
    }

    /// Declare a tool
    #[must_use]
    pub fn with_tool(mut self, tool: ToolDeclaration) -> Self {
        self.tools.push(tool);
        self
    }

    /// Ask for JSON output following the given schema
    #[must_use]
    pub fn with_response_schema(mut self, schema: serde_json::Value) -> Self {
        self.response_schema = Some(schema);
        self
    }

    /// Set the model to use
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the temperature
    #[must_use]
    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the maximum tokens
    #[must_use]
    pub const fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Whether the request carries an image
    #[must_use]
    pub const fn has_image(&self) -> bool {
        self.image.is_some()
    }

    /// Whether the request declares tools
    #[must_use]
    pub fn has_tools(&self) -> bool {
        !self.tools.is_empty()
    }
}

/// Response from a blocking completion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelResponse {
    /// Generated text
    pub text: String,
    /// Model used for generation
    pub model: String,
    /// Token usage statistics
    pub usage: Option<TokenUsage>,
    /// Finish reason (stop, length, etc.)
    pub finish_reason: Option<String>,
}

/// Token usage statistics
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Number of tokens in the prompt
    pub prompt_tokens: u32,
    /// Number of tokens in the completion
    pub completion_tokens: u32,
    /// Total tokens used
    pub total_tokens: u32,
}

// ============================================================================
// Stream Events
// ============================================================================

/// Provider-neutral streaming event
///
/// Every provider translates its wire format into this union. Events of one
/// stream arrive strictly in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Prose output
    TextDelta {
        /// Text fragment
        text: String,
    },
    /// The model started calling a tool
    ToolCallStart {
        /// Invocation id, unique within the stream
        id: String,
        /// Tool name
        name: String,
    },
    /// A fragment of the tool call's JSON arguments
    ToolCallArgsDelta {
        /// Invocation id
        id: String,
        /// Argument text to append
        fragment: String,
    },
    /// All argument fragments for the invocation have arrived
    ToolCallComplete {
        /// Invocation id
        id: String,
    },
    /// Normal end of the stream
    StreamEnd,
    /// Terminal failure of the stream
    StreamError {
        /// Machine-checkable failure kind
        kind: ErrorCode,
        /// Human-readable message
        message: String,
    },
}

impl StreamEvent {
    /// Text delta event
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::TextDelta { text: text.into() }
    }

    /// Tool call start event
    #[must_use]
    pub fn tool_start(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::ToolCallStart {
            id: id.into(),
            name: name.into(),
        }
    }

    /// Tool call argument fragment event
    #[must_use]
    pub fn tool_args(id: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self::ToolCallArgsDelta {
            id: id.into(),
            fragment: fragment.into(),
        }
    }

    /// Tool call completion event
    #[must_use]
    pub fn tool_complete(id: impl Into<String>) -> Self {
        Self::ToolCallComplete { id: id.into() }
    }

    /// Stream failure event
    #[must_use]
    pub fn error(kind: ErrorCode, message: impl Into<String>) -> Self {
        Self::StreamError {
            kind,
            message: message.into(),
        }
    }

    /// Whether this event ends the stream
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::StreamEnd | Self::StreamError { .. })
    }
}

impl From<AppError> for StreamEvent {
    fn from(error: AppError) -> Self {
        Self::StreamError {
            kind: error.code,
            message: error.message,
        }
    }
}

/// Stream type for streaming completions
pub type EventStream = Pin<Box<dyn Stream<Item = StreamEvent> + Send>>;

// ============================================================================
// Provider Trait
// ============================================================================

/// Generative model provider
///
/// Implement this trait to plug a new model backend into the flows. Providers
/// only translate wire formats and classify transport errors; timeouts,
/// retries and validation belong to [`ModelClient`].
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Unique provider identifier (e.g., "gemini", "ollama")
    fn name(&self) -> &'static str;

    /// Human-readable display name for the provider
    fn display_name(&self) -> &'static str;

    /// Provider capabilities (streaming, function calling, etc.)
    fn capabilities(&self) -> LlmCapabilities;

    /// Default model to use if not specified in request
    fn default_model(&self) -> &str;

    /// Perform a blocking completion
    async fn complete(&self, request: &ModelRequest) -> AppResult<ModelResponse>;

    /// Open a streaming completion
    ///
    /// Errors returned here happen before any event was produced. Failures
    /// after that point arrive in-band as [`StreamEvent::StreamError`].
    async fn complete_stream(&self, request: &ModelRequest) -> AppResult<EventStream>;
}
