// ABOUTME: Unified provider selector for runtime provider switching
// ABOUTME: Builds Gemini or an OpenAI-compatible provider from ChefConfig and delegates to it
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FridgeChef Contributors

//! # Provider Selector
//!
//! Set `FRIDGE_CHEF_LLM_PROVIDER`:
//! - `gemini` (default): Google Gemini, requires `GEMINI_API_KEY`
//! - `local`: any `OpenAI`-compatible endpoint (`LOCAL_LLM_BASE_URL`)
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use fridge_chef::config::ChefConfig;
//! use fridge_chef::llm::{ChatProvider, ModelClient};
//!
//! fn main() -> Result<(), fridge_chef::errors::AppError> {
//!     let config = ChefConfig::from_env()?;
//!     let provider = ChatProvider::from_config(&config)?;
//!     let client = ModelClient::with_config(Arc::new(provider), (&config).into());
//!     Ok(())
//! }
//! ```

use std::fmt;

use async_trait::async_trait;
use tracing::{debug, info};

use super::{
    EventStream, GeminiProvider, LlmCapabilities, ModelProvider, ModelRequest, ModelResponse,
    OpenAiCompatibleConfig, OpenAiCompatibleProvider,
};
use crate::config::{ChefConfig, LlmProviderType};
use crate::constants::env_vars;
use crate::errors::{AppError, AppResult};

/// Unified provider wrapping Gemini or a local `OpenAI`-compatible server
pub enum ChatProvider {
    /// Google Gemini provider with vision and tool calling
    Gemini(GeminiProvider),
    /// Local provider via `OpenAI`-compatible API (Ollama, vLLM, `LocalAI`)
    Local(OpenAiCompatibleProvider),
}

impl ChatProvider {
    /// Create the configured provider
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the selected provider's API key is
    /// missing or its HTTP client cannot be built
    pub fn from_config(config: &ChefConfig) -> AppResult<Self> {
        info!(
            "Initializing model provider: {} (set {} to change)",
            config.provider,
            LlmProviderType::ENV_VAR
        );

        let provider = match config.provider {
            LlmProviderType::Gemini => {
                let api_key = config.gemini_api_key.clone().ok_or_else(|| {
                    AppError::config(format!(
                        "{} environment variable not set",
                        env_vars::GEMINI_API_KEY
                    ))
                })?;
                let mut gemini = GeminiProvider::new(api_key)?;
                if let Some(model) = &config.model {
                    gemini = gemini.with_default_model(model);
                }
                Self::Gemini(gemini)
            }
            LlmProviderType::Local => {
                let model = config.model.as_ref().unwrap_or(&config.local.model);
                let local_config =
                    OpenAiCompatibleConfig::for_endpoint(&config.local.base_url, model)
                        .with_api_key(config.local.api_key.clone());
                Self::Local(OpenAiCompatibleProvider::new(local_config)?)
            }
        };

        debug!(
            "Provider {} initialized with model: {}",
            provider.display_name(),
            provider.default_model()
        );
        Ok(provider)
    }

    /// Load configuration from the environment and create the provider
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the environment is invalid
    pub fn from_env() -> AppResult<Self> {
        Self::from_config(&ChefConfig::from_env()?)
    }

    /// Which provider type is active
    #[must_use]
    pub const fn provider_type(&self) -> LlmProviderType {
        match self {
            Self::Gemini(_) => LlmProviderType::Gemini,
            Self::Local(_) => LlmProviderType::Local,
        }
    }

    fn inner(&self) -> &dyn ModelProvider {
        match self {
            Self::Gemini(provider) => provider,
            Self::Local(provider) => provider,
        }
    }
}

#[async_trait]
impl ModelProvider for ChatProvider {
    fn name(&self) -> &'static str {
        self.inner().name()
    }

    fn display_name(&self) -> &'static str {
        self.inner().display_name()
    }

    fn capabilities(&self) -> LlmCapabilities {
        self.inner().capabilities()
    }

    fn default_model(&self) -> &str {
        self.inner().default_model()
    }

    async fn complete(&self, request: &ModelRequest) -> AppResult<ModelResponse> {
        self.inner().complete(request).await
    }

    async fn complete_stream(&self, request: &ModelRequest) -> AppResult<EventStream> {
        self.inner().complete_stream(request).await
    }
}

impl fmt::Debug for ChatProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gemini(provider) => f.debug_tuple("Gemini").field(provider).finish(),
            Self::Local(provider) => f.debug_tuple("Local").field(provider).finish(),
        }
    }
}
