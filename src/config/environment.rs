// ABOUTME: Environment-based configuration for providers, timeouts and recipe limits
// ABOUTME: Parses FRIDGE_CHEF_* variables into a validated ChefConfig
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FridgeChef Contributors

//! Environment configuration
//!
//! | Variable | Default |
//! |---|---|
//! | `FRIDGE_CHEF_LLM_PROVIDER` | `gemini` |
//! | `FRIDGE_CHEF_LLM_MODEL` | provider default |
//! | `GEMINI_API_KEY` | required for `gemini` |
//! | `LOCAL_LLM_BASE_URL` / `LOCAL_LLM_MODEL` / `LOCAL_LLM_API_KEY` | Ollama on localhost |
//! | `FRIDGE_CHEF_REQUEST_TIMEOUT_SECS` | 60 |
//! | `FRIDGE_CHEF_STREAM_IDLE_TIMEOUT_SECS` | 30 |
//! | `FRIDGE_CHEF_RETRY_TRANSIENT` | `true` |
//! | `FRIDGE_CHEF_MAX_RECIPES` | 3 |

use std::env;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::str::FromStr;
use std::time::Duration;

use tracing::debug;

use super::types::LlmProviderType;
use crate::constants::env_vars;
use crate::constants::llm::{
    DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_STREAM_IDLE_TIMEOUT_SECS, LOCAL_DEFAULT_BASE_URL,
    LOCAL_DEFAULT_MODEL,
};
use crate::constants::recipes::MAX_RECIPES;
use crate::errors::{AppError, AppResult};

/// OpenAI-compatible endpoint settings
#[derive(Clone, PartialEq, Eq)]
pub struct LocalLlmConfig {
    /// Base URL of the chat completions API
    pub base_url: String,
    /// Model served by the endpoint
    pub model: String,
    /// Optional bearer token
    pub api_key: Option<String>,
}

impl Default for LocalLlmConfig {
    fn default() -> Self {
        Self {
            base_url: LOCAL_DEFAULT_BASE_URL.to_owned(),
            model: LOCAL_DEFAULT_MODEL.to_owned(),
            api_key: None,
        }
    }
}

impl Debug for LocalLlmConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("LocalLlmConfig")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Complete runtime configuration
#[derive(Clone, PartialEq, Eq)]
pub struct ChefConfig {
    /// Selected provider
    pub provider: LlmProviderType,
    /// Model override for the selected provider
    pub model: Option<String>,
    /// Gemini API key
    pub gemini_api_key: Option<String>,
    /// OpenAI-compatible endpoint settings
    pub local: LocalLlmConfig,
    /// Per-call timeout (blocking call or stream establishment)
    pub request_timeout: Duration,
    /// Maximum wait for the next stream event
    pub stream_idle_timeout: Duration,
    /// Whether transient failures get one immediate retry
    pub retry_transient: bool,
    /// Cap on recipes delivered per stream
    pub max_recipes: usize,
}

impl Default for ChefConfig {
    fn default() -> Self {
        Self {
            provider: LlmProviderType::default(),
            model: None,
            gemini_api_key: None,
            local: LocalLlmConfig::default(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            stream_idle_timeout: Duration::from_secs(DEFAULT_STREAM_IDLE_TIMEOUT_SECS),
            retry_transient: true,
            max_recipes: MAX_RECIPES,
        }
    }
}

impl ChefConfig {
    /// Load configuration from process environment variables
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a variable is present but malformed,
    /// or if the resulting configuration fails [`ChefConfig::validate`]
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    ///
    /// Blank values are treated as unset.
    ///
    /// # Errors
    ///
    /// Same as [`ChefConfig::from_env`]
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let defaults = Self::default();

        let provider = get(env_vars::LLM_PROVIDER)
            .map(|value| LlmProviderType::from_str(&value))
            .transpose()?
            .unwrap_or_default();

        let local = LocalLlmConfig {
            base_url: get(env_vars::LOCAL_LLM_BASE_URL).unwrap_or(defaults.local.base_url),
            model: get(env_vars::LOCAL_LLM_MODEL).unwrap_or(defaults.local.model),
            api_key: get(env_vars::LOCAL_LLM_API_KEY),
        };

        let config = Self {
            provider,
            model: get(env_vars::LLM_MODEL),
            gemini_api_key: get(env_vars::GEMINI_API_KEY),
            local,
            request_timeout: parse_var::<u64>(&get, env_vars::REQUEST_TIMEOUT_SECS)?
                .map_or(defaults.request_timeout, Duration::from_secs),
            stream_idle_timeout: parse_var::<u64>(&get, env_vars::STREAM_IDLE_TIMEOUT_SECS)?
                .map_or(defaults.stream_idle_timeout, Duration::from_secs),
            retry_transient: get(env_vars::RETRY_TRANSIENT)
                .map(|value| parse_bool(env_vars::RETRY_TRANSIENT, &value))
                .transpose()?
                .unwrap_or(defaults.retry_transient),
            max_recipes: parse_var::<usize>(&get, env_vars::MAX_RECIPES)?
                .unwrap_or(defaults.max_recipes),
        };

        config.validate()?;
        debug!(?config, "Configuration loaded");
        Ok(config)
    }

    /// Reject values that would make every call fail
    ///
    /// # Errors
    ///
    /// Returns a configuration error for zero timeouts or a zero recipe cap
    pub fn validate(&self) -> AppResult<()> {
        if self.request_timeout.is_zero() {
            return Err(AppError::config(format!(
                "{} must be greater than zero",
                env_vars::REQUEST_TIMEOUT_SECS
            )));
        }
        if self.stream_idle_timeout.is_zero() {
            return Err(AppError::config(format!(
                "{} must be greater than zero",
                env_vars::STREAM_IDLE_TIMEOUT_SECS
            )));
        }
        if self.max_recipes == 0 {
            return Err(AppError::config(format!(
                "{} must be greater than zero",
                env_vars::MAX_RECIPES
            )));
        }
        Ok(())
    }
}

impl Debug for ChefConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ChefConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field(
                "gemini_api_key",
                &self.gemini_api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("local", &self.local)
            .field("request_timeout", &self.request_timeout)
            .field("stream_idle_timeout", &self.stream_idle_timeout)
            .field("retry_transient", &self.retry_transient)
            .field("max_recipes", &self.max_recipes)
            .finish()
    }
}

/// Parse an optional numeric variable
fn parse_var<T: FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> AppResult<Option<T>> {
    get(key)
        .map(|value| {
            value.trim().parse::<T>().map_err(|_| {
                AppError::config(format!("{key} must be a non-negative integer, got '{value}'"))
            })
        })
        .transpose()
}

/// Parse a boolean flag (`true/false`, `1/0`, `yes/no`, `on/off`)
fn parse_bool(key: &str, value: &str) -> AppResult<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(AppError::config(format!(
            "{key} must be a boolean, got '{other}'"
        ))),
    }
}
