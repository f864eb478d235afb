// ABOUTME: Shared configuration types for the orchestration layer
// ABOUTME: Contains the LlmProviderType enum used to select the model backend
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FridgeChef Contributors

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::env_vars;
use crate::errors::AppError;

/// Model provider selection
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LlmProviderType {
    /// Google Gemini provider - full-featured with vision support (default)
    #[default]
    Gemini,
    /// Local provider - `OpenAI`-compatible endpoint (Ollama, vLLM, `LocalAI`)
    Local,
}

impl LlmProviderType {
    /// Environment variable name for provider selection
    pub const ENV_VAR: &'static str = env_vars::LLM_PROVIDER;
}

impl FromStr for LlmProviderType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gemini" | "google" => Ok(Self::Gemini),
            "local" | "ollama" | "vllm" | "localai" => Ok(Self::Local),
            other => Err(AppError::config(format!(
                "Unknown {} value '{other}' (expected 'gemini' or 'local')",
                Self::ENV_VAR
            ))),
        }
    }
}

impl Display for LlmProviderType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Gemini => write!(f, "gemini"),
            Self::Local => write!(f, "local"),
        }
    }
}
