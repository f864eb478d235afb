// ABOUTME: System-wide constants and configuration defaults for FridgeChef
// ABOUTME: Tool names, recipe limits, environment variable names and provider defaults
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FridgeChef Contributors

//! # Constants Module
//!
//! Hardcoded values shared by the flows, the providers and configuration loading.

/// Recipe generation constants
pub mod recipes {
    /// Name of the tool the model calls once per recipe
    pub const RECIPE_TOOL_NAME: &str = "recipe";

    /// Description of the recipe tool shown to the model
    pub const RECIPE_TOOL_DESCRIPTION: &str = "Provides a single recipe suggestion.";

    /// Recipes requested by the prompt and delivered at most per stream
    pub const MAX_RECIPES: usize = 3;
}

/// Model provider defaults
pub mod llm {
    /// Base URL for the Gemini API
    pub const GEMINI_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

    /// Default Gemini model
    pub const GEMINI_DEFAULT_MODEL: &str = "gemini-2.0-flash";

    /// Default base URL for OpenAI-compatible servers (Ollama)
    pub const LOCAL_DEFAULT_BASE_URL: &str = "http://localhost:11434/v1";

    /// Default model for local inference
    pub const LOCAL_DEFAULT_MODEL: &str = "llava:13b";

    /// TCP connect timeout for provider HTTP clients
    pub const CONNECT_TIMEOUT_SECS: u64 = 30;

    /// Default per-call timeout (blocking call or stream establishment)
    pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

    /// Default maximum wait for the next stream event
    pub const DEFAULT_STREAM_IDLE_TIMEOUT_SECS: u64 = 30;
}

/// Environment variable names
pub mod env_vars {
    /// Provider selection (`gemini` or `local`)
    pub const LLM_PROVIDER: &str = "FRIDGE_CHEF_LLM_PROVIDER";
    /// Model override
    pub const LLM_MODEL: &str = "FRIDGE_CHEF_LLM_MODEL";
    /// Gemini API key
    pub const GEMINI_API_KEY: &str = "GEMINI_API_KEY";
    /// OpenAI-compatible base URL
    pub const LOCAL_LLM_BASE_URL: &str = "LOCAL_LLM_BASE_URL";
    /// OpenAI-compatible model
    pub const LOCAL_LLM_MODEL: &str = "LOCAL_LLM_MODEL";
    /// OpenAI-compatible API key (optional)
    pub const LOCAL_LLM_API_KEY: &str = "LOCAL_LLM_API_KEY";
    /// Per-call timeout in seconds
    pub const REQUEST_TIMEOUT_SECS: &str = "FRIDGE_CHEF_REQUEST_TIMEOUT_SECS";
    /// Stream idle timeout in seconds
    pub const STREAM_IDLE_TIMEOUT_SECS: &str = "FRIDGE_CHEF_STREAM_IDLE_TIMEOUT_SECS";
    /// Enable the single immediate retry
    pub const RETRY_TRANSIENT: &str = "FRIDGE_CHEF_RETRY_TRANSIENT";
    /// Cap on recipes delivered per stream
    pub const MAX_RECIPES: &str = "FRIDGE_CHEF_MAX_RECIPES";
}

/// Service identity used by logging
pub mod service_names {
    /// Service name reported in structured logs
    pub const FRIDGE_CHEF: &str = "fridge-chef";
}
