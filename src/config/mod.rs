// ABOUTME: Configuration management module for the model orchestration layer
// ABOUTME: Loads provider selection, timeouts, retry policy and recipe limits from the environment
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FridgeChef Contributors

//! Configuration module for FridgeChef
//!
//! Configuration is environment-only; there are no config files.
//!
//! - **Environment**: `ChefConfig` loaded by `ChefConfig::from_env()`
//! - **Types**: `LlmProviderType` provider selection

/// Environment configuration loading and validation
pub mod environment;
/// Shared configuration enums
pub mod types;

pub use environment::{ChefConfig, LocalLlmConfig};
pub use types::LlmProviderType;
