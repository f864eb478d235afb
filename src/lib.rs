// ABOUTME: Main library entry point for the FridgeChef generative-model orchestration layer
// ABOUTME: Ingredient detection, streamed recipe suggestions via tool calls, and cooking chat
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FridgeChef Contributors

#![deny(unsafe_code)]

//! # FridgeChef
//!
//! Orchestration core that turns a fridge photo into an ingredient list,
//! streams quick recipe suggestions for those ingredients, and answers
//! follow-up cooking questions.
//!
//! ## Architecture
//!
//! - **Prompts**: Compiled-in templates rendered per flow
//! - **LLM**: Provider trait, Gemini and `OpenAI`-compatible providers, the
//!   invocation client and the streaming tool-call reducer
//! - **Validation**: Typed shapes the model output is checked against
//! - **Flows**: `identify_ingredients`, `generate_recipes` and `chat`
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use fridge_chef::config::ChefConfig;
//! use fridge_chef::errors::AppResult;
//! use fridge_chef::flows::FridgeChef;
//! use fridge_chef::llm::{ChatProvider, ModelClient};
//!
//! #[tokio::main]
//! async fn main() -> AppResult<()> {
//!     let config = ChefConfig::from_env()?;
//!     let provider = ChatProvider::from_config(&config)?;
//!     let client = ModelClient::with_config(Arc::new(provider), (&config).into());
//!     let chef = FridgeChef::with_config(client, &config);
//!
//!     chef.generate_recipes("eggs, spinach, feta", |recipe| {
//!         println!("{}", recipe.name);
//!     })
//!     .await?;
//!     Ok(())
//! }
//! ```

/// Environment configuration
pub mod config;

/// Application constants
pub mod constants;

/// Unified error handling, re-exported from the core crate
pub mod errors;

/// Identify, recipe and chat flows
pub mod flows;

/// Model providers, invocation client and streaming reducer
pub mod llm;

/// Logging setup and structured flow records
pub mod logging;

/// Data models, re-exported from the core crate
pub mod models;

/// Prompt templates and renderer
pub mod prompts;

/// Shape validation of model output
pub mod validation;
