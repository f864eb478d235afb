// ABOUTME: User-facing flows composing prompts, the invocation client and the reducer
// ABOUTME: Identify ingredients from a photo, stream recipe suggestions and chat about cooking
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FridgeChef Contributors

//! # Flows
//!
//! [`FridgeChef`] is the function-call surface offered to the surrounding
//! application. It holds no conversation or ingredient state; every call is
//! independent and clones of the same value may run concurrently.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use fridge_chef::flows::FridgeChef;
//! use fridge_chef::llm::{ChatProvider, ModelClient};
//!
//! async fn example() -> Result<(), fridge_chef::errors::AppError> {
//!     let provider = Arc::new(ChatProvider::from_env()?);
//!     let chef = FridgeChef::new(ModelClient::new(provider));
//!     let reply = chef.chat(&[], "What can I cook with eggs?").await?;
//!     println!("{reply}");
//!     Ok(())
//! }
//! ```

mod chat;
mod identify;
mod recipes;

pub use recipes::recipe_tool;

use crate::config::ChefConfig;
use crate::constants::recipes::MAX_RECIPES;
use crate::llm::ModelClient;

/// Entry point for the three flows
#[derive(Debug, Clone)]
pub struct FridgeChef {
    client: ModelClient,
    max_recipes: usize,
}

impl FridgeChef {
    /// Create the flows over an explicitly constructed client
    #[must_use]
    pub const fn new(client: ModelClient) -> Self {
        Self {
            client,
            max_recipes: MAX_RECIPES,
        }
    }

    /// Create the flows with limits taken from configuration
    #[must_use]
    pub const fn with_config(client: ModelClient, config: &ChefConfig) -> Self {
        Self {
            client,
            max_recipes: config.max_recipes,
        }
    }

    /// Change the per-stream recipe cap
    #[must_use]
    pub const fn with_max_recipes(mut self, max_recipes: usize) -> Self {
        self.max_recipes = max_recipes;
        self
    }

    /// Underlying invocation client
    #[must_use]
    pub const fn client(&self) -> &ModelClient {
        &self.client
    }
}
