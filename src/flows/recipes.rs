// ABOUTME: Generate-recipes flow streaming recipe tool calls through the reducer
// ABOUTME: Delivers each validated recipe as soon as its tool call completes, at most the configured cap
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FridgeChef Contributors

use std::ops::ControlFlow;
use std::time::Instant;

use serde_json::json;
use tokio_stream::Stream;
use tracing::{debug, info, instrument};

use super::FridgeChef;
use crate::constants::recipes::{RECIPE_TOOL_DESCRIPTION, RECIPE_TOOL_NAME};
use crate::errors::{AppError, AppResult};
use crate::llm::{ModelRequest, ReduceSummary, ToolDeclaration, ToolCallReducer};
use crate::logging::FlowLogger;
use crate::models::{IngredientList, Recipe};
use crate::prompts::{render, PromptParams, TemplateId};
use crate::validation::Shape;

/// The `recipe` tool the model calls once per suggestion
#[must_use]
pub fn recipe_tool() -> ToolDeclaration {
    ToolDeclaration::new(
        RECIPE_TOOL_NAME,
        RECIPE_TOOL_DESCRIPTION,
        Recipe::json_schema().unwrap_or_else(|| json!({ "type": "object" })),
    )
}

impl FridgeChef {
    fn recipe_request(ingredients_csv: &str) -> AppResult<ModelRequest> {
        let prompt = render(TemplateId::Recipes, &PromptParams::ingredients(ingredients_csv))?;
        Ok(ModelRequest::new(prompt).with_tool(recipe_tool()))
    }

    fn recipe_reducer(&self) -> ToolCallReducer<Recipe> {
        ToolCallReducer::new(RECIPE_TOOL_NAME).with_max_items(self.max_recipes)
    }

    /// Stream recipe suggestions for a comma-joined ingredient list
    ///
    /// `on_recipe` runs once per validated recipe, in arrival order, before
    /// this call returns. Malformed suggestions are skipped.
    ///
    /// # Errors
    ///
    /// - `MISSING_REQUIRED_FIELD` for a blank ingredient string, before any model call
    /// - provider errors, raised only after every recipe that preceded the
    ///   failure has been delivered
    pub async fn generate_recipes<F>(&self, ingredients_csv: &str, mut on_recipe: F) -> AppResult<ReduceSummary>
    where
        F: FnMut(Recipe),
    {
        self.generate_recipes_until(ingredients_csv, |recipe| {
            on_recipe(recipe);
            ControlFlow::Continue(())
        })
        .await
    }

    /// Like [`FridgeChef::generate_recipes`], but `on_recipe` may stop early
    ///
    /// Returning [`ControlFlow::Break`] cancels the stream; the call then
    /// returns normally with `cancelled` set.
    ///
    /// # Errors
    ///
    /// Same as [`FridgeChef::generate_recipes`]
    #[instrument(skip(self, ingredients_csv, on_recipe), fields(max_recipes = self.max_recipes))]
    pub async fn generate_recipes_until<F>(&self, ingredients_csv: &str, on_recipe: F) -> AppResult<ReduceSummary>
    where
        F: FnMut(Recipe) -> ControlFlow<()>,
    {
        let started = Instant::now();
        let result = self.stream_recipes(ingredients_csv, on_recipe).await;
        if let Ok(summary) = &result {
            info!(
                recipes_delivered = summary.delivered,
                recipes_skipped = summary.skipped,
                cancelled = summary.cancelled,
                "Recipe stream finished"
            );
        }
        FlowLogger::log_flow_completed(
            "generate_recipes",
            started.elapsed(),
            result.as_ref().map(|summary| summary.delivered),
        );
        result
    }

    async fn stream_recipes<F>(&self, ingredients_csv: &str, on_recipe: F) -> AppResult<ReduceSummary>
    where
        F: FnMut(Recipe) -> ControlFlow<()>,
    {
        let request = Self::recipe_request(ingredients_csv)?;
        let mut reducer = self.recipe_reducer();
        if reducer.state().is_terminal() {
            debug!("Recipe cap is zero, skipping the model call");
            return Ok(ReduceSummary::default());
        }
        let events = self.client.invoke_stream(&request).await?;
        reducer.drive(events, on_recipe).await
    }

    /// Stream recipe suggestions for a normalized ingredient list
    ///
    /// # Errors
    ///
    /// `INVALID_INPUT` for an empty list, otherwise as
    /// [`FridgeChef::generate_recipes`]
    pub async fn generate_recipes_for<F>(&self, ingredients: &IngredientList, on_recipe: F) -> AppResult<ReduceSummary>
    where
        F: FnMut(Recipe),
    {
        if ingredients.is_empty() {
            return Err(AppError::invalid_input(
                "No ingredients were provided to generate recipes.",
            ));
        }
        self.generate_recipes(&ingredients.to_csv(), on_recipe).await
    }

    /// Recipe suggestions as a stream; dropping it cancels the model stream
    ///
    /// # Errors
    ///
    /// Input and stream establishment errors are returned here; a later
    /// stream failure is yielded as the final item
    pub async fn recipe_stream(
        &self,
        ingredients_csv: &str,
    ) -> AppResult<impl Stream<Item = AppResult<Recipe>> + Send> {
        let request = Self::recipe_request(ingredients_csv)?;
        let events = self.client.invoke_stream(&request).await?;
        Ok(self.recipe_reducer().into_stream(events))
    }
}
