// ABOUTME: Identify-ingredients flow turning a fridge photo into a normalized ingredient list
// ABOUTME: Validates the image before any model call and rejects an empty detection result
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FridgeChef Contributors

use std::time::Instant;

use tracing::instrument;

use super::FridgeChef;
use crate::errors::{AppError, AppResult};
use crate::llm::ModelRequest;
use crate::logging::FlowLogger;
use crate::models::{ImageData, IngredientList};
use crate::prompts::{render, PromptParams, TemplateId};
use crate::validation::Shape;

impl FridgeChef {
    /// Identify the food items visible in `image`
    ///
    /// # Errors
    ///
    /// - `UNSUPPORTED_MEDIA_TYPE` / `INVALID_INPUT` for a non-image MIME type
    ///   or a bad payload, before any model call
    /// - provider errors and `SCHEMA_VIOLATION` from the model call
    /// - `EMPTY_RESULT` if the model found nothing
    #[instrument(skip(self, image), fields(mime_type = %image.mime_type))]
    pub async fn identify_ingredients(&self, image: &ImageData) -> AppResult<IngredientList> {
        let started = Instant::now();
        let result = self.identify_inner(image).await;
        FlowLogger::log_flow_completed(
            "identify_ingredients",
            started.elapsed(),
            result.as_ref().map(IngredientList::len),
        );
        result
    }

    async fn identify_inner(&self, image: &ImageData) -> AppResult<IngredientList> {
        image.validate()?;

        let prompt = render(TemplateId::IdentifyIngredients, &PromptParams::none())?;
        let mut request = ModelRequest::new(prompt).with_image(image.clone());
        if let Some(schema) = IngredientList::json_schema() {
            request = request.with_response_schema(schema);
        }

        let ingredients: IngredientList = self.client.invoke(&request).await?;
        if ingredients.is_empty() {
            return Err(AppError::empty_result(
                "No ingredients were identified in the image",
            ));
        }
        Ok(ingredients)
    }
}
