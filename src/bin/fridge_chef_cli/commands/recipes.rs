// ABOUTME: Recipes command for fridge-chef
// ABOUTME: Streams recipe suggestions to stdout as each one arrives, optionally from a photo
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FridgeChef Contributors

use std::ops::ControlFlow;
use std::path::Path;

use fridge_chef::errors::AppResult;
use fridge_chef::flows::FridgeChef;
use fridge_chef::models::IngredientList;
use tracing::info;

use crate::helpers::display::{display_ingredients, display_recipe, OutputMode};
use crate::helpers::image::load_image;

/// Stream recipes for `ingredients`, or for the ingredients found in `from_image`
pub async fn run(
    chef: &FridgeChef,
    ingredients: Vec<String>,
    from_image: Option<&Path>,
    limit: Option<usize>,
    mode: OutputMode,
) -> AppResult<()> {
    let ingredients = match from_image {
        Some(path) => {
            let image = load_image(path, None).await?;
            let found = chef.identify_ingredients(&image).await?;
            if mode == OutputMode::Text {
                display_ingredients(&found, mode);
            }
            found
        }
        None => IngredientList::from_names(ingredients),
    };

    let limit = limit.unwrap_or(usize::MAX);
    let mut shown = 0;
    let summary = chef
        .generate_recipes_until(&ingredients.to_csv(), |recipe| {
            shown += 1;
            display_recipe(shown, &recipe, mode);
            if shown >= limit {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })
        .await?;

    info!(
        delivered = summary.delivered,
        skipped = summary.skipped,
        cancelled = summary.cancelled,
        "Recipe stream finished"
    );
    if mode == OutputMode::Text && summary.delivered == 0 {
        println!("No recipes could be generated for these ingredients.");
    }
    Ok(())
}
