// ABOUTME: Identify command for fridge-chef
// ABOUTME: Loads a photo and prints the detected ingredient list
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FridgeChef Contributors

use std::path::Path;

use fridge_chef::errors::AppResult;
use fridge_chef::flows::FridgeChef;
use tracing::info;

use crate::helpers::display::{display_ingredients, OutputMode};
use crate::helpers::image::load_image;

/// Identify and print the ingredients in `image`
pub async fn run(chef: &FridgeChef, image: &Path, mime: Option<&str>, mode: OutputMode) -> AppResult<()> {
    let image = load_image(image, mime).await?;
    info!(mime_type = %image.mime_type, "Identifying ingredients");
    let ingredients = chef.identify_ingredients(&image).await?;
    display_ingredients(&ingredients, mode);
    Ok(())
}
