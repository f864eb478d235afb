// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FridgeChef Contributors
// ABOUTME: Output formatting helpers for fridge-chef
// ABOUTME: Renders ingredient lists, recipes, chat replies and errors as text or JSON lines

use fridge_chef::errors::{AppError, ErrorResponse};
use fridge_chef::models::{IngredientList, Recipe};
use serde::Serialize;
use serde_json::json;

/// Human or machine output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Text,
    Json,
}

impl OutputMode {
    pub const fn from_flag(json: bool) -> Self {
        if json {
            Self::Json
        } else {
            Self::Text
        }
    }
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string(value) {
        Ok(line) => println!("{line}"),
        Err(e) => eprintln!("Failed to serialize output: {e}"),
    }
}

pub fn display_ingredients(ingredients: &IngredientList, mode: OutputMode) {
    match mode {
        OutputMode::Json => print_json(&json!({ "ingredients": ingredients })),
        OutputMode::Text => {
            println!("Found {} ingredients:", ingredients.len());
            for name in ingredients {
                println!("  - {name}");
            }
        }
    }
}

pub fn display_recipe(index: usize, recipe: &Recipe, mode: OutputMode) {
    match mode {
        OutputMode::Json => print_json(recipe),
        OutputMode::Text => {
            println!("\n{}. {}", index, recipe.name);
            println!("{}", "=".repeat(60));
            println!("Ingredients: {}", recipe.ingredients);
            println!("\nInstructions:");
            for (step, line) in recipe.instruction_steps().enumerate() {
                println!("  {}. {line}", step + 1);
            }
            println!("\nVideo: {}", recipe.youtube_search_url());
        }
    }
}

pub fn display_reply(reply: &str, mode: OutputMode) {
    match mode {
        OutputMode::Json => print_json(&json!({ "reply": reply })),
        OutputMode::Text => println!("\n{reply}\n"),
    }
}

pub fn print_error(error: &AppError, mode: OutputMode) {
    match mode {
        OutputMode::Json => print_json(&ErrorResponse::from(error)),
        OutputMode::Text => eprintln!("Error: {error}"),
    }
}
