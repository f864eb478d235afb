// ABOUTME: Shared test utilities and fixtures for integration tests
// ABOUTME: Provides logging setup, recipe fixtures and scripted recipe tool-call streams
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FridgeChef Contributors
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::module_name_repetitions
)]
//! Shared test utilities for `fridge_chef`
//!
//! This module provides common fixtures to reduce duplication across
//! integration tests.

use std::sync::{Arc, Once};

use fridge_chef::flows::FridgeChef;
use fridge_chef::llm::{ModelClient, ScriptedProvider, StreamEvent};
use fridge_chef::models::{ImageData, Recipe};
use serde_json::json;

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            _ => tracing::Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// A recipe fixture whose fields are derived from `name`
pub fn recipe(name: &str) -> Recipe {
    Recipe {
        name: name.to_owned(),
        ingredients: "eggs, butter".to_owned(),
        instructions: format!("Prepare the {name}.\nServe warm."),
        youtube_search_query: format!("how to make {name}"),
    }
}

/// Tool-call arguments JSON for `recipe`
pub fn recipe_json(recipe: &Recipe) -> String {
    json!({
        "name": recipe.name,
        "ingredients": recipe.ingredients,
        "instructions": recipe.instructions,
        "youtubeSearchQuery": recipe.youtube_search_query,
    })
    .to_string()
}

/// Start, one argument fragment, complete
pub fn tool_call(id: &str, arguments: &str) -> Vec<StreamEvent> {
    vec![
        StreamEvent::tool_start(id, "recipe"),
        StreamEvent::tool_args(id, arguments),
        StreamEvent::tool_complete(id),
    ]
}

/// Like [`tool_call`] with the arguments split into `pieces` fragments
pub fn chunked_tool_call(id: &str, arguments: &str, pieces: usize) -> Vec<StreamEvent> {
    let chars: Vec<char> = arguments.chars().collect();
    let size = chars.len().div_ceil(pieces.max(1)).max(1);
    let mut events = vec![StreamEvent::tool_start(id, "recipe")];
    events.extend(
        chars
            .chunks(size)
            .map(|chunk| StreamEvent::tool_args(id, chunk.iter().collect::<String>())),
    );
    events.push(StreamEvent::tool_complete(id));
    events
}

/// A stream delivering one tool call per recipe, then `StreamEnd`
pub fn recipe_stream(recipes: &[Recipe]) -> Vec<StreamEvent> {
    let mut events: Vec<StreamEvent> = recipes
        .iter()
        .enumerate()
        .flat_map(|(index, recipe)| tool_call(&format!("call-{index}"), &recipe_json(recipe)))
        .collect();
    events.push(StreamEvent::StreamEnd);
    events
}

/// Scripted provider plus flows over it
pub fn scripted_chef() -> (Arc<ScriptedProvider>, FridgeChef) {
    init_test_logging();
    let provider = Arc::new(ScriptedProvider::new());
    let chef = FridgeChef::new(ModelClient::new(provider.clone()));
    (provider, chef)
}

/// A tiny valid JPEG-typed image
pub fn fridge_photo() -> ImageData {
    ImageData::from_bytes("image/jpeg", &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10])
}
