// ABOUTME: Data model shared by the FridgeChef flows
// ABOUTME: Re-exports IngredientList, ImageData, Recipe and the chat message types
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FridgeChef Contributors

//! # Data Models
//!
//! The values that cross the boundary between the surrounding application and
//! the model orchestration layer. Every model is immutable once produced by a
//! flow and serializes with the field names the application front-end uses.
//!
//! ## Core Models
//!
//! - `IngredientList`: normalized, de-duplicated ingredient names
//! - `ImageData`: an embedded image (`data:<mime>;base64,<payload>`)
//! - `Recipe`: a flat record of four strings produced by the recipe stream
//! - `ChatMessage`: one turn of a cooking conversation

// Domain modules
mod chat;
mod ingredients;
mod recipe;

// Ingredient domain
pub use ingredients::{ImageData, IngredientList};

// Recipe domain
pub use recipe::Recipe;

// Conversation domain
pub use chat::{ChatHistory, ChatMessage, ChatRole};
