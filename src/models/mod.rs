// ABOUTME: Core data models re-exported from fridge-chef-core
// ABOUTME: Re-exports IngredientList, ImageData, Recipe and the chat history types
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FridgeChef Contributors

//! # Data Models
//!
//! - `IngredientList`: normalized, de-duplicated ingredient names
//! - `ImageData`: MIME type plus base64 payload of a photo
//! - `Recipe`: flat record of four strings
//! - `ChatMessage` / `ChatHistory`: caller-owned conversation

pub use fridge_chef_core::models::*;
