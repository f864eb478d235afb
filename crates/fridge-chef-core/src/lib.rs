// ABOUTME: Core types for the FridgeChef generative-model orchestration layer
// ABOUTME: Foundation crate with error handling and the ingredient, recipe and chat data model
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FridgeChef Contributors

#![deny(unsafe_code)]

//! # FridgeChef Core
//!
//! Foundation crate providing the shared types of the FridgeChef workspace.
//! It has no async or network dependencies, so the types can be reused by any
//! surrounding application (UI, CLI, persistence) without pulling in the model
//! orchestration stack.
//!
//! ## Modules
//!
//! - **errors**: Unified error handling with `AppError`, `ErrorCode` and `ErrorCategory`
//! - **models**: `IngredientList`, `ImageData`, `Recipe`, `ChatMessage`

/// Unified error handling system with machine-checkable error codes
pub mod errors;

/// Core data models shared by every flow
pub mod models;
