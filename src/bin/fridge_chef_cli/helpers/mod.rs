// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FridgeChef Contributors
// ABOUTME: Re-exports helper modules for fridge-chef
// ABOUTME: Provides image loading and output formatting utilities

pub mod display;
pub mod image;
