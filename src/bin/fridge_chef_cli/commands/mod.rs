// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FridgeChef Contributors
// ABOUTME: Re-exports command modules for fridge-chef
// ABOUTME: Provides access to the identify, recipes and chat commands

pub mod chat;
pub mod identify;
pub mod recipes;
