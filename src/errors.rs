// ABOUTME: Unified error handling re-exported from fridge-chef-core
// ABOUTME: AppError, ErrorCode and ErrorCategory shared by every flow and provider
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FridgeChef Contributors

//! # Unified Error Handling System
//!
//! Every failure carries a machine-checkable [`ErrorCode`] and a
//! human-readable message. [`ErrorCode::category`] groups codes into the
//! caller-facing taxonomy: input validation, provider, schema violation,
//! empty result.

pub use fridge_chef_core::errors::*;
