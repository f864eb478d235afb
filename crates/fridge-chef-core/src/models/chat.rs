// ABOUTME: Chat conversation models
// ABOUTME: ChatRole, ChatMessage and the caller-owned ChatHistory
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FridgeChef Contributors

use serde::{Deserialize, Serialize};

/// Author of a chat turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// The person asking questions
    User,
    /// The cooking assistant
    Model,
}

/// One turn of a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Who wrote the message
    pub role: ChatRole,
    /// Message text
    pub content: String,
}

impl ChatMessage {
    /// Message written by the user
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    /// Reply written by the assistant
    #[must_use]
    pub fn model(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Model,
            content: content.into(),
        }
    }
}

/// Chronological conversation owned by the caller
pub type ChatHistory = Vec<ChatMessage>;
