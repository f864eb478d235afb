// ABOUTME: Chat flow answering cooking questions with the conversation supplied by the caller
// ABOUTME: Stateless; the caller appends the message and the returned reply to its own history
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FridgeChef Contributors

use std::time::Instant;

use tracing::instrument;

use super::FridgeChef;
use crate::errors::{AppError, AppResult};
use crate::llm::ModelRequest;
use crate::logging::FlowLogger;
use crate::models::ChatMessage;
use crate::prompts::{render, PromptParams, TemplateId};

impl FridgeChef {
    /// Reply to `message` given the earlier `history`
    ///
    /// The reply text is returned verbatim. `history` is only read.
    ///
    /// # Errors
    ///
    /// - `INVALID_INPUT` for a blank message, before any model call
    /// - provider errors, or `SCHEMA_VIOLATION` for an empty reply
    #[instrument(skip(self, history, message), fields(history_len = history.len()))]
    pub async fn chat(&self, history: &[ChatMessage], message: &str) -> AppResult<String> {
        let started = Instant::now();
        let result = self.chat_inner(history, message).await;
        FlowLogger::log_flow_completed(
            "chat",
            started.elapsed(),
            result.as_ref().map(|_| 1),
        );
        result
    }

    async fn chat_inner(&self, history: &[ChatMessage], message: &str) -> AppResult<String> {
        if message.trim().is_empty() {
            return Err(AppError::invalid_input("Message cannot be empty"));
        }
        let prompt = render(TemplateId::Chat, &PromptParams::chat(history, message))?;
        self.client.invoke::<String>(&ModelRequest::new(prompt)).await
    }
}
