// ABOUTME: Chat command for fridge-chef
// ABOUTME: Line-oriented REPL on stdin keeping the conversation history client-side
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FridgeChef Contributors

use fridge_chef::errors::{AppError, AppResult, ErrorCategory};
use fridge_chef::flows::FridgeChef;
use fridge_chef::models::{ChatHistory, ChatMessage};
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::helpers::display::{display_reply, print_error, OutputMode};

/// Run the chat loop until end of input or `/quit`
pub async fn run(chef: &FridgeChef, mode: OutputMode) -> AppResult<()> {
    let mut lines = BufReader::new(io::stdin()).lines();
    let mut stdout = io::stdout();
    let mut history = ChatHistory::new();

    if mode == OutputMode::Text {
        println!("FridgeChef AI - ask anything about cooking. Type /quit to leave.");
    }

    loop {
        if mode == OutputMode::Text {
            stdout.write_all(b"> ").await.map_err(stdio_error)?;
            stdout.flush().await.map_err(stdio_error)?;
        }
        let Some(line) = lines.next_line().await.map_err(stdio_error)? else {
            break;
        };
        let message = line.trim();
        if message.is_empty() {
            continue;
        }
        if message == "/quit" {
            break;
        }

        match chef.chat(&history, message).await {
            Ok(reply) => {
                display_reply(&reply, mode);
                history.push(ChatMessage::user(message));
                history.push(ChatMessage::model(reply));
            }
            Err(error) if error.category() == ErrorCategory::Configuration => return Err(error),
            Err(error) => print_error(&error, mode),
        }
    }
    Ok(())
}

fn stdio_error(error: io::Error) -> AppError {
    AppError::internal(format!("Terminal I/O failed: {error}")).with_source(error)
}
