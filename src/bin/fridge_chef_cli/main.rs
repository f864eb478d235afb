// ABOUTME: FridgeChef CLI - identify ingredients, stream recipes and chat from the terminal
// ABOUTME: Builds the configured provider, wires the flows and renders results as text or JSON
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FridgeChef Contributors
//!
//! Usage:
//! ```bash
//! # List the ingredients in a fridge photo
//! fridge-chef identify fridge.jpg
//!
//! # Stream three recipes for some ingredients
//! fridge-chef recipes eggs spinach feta
//!
//! # Detect ingredients and then stream recipes for them, stopping after one
//! fridge-chef recipes --from-image fridge.jpg --limit 1
//!
//! # Chat with the cooking assistant
//! fridge-chef chat
//!
//! # Machine-readable output
//! fridge-chef --json identify fridge.jpg
//! ```

mod commands;
mod helpers;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use fridge_chef::config::ChefConfig;
use fridge_chef::errors::AppResult;
use fridge_chef::flows::FridgeChef;
use fridge_chef::llm::{ChatProvider, ModelClient};
use fridge_chef::logging::LoggingConfig;
use tracing::debug;

use helpers::display::{print_error, OutputMode};

#[derive(Parser)]
#[command(
    name = "fridge-chef",
    about = "FridgeChef - recipes from what is in your fridge",
    long_about = "Identify ingredients from a photo, stream quick recipe ideas and chat with a cooking assistant."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Print results and errors as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

#[non_exhaustive]
#[derive(Subcommand)]
enum Command {
    /// List the ingredients visible in a photo
    Identify {
        /// Path to the image file
        image: PathBuf,

        /// MIME type override (inferred from the extension otherwise)
        #[arg(long)]
        mime: Option<String>,
    },

    /// Stream recipe suggestions
    Recipes {
        /// Ingredient names
        #[arg(required_unless_present = "from_image", conflicts_with = "from_image")]
        ingredients: Vec<String>,

        /// Identify the ingredients from a photo first
        #[arg(long)]
        from_image: Option<PathBuf>,

        /// Stop after this many recipes
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Interactive cooking chat on stdin
    Chat,
}

async fn run(cli: Cli) -> AppResult<()> {
    let mode = OutputMode::from_flag(cli.json);
    let config = ChefConfig::from_env()?;
    let provider = ChatProvider::from_config(&config)?;
    debug!(?provider, "Provider ready");
    let client = ModelClient::with_config(Arc::new(provider), (&config).into());
    let chef = FridgeChef::with_config(client, &config);

    match cli.command {
        Command::Identify { image, mime } => {
            commands::identify::run(&chef, &image, mime.as_deref(), mode).await
        }
        Command::Recipes {
            ingredients,
            from_image,
            limit,
        } => commands::recipes::run(&chef, ingredients, from_image.as_deref(), limit, mode).await,
        Command::Chat => commands::chat::run(&chef, mode).await,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    let logging = LoggingConfig::from_env().with_level(level);
    if let Err(e) = logging.init() {
        eprintln!("Failed to initialize logging: {e}");
    }

    let mode = OutputMode::from_flag(cli.json);
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            print_error(&error, mode);
            ExitCode::FAILURE
        }
    }
}
