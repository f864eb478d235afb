// ABOUTME: Prompt template engine rendering provider-independent prompt text
// ABOUTME: Templates are markdown files compiled in and interpreted as literal and parameter nodes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FridgeChef Contributors

//! # Prompt Templates
//!
//! Prompts are loaded at compile time from markdown files for easy maintenance.
//! A template is a sequence of literal text and `{{name}}` placeholders. The
//! renderer knows three placeholders:
//!
//! - `{{ingredients}}`: the comma-joined ingredient list
//! - `{{message}}`: the new user chat message
//! - `{{history}}`: one `User:` / `Assistant:` line per history entry, in order
//!
//! Required parameters that are missing or blank are rejected before any model
//! call is made.

use std::fmt::{self, Display, Formatter};

use crate::errors::{AppError, AppResult};
use crate::models::{ChatMessage, ChatRole};

/// Vision prompt for ingredient detection
pub const IDENTIFY_INGREDIENTS_TEMPLATE: &str = include_str!("identify_ingredients.md");

/// Recipe suggestion prompt
pub const RECIPES_TEMPLATE: &str = include_str!("recipes.md");

/// Cooking assistant chat prompt
pub const CHAT_TEMPLATE: &str = include_str!("chat.md");

/// Known prompt templates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateId {
    /// Ingredient detection from a photo
    IdentifyIngredients,
    /// Three quick recipes from an ingredient list
    Recipes,
    /// Multi-turn cooking conversation
    Chat,
}

impl TemplateId {
    /// Raw template source
    #[must_use]
    pub const fn source(self) -> &'static str {
        match self {
            Self::IdentifyIngredients => IDENTIFY_INGREDIENTS_TEMPLATE,
            Self::Recipes => RECIPES_TEMPLATE,
            Self::Chat => CHAT_TEMPLATE,
        }
    }

    /// Parameters that must be present and non-blank
    #[must_use]
    pub const fn required_params(self) -> &'static [Param] {
        match self {
            Self::IdentifyIngredients => &[],
            Self::Recipes => &[Param::Ingredients],
            Self::Chat => &[Param::Message],
        }
    }
}

impl Display for TemplateId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::IdentifyIngredients => write!(f, "identify_ingredients"),
            Self::Recipes => write!(f, "recipes"),
            Self::Chat => write!(f, "chat"),
        }
    }
}

/// Template placeholder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Param {
    /// `{{ingredients}}`
    Ingredients,
    /// `{{message}}`
    Message,
    /// `{{history}}`
    History,
}

impl Param {
    fn from_name(name: &str) -> Option<Self> {
        match name.trim() {
            "ingredients" => Some(Self::Ingredients),
            "message" => Some(Self::Message),
            "history" => Some(Self::History),
            _ => None,
        }
    }

    /// Placeholder name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Ingredients => "ingredients",
            Self::Message => "message",
            Self::History => "history",
        }
    }
}

/// Parameter set for rendering
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptParams<'a> {
    /// Comma-joined ingredient names
    pub ingredients: Option<&'a str>,
    /// Conversation so far, oldest first
    pub history: &'a [ChatMessage],
    /// New user message
    pub message: Option<&'a str>,
}

impl<'a> PromptParams<'a> {
    /// No parameters
    #[must_use]
    pub const fn none() -> Self {
        Self {
            ingredients: None,
            history: &[],
            message: None,
        }
    }

    /// Parameters for the recipe template
    #[must_use]
    pub const fn ingredients(ingredients: &'a str) -> Self {
        Self {
            ingredients: Some(ingredients),
            history: &[],
            message: None,
        }
    }

    /// Parameters for the chat template
    #[must_use]
    pub const fn chat(history: &'a [ChatMessage], message: &'a str) -> Self {
        Self {
            ingredients: None,
            history,
            message: Some(message),
        }
    }

    fn scalar(&self, param: Param) -> Option<&'a str> {
        match param {
            Param::Ingredients => self.ingredients,
            Param::Message => self.message,
            Param::History => None,
        }
    }
}

/// Parsed template node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Node<'t> {
    Literal(&'t str),
    Substitute(Param),
}

/// Split template source into literal and placeholder nodes
fn parse(source: &str) -> AppResult<Vec<Node<'_>>> {
    let mut nodes = Vec::new();
    let mut rest = source;
    while let Some(start) = rest.find("{{") {
        if start > 0 {
            nodes.push(Node::Literal(&rest[..start]));
        }
        let after_open = &rest[start + 2..];
        let end = after_open
            .find("}}")
            .ok_or_else(|| AppError::internal("Unclosed placeholder in prompt template"))?;
        let name = &after_open[..end];
        let param = Param::from_name(name).ok_or_else(|| {
            AppError::internal(format!("Unknown placeholder '{{{{{name}}}}}' in prompt template"))
        })?;
        nodes.push(Node::Substitute(param));
        rest = &after_open[end + 2..];
    }
    if !rest.is_empty() {
        nodes.push(Node::Literal(rest));
    }
    Ok(nodes)
}

fn render_history(history: &[ChatMessage], out: &mut String) {
    for (index, entry) in history.iter().enumerate() {
        if index > 0 {
            out.push('\n');
        }
        let speaker = match entry.role {
            ChatRole::User => "User",
            ChatRole::Model => "Assistant",
        };
        out.push_str(speaker);
        out.push_str(": ");
        out.push_str(&entry.content);
    }
}

/// Render a template with the given parameters
///
/// # Errors
///
/// Returns `MISSING_REQUIRED_FIELD` if a required parameter is missing or
/// blank, and an internal error if the template itself is malformed
pub fn render(template: TemplateId, params: &PromptParams<'_>) -> AppResult<String> {
    for &param in template.required_params() {
        if params.scalar(param).map_or(true, |value| value.trim().is_empty()) {
            return Err(AppError::missing_field(param.name()));
        }
    }

    let source = template.source();
    let mut out = String::with_capacity(source.len() + 256);
    for node in parse(source)? {
        match node {
            Node::Literal(text) => out.push_str(text),
            Node::Substitute(Param::History) => render_history(params.history, &mut out),
            Node::Substitute(param) => out.push_str(params.scalar(param).unwrap_or_default()),
        }
    }
    Ok(out)
}
