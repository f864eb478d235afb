// ABOUTME: Schema validation of model output against the declared result shapes
// ABOUTME: Compiles each shape's JSON Schema once and decodes validated values with serde
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FridgeChef Contributors

//! # Schema Validator
//!
//! A [`Shape`] is a typed value the model is asked to produce. Its JSON Schema
//! is the single source of truth: the same document is sent to providers that
//! support structured output and compiled with [`jsonschema`] to check what
//! comes back. Only values that pass are decoded into the typed form.
//! Validation is side-effect free and reports every violation it finds, not
//! just the first one.

use std::sync::OnceLock;

use jsonschema::Validator;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::errors::{AppError, AppResult};
use crate::models::{IngredientList, Recipe};

/// Lazily compiled validator for one shape
type ValidatorCell = OnceLock<Result<Validator, String>>;

/// A typed value that model output is validated against
pub trait Shape: Sized + Send + 'static {
    /// Shape name used in violation reports
    const NAME: &'static str;

    /// JSON Schema describing the shape, `None` for free text
    fn json_schema() -> Option<Value>;

    /// Validator compiled from [`Shape::json_schema`], `None` for free text
    ///
    /// # Errors
    ///
    /// Returns an internal error if the shape's own schema does not compile
    fn validator() -> AppResult<Option<&'static Validator>>;

    /// Build the typed value from JSON that already passed the schema
    ///
    /// # Errors
    ///
    /// Returns `SCHEMA_VIOLATION` if the value cannot be decoded
    fn from_validated(value: Value) -> AppResult<Self>;

    /// Validate a decoded JSON value
    ///
    /// # Errors
    ///
    /// Returns `SCHEMA_VIOLATION` listing every mismatch
    fn validate(value: Value) -> AppResult<Self> {
        if let Some(validator) = Self::validator()? {
            check(Self::NAME, validator, &value)?;
        }
        Self::from_validated(value)
    }

    /// Validate raw model text
    ///
    /// JSON shapes tolerate a Markdown code fence around the payload.
    ///
    /// # Errors
    ///
    /// Returns `SCHEMA_VIOLATION` if the text is not JSON or does not match
    fn from_model_text(text: &str) -> AppResult<Self> {
        let payload = strip_code_fence(text);
        let value: Value = serde_json::from_str(payload).map_err(|e| {
            AppError::schema_violation(Self::NAME, vec![format!("output is not valid JSON: {e}")])
        })?;
        Self::validate(value)
    }
}

/// Remove a surrounding ```` ```json ```` fence if present
///
/// The language tag is dropped whether or not a newline follows it.
#[must_use]
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+'))
        .trim()
}

/// Compile `S`'s schema on first use
fn compiled<S: Shape>(cell: &'static ValidatorCell) -> AppResult<&'static Validator> {
    cell.get_or_init(|| {
        let schema = S::json_schema().ok_or_else(|| format!("{} declares no schema", S::NAME))?;
        jsonschema::validator_for(&schema).map_err(|e| e.to_string())
    })
    .as_ref()
    .map_err(|e| AppError::internal(format!("Invalid {} schema: {e}", S::NAME)))
}

/// Collect every schema error for `value`
fn check(shape: &str, validator: &Validator, value: &Value) -> AppResult<()> {
    let violations: Vec<String> = validator
        .iter_errors(value)
        .map(|error| {
            let path = error.instance_path.to_string();
            if path.is_empty() {
                error.to_string()
            } else {
                format!("{path}: {error}")
            }
        })
        .collect();

    if violations.is_empty() {
        Ok(())
    } else {
        Err(AppError::schema_violation(shape, violations))
    }
}

fn decode<T: DeserializeOwned>(shape: &str, value: Value) -> AppResult<T> {
    serde_json::from_value(value).map_err(|e| AppError::schema_violation(shape, vec![e.to_string()]))
}

/// Non-blank string
fn text_schema(description: &str) -> Value {
    json!({
        "type": "string",
        "description": description,
        "minLength": 1,
        "pattern": "\\S"
    })
}

// ============================================================================
// Shapes
// ============================================================================

#[derive(Deserialize)]
struct IngredientsPayload {
    ingredients: Vec<String>,
}

/// `{"ingredients": [...]}`; an empty array is valid here and rejected by the
/// identify flow as an empty result
impl Shape for IngredientList {
    const NAME: &'static str = "IngredientList";

    fn json_schema() -> Option<Value> {
        Some(json!({
            "type": "object",
            "properties": {
                "ingredients": {
                    "type": "array",
                    "description": "Names of the food items visible in the photo.",
                    "items": text_schema("One food item.")
                }
            },
            "required": ["ingredients"]
        }))
    }

    fn validator() -> AppResult<Option<&'static Validator>> {
        static VALIDATOR: ValidatorCell = OnceLock::new();
        compiled::<Self>(&VALIDATOR).map(Some)
    }

    fn from_validated(value: Value) -> AppResult<Self> {
        let payload: IngredientsPayload = decode(Self::NAME, value)?;
        Ok(Self::from_names(payload.ingredients))
    }
}

impl Shape for Recipe {
    const NAME: &'static str = "Recipe";

    fn json_schema() -> Option<Value> {
        Some(json!({
            "type": "object",
            "properties": {
                "name": text_schema("The name of the recipe."),
                "ingredients": text_schema("The ingredients required for the recipe."),
                "instructions": text_schema("The step-by-step instructions for the recipe."),
                "youtubeSearchQuery": text_schema("A YouTube search query to find a video of the recipe.")
            },
            "required": ["name", "ingredients", "instructions", "youtubeSearchQuery"]
        }))
    }

    fn validator() -> AppResult<Option<&'static Validator>> {
        static VALIDATOR: ValidatorCell = OnceLock::new();
        compiled::<Self>(&VALIDATOR).map(Some)
    }

    fn from_validated(value: Value) -> AppResult<Self> {
        decode(Self::NAME, value)
    }
}

/// Plain text reply, returned verbatim
impl Shape for String {
    const NAME: &'static str = "Text";

    fn json_schema() -> Option<Value> {
        None
    }

    fn validator() -> AppResult<Option<&'static Validator>> {
        Ok(None)
    }

    fn from_validated(value: Value) -> AppResult<Self> {
        match value {
            Value::String(text) => Self::from_model_text(&text),
            _ => Err(AppError::schema_violation(
                Self::NAME,
                vec!["expected a string reply".to_owned()],
            )),
        }
    }

    fn from_model_text(text: &str) -> AppResult<Self> {
        if text.trim().is_empty() {
            return Err(AppError::schema_violation(
                Self::NAME,
                vec!["reply is empty".to_owned()],
            ));
        }
        Ok(text.to_owned())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```\n[1]\n```\n"), "[1]");
        assert_eq!(strip_code_fence("  {\"a\":1} "), "{\"a\":1}");
    }

    #[test]
    fn test_strip_single_line_fence_with_language_tag() {
        assert_eq!(strip_code_fence("```json{\"a\":1}```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```json {\"a\":1} ```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```[1]```"), "[1]");
    }

    #[test]
    fn test_shape_schemas_compile() {
        assert!(IngredientList::validator().unwrap().is_some());
        assert!(Recipe::validator().unwrap().is_some());
        assert!(String::validator().unwrap().is_none());
    }
}
