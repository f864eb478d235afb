// ABOUTME: Tests for validating model output against the declared result shapes
// ABOUTME: Covers ingredient lists, recipes, plain replies, code fences and violation reports
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FridgeChef Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use fridge_chef::errors::ErrorCode;
use fridge_chef::models::{IngredientList, Recipe};
use fridge_chef::validation::Shape;
use serde_json::json;

fn violations(error: &fridge_chef::errors::AppError) -> Vec<String> {
    serde_json::from_value(error.details["violations"].clone()).unwrap()
}

// ============================================================================
// IngredientList
// ============================================================================

#[test]
fn test_ingredient_list_is_normalized() {
    let list = IngredientList::validate(json!({
        "ingredients": [" Eggs", "milk", "eggs", "Cheddar Cheese"]
    }))
    .unwrap();

    assert_eq!(list.as_slice(), ["eggs", "milk", "cheddar cheese"]);
}

#[test]
fn test_empty_ingredient_list_is_valid() {
    let list = IngredientList::validate(json!({ "ingredients": [] })).unwrap();
    assert!(list.is_empty());
}

#[test]
fn test_ingredient_list_reports_every_bad_item() {
    let error = IngredientList::validate(json!({
        "ingredients": ["eggs", 3, "", null, "  "]
    }))
    .unwrap_err();

    assert_eq!(error.code, ErrorCode::SchemaViolation);
    assert_eq!(error.details["shape"], "IngredientList");
    let violations = violations(&error);
    for path in ["/ingredients/1", "/ingredients/2", "/ingredients/3", "/ingredients/4"] {
        assert!(
            violations.iter().any(|v| v.starts_with(&format!("{path}:"))),
            "no violation for {path}: {violations:?}"
        );
    }
    assert!(!violations.iter().any(|v| v.starts_with("/ingredients/0")));
}

#[test]
fn test_ingredient_list_requires_array() {
    for value in [json!({}), json!({ "ingredients": "eggs" }), json!(["eggs"])] {
        let error = IngredientList::validate(value).unwrap_err();
        assert_eq!(error.code, ErrorCode::SchemaViolation);
    }
}

#[test]
fn test_ingredient_list_from_single_line_fence() {
    let list = IngredientList::from_model_text("```json{\"ingredients\": [\"leek\"]}```").unwrap();
    assert_eq!(list.as_slice(), ["leek"]);
}

#[test]
fn test_ingredient_list_from_fenced_text() {
    let text = "```json\n{\"ingredients\": [\"spinach\"]}\n```";
    let list = IngredientList::from_model_text(text).unwrap();
    assert_eq!(list.as_slice(), ["spinach"]);
}

// ============================================================================
// Recipe
// ============================================================================

#[test]
fn test_recipe_accepts_complete_object() {
    let recipe = Recipe::validate(json!({
        "name": "Spinach Omelette",
        "ingredients": "eggs, spinach",
        "instructions": "Whisk the eggs.\nCook with spinach.",
        "youtubeSearchQuery": "spinach omelette recipe",
        "servings": 2
    }))
    .unwrap();

    assert_eq!(recipe.name, "Spinach Omelette");
    assert_eq!(recipe.youtube_search_query, "spinach omelette recipe");
}

#[test]
fn test_recipe_reports_all_violations() {
    let error = Recipe::validate(json!({
        "name": "",
        "ingredients": ["eggs"],
        "instructions": "Cook."
    }))
    .unwrap_err();

    assert_eq!(error.details["shape"], "Recipe");
    let violations = violations(&error);
    assert!(violations.iter().any(|v| v.starts_with("/name:")));
    assert!(violations.iter().any(|v| v.starts_with("/ingredients:")));
    assert!(violations.iter().any(|v| v.contains("youtubeSearchQuery")));
    assert!(!violations.iter().any(|v| v.starts_with("/instructions")));
}

#[test]
fn test_recipe_rejects_whitespace_only_field() {
    let error = Recipe::validate(json!({
        "name": "Toast",
        "ingredients": "bread",
        "instructions": " \n ",
        "youtubeSearchQuery": "toast"
    }))
    .unwrap_err();

    assert_eq!(error.code, ErrorCode::SchemaViolation);
    assert!(violations(&error).iter().all(|v| v.starts_with("/instructions:")));
}

#[test]
fn test_recipe_validation_follows_declared_schema() {
    let schema = Recipe::json_schema().unwrap();
    let required: Vec<&str> = schema["required"]
        .as_array()
        .unwrap()
        .iter()
        .map(|field| field.as_str().unwrap())
        .collect();

    for field in required {
        let mut value = json!({
            "name": "Toast",
            "ingredients": "bread",
            "instructions": "Toast it.",
            "youtubeSearchQuery": "toast"
        });
        value.as_object_mut().unwrap().remove(field);
        let error = Recipe::validate(value).unwrap_err();
        assert!(
            violations(&error).iter().any(|v| v.contains(field)),
            "missing {field} was not reported"
        );
    }
}

#[test]
fn test_recipe_rejects_non_json_text() {
    let error = Recipe::from_model_text("Here is a great recipe: pancakes!").unwrap_err();

    assert_eq!(error.code, ErrorCode::SchemaViolation);
    assert!(violations(&error)[0].starts_with("output is not valid JSON"));
}

#[test]
fn test_recipe_schema_lists_required_fields() {
    let schema = Recipe::json_schema().unwrap();
    assert_eq!(
        schema["required"],
        json!(["name", "ingredients", "instructions", "youtubeSearchQuery"])
    );
}

// ============================================================================
// Plain text
// ============================================================================

#[test]
fn test_text_reply_is_verbatim() {
    let reply = String::from_model_text("  Use **medium** heat.\n").unwrap();
    assert_eq!(reply, "  Use **medium** heat.\n");
    assert!(String::json_schema().is_none());
}

#[test]
fn test_blank_text_reply_is_rejected() {
    let error = String::from_model_text(" \n ").unwrap_err();
    assert_eq!(error.code, ErrorCode::SchemaViolation);
}
