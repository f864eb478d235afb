// ABOUTME: Recipe model produced one at a time by the recipe stream
// ABOUTME: Flat record of four strings plus helpers for steps and video search links
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FridgeChef Contributors

use serde::{Deserialize, Serialize};
use url::form_urlencoded;

/// A single recipe suggestion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    /// Recipe title
    pub name: String,
    /// Ingredients used, as free text
    pub ingredients: String,
    /// Newline-delimited cooking steps
    pub instructions: String,
    /// Query for a video walkthrough of the recipe
    pub youtube_search_query: String,
}

impl Recipe {
    /// Non-blank instruction lines, trimmed
    pub fn instruction_steps(&self) -> impl Iterator<Item = &str> {
        self.instructions
            .split('\n')
            .map(str::trim)
            .filter(|step| !step.is_empty())
    }

    /// Link to the video search results page
    #[must_use]
    pub fn youtube_search_url(&self) -> String {
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("search_query", &self.youtube_search_query)
            .finish();
        format!("https://www.youtube.com/results?{query}")
    }

    /// Embeddable player URL that plays the first search hit
    #[must_use]
    pub fn youtube_embed_url(&self) -> String {
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("listType", "search")
            .append_pair("list", &self.youtube_search_query)
            .finish();
        format!("https://www.youtube.com/embed?{query}")
    }
}
