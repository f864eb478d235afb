// ABOUTME: Ingredient list and embedded image models
// ABOUTME: Normalizes detected ingredient names and validates data-URI image payloads
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FridgeChef Contributors

use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};

use crate::errors::{AppError, AppResult};

/// MIME prefix every accepted image must carry
const IMAGE_MIME_PREFIX: &str = "image/";

/// Ordered list of normalized ingredient names
///
/// Names are lower-cased and trimmed, blanks are dropped and duplicates are
/// removed keeping the first occurrence. Order is display order only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IngredientList(Vec<String>);

impl IngredientList {
    /// Build a normalized list from raw names
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalized: Vec<String> = Vec::new();
        for name in names {
            let name = name.as_ref().trim().to_lowercase();
            if name.is_empty() || normalized.contains(&name) {
                continue;
            }
            normalized.push(name);
        }
        Self(normalized)
    }

    /// Parse a comma-separated list such as `"eggs, milk, flour"`
    #[must_use]
    pub fn from_csv(csv: &str) -> Self {
        Self::from_names(csv.split(','))
    }

    /// Ingredient names in display order
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Number of ingredients
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the list holds no ingredients
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the names
    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    /// Comma-joined form used as the recipe prompt input
    #[must_use]
    pub fn to_csv(&self) -> String {
        self.0.join(", ")
    }

    /// One ingredient per line, the content of a downloaded `ingredients.txt`
    #[must_use]
    pub fn to_text_export(&self) -> String {
        self.0.join("\n")
    }

    /// Text used when sharing the list with someone else
    #[must_use]
    pub fn share_text(&self) -> String {
        format!("Check out the ingredients I have: {}", self.to_csv())
    }

    /// Consume the list
    #[must_use]
    pub fn into_inner(self) -> Vec<String> {
        self.0
    }
}

impl fmt::Display for IngredientList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_csv())
    }
}

impl<'a> IntoIterator for &'a IngredientList {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// An image embedded as MIME type plus base64 payload
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageData {
    /// MIME type, e.g. `image/jpeg`
    pub mime_type: String,
    /// Standard base64 payload without the `data:` prefix
    pub base64_payload: String,
}

impl ImageData {
    /// Create from parts without validating
    #[must_use]
    pub fn new(mime_type: impl Into<String>, base64_payload: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            base64_payload: base64_payload.into(),
        }
    }

    /// Encode raw bytes
    #[must_use]
    pub fn from_bytes(mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self::new(mime_type, STANDARD.encode(bytes))
    }

    /// Parse a `data:<mime>;base64,<payload>` URI
    ///
    /// # Errors
    ///
    /// Returns `INVALID_INPUT` if the string is not a base64 data URI
    pub fn from_data_uri(uri: &str) -> AppResult<Self> {
        let rest = uri
            .strip_prefix("data:")
            .ok_or_else(|| AppError::invalid_input("Image is not a data URI"))?;
        let (mime_type, payload) = rest
            .split_once(";base64,")
            .ok_or_else(|| AppError::invalid_input("Data URI is not base64 encoded"))?;
        Ok(Self::new(mime_type, payload))
    }

    /// Render as a `data:` URI
    #[must_use]
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.base64_payload)
    }

    /// Whether the MIME type names an image
    #[must_use]
    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with(IMAGE_MIME_PREFIX)
    }

    /// Check MIME type and payload before the image is sent anywhere
    ///
    /// # Errors
    ///
    /// Returns `UNSUPPORTED_MEDIA_TYPE` for non-image MIME types and
    /// `INVALID_INPUT` for an empty or non-base64 payload
    pub fn validate(&self) -> AppResult<()> {
        if !self.is_image() {
            return Err(AppError::unsupported_media_type(&self.mime_type));
        }
        if self.base64_payload.trim().is_empty() {
            return Err(AppError::invalid_input("Image payload is empty"));
        }
        STANDARD.decode(self.base64_payload.trim()).map_err(|e| {
            AppError::invalid_input("Image payload is not valid base64").with_source(e)
        })?;
        Ok(())
    }
}

impl fmt::Debug for ImageData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageData")
            .field("mime_type", &self.mime_type)
            .field("payload_len", &self.base64_payload.len())
            .finish()
    }
}
