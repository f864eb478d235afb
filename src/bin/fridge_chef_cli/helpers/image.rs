// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FridgeChef Contributors
// ABOUTME: Image loading for the fridge-chef CLI
// ABOUTME: Reads a photo from disk and detects its MIME type from content, then file name

use std::path::Path;

use fridge_chef::errors::{AppError, AppResult};
use fridge_chef::models::ImageData;

/// Detect the MIME type of a file
///
/// Magic bytes win over the extension, so renamed or extensionless photos are
/// still recognized.
pub fn detect_mime(path: &Path, bytes: &[u8]) -> Option<String> {
    infer::get(bytes)
        .map(|kind| kind.mime_type().to_owned())
        .or_else(|| mime_guess::from_path(path).first_raw().map(str::to_owned))
}

/// Read `path` into an [`ImageData`]
///
/// An explicit `mime` skips detection. Anything that is not `image/*` is
/// rejected before a model call is made.
pub async fn load_image(path: &Path, mime: Option<&str>) -> AppResult<ImageData> {
    let bytes = tokio::fs::read(path).await.map_err(|e| {
        AppError::invalid_input(format!("Cannot read {}: {e}", path.display())).with_source(e)
    })?;
    let mime_type = match mime {
        Some(mime) => mime.to_owned(),
        None => detect_mime(path, &bytes).ok_or_else(|| {
            AppError::invalid_input(format!(
                "Cannot detect the image type of {}; pass --mime",
                path.display()
            ))
        })?,
    };

    let image = ImageData::from_bytes(mime_type, &bytes);
    if !image.is_image() {
        return Err(AppError::unsupported_media_type(&image.mime_type));
    }
    Ok(image)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Write;

    use fridge_chef::errors::ErrorCode;

    use super::*;

    const JPEG_HEADER: [u8; 12] = [
        0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00, 0x01,
    ];

    fn write_temp(suffix: &str, bytes: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(bytes).unwrap();
        file
    }

    #[test]
    fn test_content_wins_over_extension() {
        assert_eq!(
            detect_mime(Path::new("fridge.JPG.bak"), &JPEG_HEADER).as_deref(),
            Some("image/jpeg")
        );
        assert_eq!(
            detect_mime(Path::new("photo"), &JPEG_HEADER).as_deref(),
            Some("image/jpeg")
        );
    }

    #[test]
    fn test_extension_used_when_content_is_unknown() {
        assert_eq!(
            detect_mime(Path::new("shelf.PNG"), b"not really").as_deref(),
            Some("image/png")
        );
        assert_eq!(detect_mime(Path::new("shelf"), b"not really"), None);
    }

    #[tokio::test]
    async fn test_load_extensionless_jpeg() {
        let file = write_temp("", &JPEG_HEADER);
        let image = load_image(file.path(), None).await.unwrap();
        assert_eq!(image.mime_type, "image/jpeg");
    }

    #[tokio::test]
    async fn test_load_rejects_non_image() {
        let file = write_temp(".txt", b"shopping list: eggs, milk");
        let error = load_image(file.path(), None).await.unwrap_err();
        assert_eq!(error.code, ErrorCode::UnsupportedMediaType);
    }

    #[tokio::test]
    async fn test_explicit_mime_is_checked() {
        let file = write_temp(".jpg", &JPEG_HEADER);
        let error = load_image(file.path(), Some("application/pdf"))
            .await
            .unwrap_err();
        assert_eq!(error.code, ErrorCode::UnsupportedMediaType);
    }
}
