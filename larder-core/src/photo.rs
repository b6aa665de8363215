//! Image validation shared by the server upload handlers and the CLI.

use std::io::Cursor;

use image::{ImageFormat, ImageReader};

/// Formats accepted for fridge and recipe-card photos.
pub const ALLOWED_FORMATS: &[ImageFormat] = &[
    ImageFormat::Jpeg,
    ImageFormat::Png,
    ImageFormat::Gif,
    ImageFormat::WebP,
];

/// Maximum accepted upload size (10MB).
pub const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

/// True when a declared content type names an image kind (`image/*`).
pub fn is_image_content_type(content_type: &str) -> bool {
    content_type
        .trim()
        .to_ascii_lowercase()
        .strip_prefix("image/")
        .is_some_and(|subtype| !subtype.is_empty())
}

/// Sniff the format from the bytes and check it is allowed.
///
/// Returns the detected content type (e.g. "image/jpeg").
pub fn validate_image(data: &[u8]) -> Result<String, String> {
    if data.len() > MAX_FILE_SIZE {
        return Err(format!(
            "Image too large: {} bytes (max {})",
            data.len(),
            MAX_FILE_SIZE
        ));
    }

    let reader = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| format!("Failed to read image: {}", e))?;

    let format = reader
        .format()
        .ok_or_else(|| "Could not detect image format".to_string())?;

    if !ALLOWED_FORMATS.contains(&format) {
        return Err(format!(
            "Unsupported image format: {:?}. Allowed: JPEG, PNG, GIF, WebP",
            format
        ));
    }

    Ok(format.to_mime_type().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_content_types() {
        assert!(is_image_content_type("image/jpeg"));
        assert!(is_image_content_type("IMAGE/PNG"));
        assert!(!is_image_content_type("image/"));
        assert!(!is_image_content_type("application/pdf"));
        assert!(!is_image_content_type("text/plain"));
    }

    #[test]
    fn test_png_signature_is_detected() {
        let png_header = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
        assert_eq!(validate_image(&png_header).unwrap(), "image/png");
    }

    #[test]
    fn test_validate_invalid_format() {
        assert!(validate_image(b"not an image").is_err());
    }
}
