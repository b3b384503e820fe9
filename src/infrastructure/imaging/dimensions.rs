use std::io::Cursor;

use image::ImageReader;

/// Reported for images whose header cannot be read.
pub const FALLBACK_DIMENSIONS: Dimensions = Dimensions { width: 1920, height: 1080 };

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Reads width and height from the image header without decoding pixels.
pub fn image_dimensions(bytes: &[u8]) -> Option<Dimensions> {
    let reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format().ok()?;
    let (width, height) = reader.into_dimensions().ok()?;
    Some(Dimensions { width, height })
}

/// Header dimensions, or the 1920×1080 placeholder when they cannot be read.
pub fn dimensions_or_fallback(bytes: &[u8]) -> Dimensions {
    image_dimensions(bytes).unwrap_or_else(|| {
        tracing::warn!("Could not read image dimensions, storing placeholder 1920x1080");
        FALLBACK_DIMENSIONS
    })
}
