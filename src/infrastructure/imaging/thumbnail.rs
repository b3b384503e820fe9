use std::io::Cursor;

use image::{codecs::jpeg::JpegEncoder, imageops::FilterType, DynamicImage};

#[derive(Debug, Clone)]
pub struct Thumbnail {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
    /// `false` when the original bytes are passed through undecoded.
    pub derived: bool,
}

/// Fits the image within `max_dimension` on both sides (never upscaling) and
/// re-encodes it as JPEG. Undecodable input is returned as-is.
pub fn make_thumbnail(bytes: &[u8], original_content_type: &str, max_dimension: u32, quality: u8) -> Thumbnail {
    match render_thumbnail(bytes, max_dimension, quality) {
        Ok(encoded) => Thumbnail {
            bytes: encoded,
            content_type: "image/jpeg",
            derived: true,
        },
        Err(e) => {
            tracing::warn!(error = %e, "Thumbnail generation failed, storing original bytes");
            Thumbnail {
                bytes: bytes.to_vec(),
                content_type: passthrough_content_type(original_content_type),
                derived: false,
            }
        }
    }
}

fn render_thumbnail(bytes: &[u8], max_dimension: u32, quality: u8) -> image::ImageResult<Vec<u8>> {
    let img = image::load_from_memory(bytes)?;

    let fitted = if img.width() > max_dimension || img.height() > max_dimension {
        img.resize(max_dimension, max_dimension, FilterType::Lanczos3)
    } else {
        img
    };

    // JPEG has no alpha channel
    let rgb = DynamicImage::ImageRgb8(fitted.to_rgb8());

    let mut out = Cursor::new(Vec::new());
    rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut out, quality))?;
    Ok(out.into_inner())
}

fn passthrough_content_type(declared: &str) -> &'static str {
    match declared {
        "image/png" => "image/png",
        "image/webp" => "image/webp",
        _ => "image/jpeg",
    }
}
