use image::imageops::FilterType;

/// Side length of the square the image is resampled to before sampling.
pub const SAMPLE_SIZE: u32 = 100;

/// Only every Nth pixel of the sample is inspected.
pub const PIXEL_STRIDE: usize = 4;

/// Largest channel spread still counted as gray.
pub const CHANNEL_SPREAD_THRESHOLD: i16 = 30;

/// Returns `true` for a color image and `false` for a monochrome one.
///
/// Undecodable input is reported as color so an upload is never blocked by
/// classification.
pub fn is_color_image(bytes: &[u8]) -> bool {
    let img = match image::load_from_memory(bytes) {
        Ok(img) => img,
        Err(e) => {
            tracing::debug!(error = %e, "Color classification fell back to color");
            return true;
        }
    };

    let sample = img
        .resize_exact(SAMPLE_SIZE, SAMPLE_SIZE, FilterType::Triangle)
        .to_rgb8();

    sample
        .pixels()
        .step_by(PIXEL_STRIDE)
        .any(|px| channel_spread(px.0) > CHANNEL_SPREAD_THRESHOLD)
}

fn channel_spread([r, g, b]: [u8; 3]) -> i16 {
    let (r, g, b) = (r as i16, g as i16, b as i16);
    (r - g).abs().max((g - b).abs()).max((r - b).abs())
}
