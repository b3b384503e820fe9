//! CPU-bound image work. Callers run these on the blocking pool.

pub mod classifier;
pub mod dimensions;
pub mod exif_data;
pub mod thumbnail;

pub use classifier::is_color_image;
pub use dimensions::{dimensions_or_fallback, Dimensions};
pub use exif_data::extract_exif;
pub use thumbnail::{make_thumbnail, Thumbnail};
