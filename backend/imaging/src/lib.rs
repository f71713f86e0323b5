pub mod crop;
pub mod geometry;

pub use crop::{CropError, CropExtractor, CropOutput};
pub use geometry::to_pixel_box;
