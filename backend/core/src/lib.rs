pub mod error;
pub mod types;
pub mod vision;

pub use error::PricelensError;
pub use types::{
    AnalyzeRequest, DiscountType, LabeledBox, NormalizedBox, PixelBox, PriceValue, Pricetag,
    TimeDiscount,
};
pub use vision::{VisionProvider, VisionRequest, VisionResponse};
