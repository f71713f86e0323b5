use serde::{Deserialize, Serialize};

/// YOLO-convention bounding box: center coordinates and extents as fractions
/// of the image dimensions. Values are expected in `[0,1]` but not enforced;
/// out-of-range boxes are clamped downstream.
///
/// Serialized as a 4-element array `[cx, cy, w, h]`, matching the label-file
/// column order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct NormalizedBox {
    pub cx: f64,
    pub cy: f64,
    pub w: f64,
    pub h: f64,
}

impl NormalizedBox {
    pub fn new(cx: f64, cy: f64, w: f64, h: f64) -> Self {
        Self { cx, cy, w, h }
    }
}

impl From<[f64; 4]> for NormalizedBox {
    fn from([cx, cy, w, h]: [f64; 4]) -> Self {
        Self { cx, cy, w, h }
    }
}

impl From<NormalizedBox> for [f64; 4] {
    fn from(b: NormalizedBox) -> Self {
        [b.cx, b.cy, b.w, b.h]
    }
}

/// Axis-aligned pixel rectangle: top-left corner plus extent.
///
/// Only the geometry converter constructs these, and it guarantees
/// `x < W`, `y < H`, `x + w <= W`, `y + h <= H` for the source image.
/// Zero-width or zero-height boxes are valid (degenerate crops).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelBox {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

/// One identified detection from a label file. `id` is the zero-based row
/// index and is stable only within a single read of that file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledBox {
    pub id: usize,
    #[serde(rename = "box")]
    pub bbox: NormalizedBox,
    pub label: String,
}

/// Body of the analyze endpoint. `box_id` is an opaque echo value used for
/// debug-file naming and result correlation; it is not validated against any
/// label file.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeRequest {
    pub image: String,
    #[serde(rename = "box")]
    pub bbox: NormalizedBox,
    #[serde(default)]
    pub box_id: i64,
}

/// Optional time window attached to a time-limited discount.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeDiscount {
    pub time_start: Option<String>,
    pub time_end: Option<String>,
}

/// The three retail-discount presentation patterns the model classifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    /// Two prices shown for one product (old price struck through).
    PriceDrop,
    /// A percentage markdown is printed on the tag.
    PercentOff,
    /// Gift or bundle wording ("buy 2 get 1", free item attached).
    BuyXGetY,
}

/// A price as the model reports it: either a bare number (`195400`) or the
/// formatted text printed on the tag (`"195.400đ"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PriceValue {
    Number(f64),
    Text(String),
}

/// Result of one tag analysis. Every optional field uses `None` to mean
/// "not read from the tag", never zero or empty. `what_was_read` is the
/// append-only evidence trail and is always present, with a debug-crop
/// reference prepended when a crop was persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pricetag {
    pub box_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_price: Option<PriceValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_price: Option<PriceValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_type: Option<DiscountType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_discount: Option<TimeDiscount>,
    #[serde(default)]
    pub what_was_read: Vec<String>,
}

impl Pricetag {
    /// A result with no structured fields read, carrying only the evidence
    /// trail. Used for parse fallbacks and capability failures.
    pub fn unread(box_id: i64, what_was_read: Vec<String>) -> Self {
        Self {
            box_id,
            product_name: None,
            main_price: None,
            discount_price: None,
            discount_type: None,
            time_discount: None,
            what_was_read,
        }
    }
}
