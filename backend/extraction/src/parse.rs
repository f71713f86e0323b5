//! Defensive normalization and strict parsing of the model's reply.
//!
//! The reply either parses into the full typed schema or it doesn't; no
//! loosely-typed map is threaded through the rest of the pipeline.

use serde::Deserialize;

use pricelens_core::{DiscountType, PriceValue, TimeDiscount};

/// The reply schema the model is instructed to emit. `box_id` is not part of
/// it; the service attaches that from the request. Unknown extra keys are
/// tolerated, wrong field types are not.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReplyFields {
    pub product_name: Option<String>,
    pub main_price: Option<PriceValue>,
    pub discount_price: Option<PriceValue>,
    pub discount_type: Option<DiscountType>,
    pub time_discount: Option<TimeDiscount>,
    #[serde(default)]
    pub what_was_read: Vec<String>,
}

/// Strip the decoration models wrap around JSON: surrounding whitespace,
/// backtick fences, and a leading case-insensitive "json" language tag.
pub fn normalize_reply(text: &str) -> &str {
    let mut t = text.trim().trim_matches('`').trim();
    // get() instead of a direct slice: the reply may start mid-codepoint
    // territory (Vietnamese text), and byte 4 need not be a char boundary.
    if t.get(..4).is_some_and(|p| p.eq_ignore_ascii_case("json")) {
        t = t[4..].trim_start();
    }
    t
}

/// Strict parse of a normalized reply. `None` means the text is not a valid
/// instance of the schema and the caller should fall back to raw-text
/// evidence.
pub fn parse_reply(normalized: &str) -> Option<ReplyFields> {
    serde_json::from_str(normalized).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_fences_and_language_tag() {
        let raw = "```json\n{\"main_price\":195400}\n```";
        let fields = parse_reply(normalize_reply(raw)).unwrap();
        assert_eq!(fields.main_price, Some(PriceValue::Number(195400.0)));
    }

    #[test]
    fn strips_bare_backticks() {
        let raw = "```\n{\"main_price\":\"12.500đ\"}\n```";
        let fields = parse_reply(normalize_reply(raw)).unwrap();
        assert_eq!(fields.main_price, Some(PriceValue::Text("12.500đ".into())));
    }

    #[test]
    fn language_tag_is_case_insensitive() {
        let raw = "```JSON\n{\"discount_type\":\"percent_off\"}\n```";
        let fields = parse_reply(normalize_reply(raw)).unwrap();
        assert_eq!(fields.discount_type, Some(DiscountType::PercentOff));
    }

    #[test]
    fn plain_json_passes_through() {
        let raw = r#"{"product_name":"Nước ngọt 330ml","discount_price":null,
                      "time_discount":{"time_start":"14:00","time_end":"17:00"}}"#;
        let fields = parse_reply(normalize_reply(raw)).unwrap();
        assert_eq!(fields.product_name.as_deref(), Some("Nước ngọt 330ml"));
        let window = fields.time_discount.unwrap();
        assert_eq!(window.time_start.as_deref(), Some("14:00"));
        assert_eq!(window.time_end.as_deref(), Some("17:00"));
    }

    #[test]
    fn non_json_reply_is_a_parse_failure() {
        assert!(parse_reply(normalize_reply("not json at all")).is_none());
    }

    #[test]
    fn wrong_field_type_is_a_parse_failure() {
        assert!(parse_reply(r#"{"main_price":true}"#).is_none());
        assert!(parse_reply(r#"{"discount_type":"half_price"}"#).is_none());
    }

    #[test]
    fn unknown_keys_are_tolerated() {
        let fields = parse_reply(r#"{"main_price":9000,"confidence":0.9}"#).unwrap();
        assert_eq!(fields.main_price, Some(PriceValue::Number(9000.0)));
    }

    #[test]
    fn normalization_leaves_plain_text_unchanged() {
        assert_eq!(normalize_reply("not json at all"), "not json at all");
    }

    #[test]
    fn multibyte_reply_does_not_panic() {
        // byte 4 falls inside 'ắ'
        assert_eq!(normalize_reply("đắt quá"), "đắt quá");
    }
}
