//! Tag extraction orchestration: resolve image → crop with debug copy →
//! vision request → strict parse → fallback policies.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use pricelens_core::{AnalyzeRequest, Pricetag, VisionProvider, VisionRequest};
use pricelens_imaging::CropExtractor;

use crate::parse;
use crate::prompt;

/// Failure categories the boundary reports in `what_was_read`. The
/// underlying errors are logged, never surfaced to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FailureStage {
    Crop,
    Vision,
}

impl FailureStage {
    fn marker(self) -> &'static str {
        match self {
            FailureStage::Crop => "fallback: crop_failed",
            FailureStage::Vision => "fallback: vision_request_failed",
        }
    }
}

struct ExtractFailure {
    stage: FailureStage,
    /// Present when a debug crop landed on disk before the failure, so the
    /// degraded result stays traceable to its visual input.
    crop_marker: Option<String>,
    error: anyhow::Error,
}

/// Extraction pipeline with injected collaborators: the crop extractor and
/// a vision provider. One instance serves all requests; every call is
/// stateless and leaves only a debug-crop file behind.
pub struct TagExtractor {
    images_dir: PathBuf,
    cropper: CropExtractor,
    provider: Arc<dyn VisionProvider>,
    model: String,
}

impl TagExtractor {
    pub fn new(
        images_dir: impl Into<PathBuf>,
        cropper: CropExtractor,
        provider: Arc<dyn VisionProvider>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            images_dir: images_dir.into(),
            cropper,
            provider,
            model: model.into(),
        }
    }

    /// Total at the boundary: every pipeline failure degrades to a valid
    /// `Pricetag` carrying a fallback marker instead of an error. A single
    /// best-effort attempt; no retries.
    pub async fn analyze(&self, request: &AnalyzeRequest) -> Pricetag {
        match self.extract(request).await {
            Ok(tag) => tag,
            Err(failure) => {
                warn!(
                    image = %request.image,
                    box_id = request.box_id,
                    stage = ?failure.stage,
                    error = %failure.error,
                    "tag extraction degraded to fallback"
                );
                let mut trail = Vec::new();
                if let Some(marker) = failure.crop_marker {
                    trail.push(marker);
                }
                trail.push(failure.stage.marker().to_string());
                Pricetag::unread(request.box_id, trail)
            }
        }
    }

    async fn extract(&self, request: &AnalyzeRequest) -> Result<Pricetag, ExtractFailure> {
        let image_path = self.images_dir.join(&request.image);

        // save=true on every call: the persisted crop lets a human audit
        // exactly what the model saw, whatever the parse outcome.
        let crop = self
            .cropper
            .crop(&image_path, request.bbox, request.box_id, true)
            .map_err(|e| ExtractFailure {
                stage: FailureStage::Crop,
                crop_marker: None,
                error: e.into(),
            })?;
        let crop_marker = crop.saved_path.as_deref().map(debug_crop_marker);

        let vision_request = VisionRequest {
            model: self.model.clone(),
            system_prompt: prompt::SYSTEM_PROMPT.to_string(),
            user_prompt: prompt::USER_PROMPT.to_string(),
            image_base64: crop.png_base64,
            mime_type: "image/png".to_string(),
            temperature: 0.0,
        };

        let reply = self
            .provider
            .read_image(&vision_request)
            .await
            .map_err(|error| ExtractFailure {
                stage: FailureStage::Vision,
                crop_marker: crop_marker.clone(),
                error,
            })?;

        info!(
            provider = %reply.provider,
            model = %reply.model,
            latency_ms = reply.latency_ms,
            "vision reply received"
        );

        let raw = parse::normalize_reply(&reply.content);
        let mut tag = match parse::parse_reply(raw) {
            Some(fields) => Pricetag {
                box_id: request.box_id,
                product_name: fields.product_name,
                main_price: fields.main_price,
                discount_price: fields.discount_price,
                discount_type: fields.discount_type,
                time_discount: fields.time_discount,
                what_was_read: fields.what_was_read,
            },
            // Unparsable output is preserved verbatim for human triage.
            None => Pricetag::unread(request.box_id, vec![raw.to_string()]),
        };

        if let Some(marker) = crop_marker {
            tag.what_was_read.insert(0, marker);
        }
        Ok(tag)
    }
}

fn debug_crop_marker(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();
    format!("debug_crop: /static/crops/{name}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;
    use image::{ImageBuffer, Rgb};
    use pricelens_core::{DiscountType, NormalizedBox, PriceValue, VisionResponse};
    use tempfile::{tempdir, TempDir};

    /// Fake capability: either replies with a fixed text or fails.
    struct ScriptedProvider {
        reply: std::result::Result<String, String>,
    }

    #[async_trait]
    impl VisionProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn read_image(&self, request: &VisionRequest) -> Result<VisionResponse> {
            match &self.reply {
                Ok(content) => Ok(VisionResponse {
                    content: content.clone(),
                    provider: "scripted".to_string(),
                    model: request.model.clone(),
                    latency_ms: 1,
                }),
                Err(message) => anyhow::bail!("{message}"),
            }
        }
    }

    fn extractor_fixture(reply: std::result::Result<&str, &str>) -> (TempDir, TagExtractor) {
        let dir = tempdir().unwrap();
        let images_dir = dir.path().join("images");
        std::fs::create_dir_all(&images_dir).unwrap();
        let img = ImageBuffer::from_fn(400, 300, |x, _| Rgb([(x % 255) as u8, 64, 200]));
        img.save(images_dir.join("tag01.jpg")).unwrap();

        let cropper = CropExtractor::new(dir.path().join("crops")).unwrap();
        let provider = Arc::new(ScriptedProvider {
            reply: reply.map(str::to_owned).map_err(str::to_owned),
        });
        let extractor = TagExtractor::new(images_dir, cropper, provider, "gpt-4o-mini");
        (dir, extractor)
    }

    fn request() -> AnalyzeRequest {
        AnalyzeRequest {
            image: "tag01.jpg".to_string(),
            bbox: NormalizedBox::new(0.5, 0.5, 0.2, 0.3),
            box_id: 2,
        }
    }

    #[tokio::test]
    async fn structured_reply_produces_typed_fields() {
        let (_dir, extractor) = extractor_fixture(Ok(concat!(
            "```json\n",
            r#"{"product_name":"Coca Cola 330ml","main_price":195400,"discount_price":"180.000đ","#,
            r#""discount_type":"price_drop","what_was_read":["195.400đ","180.000đ"]}"#,
            "\n```"
        )));

        let tag = extractor.analyze(&request()).await;
        assert_eq!(tag.box_id, 2);
        assert_eq!(tag.product_name.as_deref(), Some("Coca Cola 330ml"));
        assert_eq!(tag.main_price, Some(PriceValue::Number(195400.0)));
        assert_eq!(
            tag.discount_price,
            Some(PriceValue::Text("180.000đ".into()))
        );
        assert_eq!(tag.discount_type, Some(DiscountType::PriceDrop));
        assert_eq!(
            tag.what_was_read,
            vec![
                "debug_crop: /static/crops/tag01_box2.png",
                "195.400đ",
                "180.000đ"
            ]
        );
    }

    #[tokio::test]
    async fn unparsable_reply_falls_back_to_raw_text() {
        let (dir, extractor) = extractor_fixture(Ok("not json at all"));

        let tag = extractor.analyze(&request()).await;
        assert!(tag.main_price.is_none());
        assert!(tag.product_name.is_none());
        assert!(tag.discount_type.is_none());
        assert_eq!(
            tag.what_was_read,
            vec!["debug_crop: /static/crops/tag01_box2.png", "not json at all"]
        );
        // the debug artifact really landed on disk
        assert!(dir.path().join("crops/tag01_box2.png").exists());
    }

    #[tokio::test]
    async fn provider_failure_degrades_instead_of_propagating() {
        let (_dir, extractor) = extractor_fixture(Err("connection refused"));

        let tag = extractor.analyze(&request()).await;
        assert_eq!(tag.box_id, 2);
        assert!(tag.main_price.is_none());
        assert_eq!(
            tag.what_was_read,
            vec![
                "debug_crop: /static/crops/tag01_box2.png",
                "fallback: vision_request_failed"
            ]
        );
    }

    #[tokio::test]
    async fn missing_image_reports_crop_failure_without_a_crop_marker() {
        let (_dir, extractor) = extractor_fixture(Ok("{}"));

        let mut req = request();
        req.image = "absent.jpg".to_string();
        let tag = extractor.analyze(&req).await;
        assert_eq!(tag.box_id, 2);
        assert_eq!(tag.what_was_read, vec!["fallback: crop_failed"]);
    }

    #[tokio::test]
    async fn empty_reply_schema_yields_all_null_fields_with_marker() {
        let (_dir, extractor) = extractor_fixture(Ok("{}"));

        let tag = extractor.analyze(&request()).await;
        assert!(tag.main_price.is_none());
        assert!(tag.time_discount.is_none());
        assert_eq!(
            tag.what_was_read,
            vec!["debug_crop: /static/crops/tag01_box2.png"]
        );
    }
}
