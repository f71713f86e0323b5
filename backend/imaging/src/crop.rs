//! Pixel-crop extraction: decode a source image, cut out a normalized box,
//! and produce a transport-ready base64 PNG plus an optional on-disk debug
//! copy.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD, Engine};
use image::{DynamicImage, GenericImageView, ImageFormat};
use thiserror::Error;
use tracing::debug;

use pricelens_core::{NormalizedBox, PixelBox};

use crate::geometry::to_pixel_box;

#[derive(Debug, Error)]
pub enum CropError {
    #[error("source image not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to decode image {path}: {source}")]
    Decode {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("failed to encode crop as PNG: {0}")]
    Encode(#[source] image::ImageError),

    #[error("failed to write debug crop {path}: {source}")]
    Save {
        path: PathBuf,
        source: image::ImageError,
    },
}

/// One extracted crop. `png_base64` is always populated; `saved_path` only
/// when the caller asked for a debug copy.
#[derive(Debug)]
pub struct CropOutput {
    pub image: DynamicImage,
    pub pixel_box: PixelBox,
    pub png_base64: String,
    pub saved_path: Option<PathBuf>,
}

/// Cuts normalized boxes out of stored images. Holds the debug-crop
/// directory, which is created eagerly at construction (idempotent).
pub struct CropExtractor {
    crops_dir: PathBuf,
}

impl CropExtractor {
    pub fn new(crops_dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let crops_dir = crops_dir.into();
        std::fs::create_dir_all(&crops_dir)?;
        Ok(Self { crops_dir })
    }

    pub fn crops_dir(&self) -> &Path {
        &self.crops_dir
    }

    /// Decode `image_path`, crop the given box, and PNG/base64-encode the
    /// result. With `save`, also persist `{stem}_box{box_id}.png` into the
    /// crops directory; concurrent writers to the same name race and the
    /// last one wins.
    pub fn crop(
        &self,
        image_path: &Path,
        bbox: NormalizedBox,
        box_id: i64,
        save: bool,
    ) -> Result<CropOutput, CropError> {
        let source = image::open(image_path).map_err(|e| match e {
            image::ImageError::IoError(ref io) if io.kind() == std::io::ErrorKind::NotFound => {
                CropError::NotFound(image_path.to_path_buf())
            }
            other => CropError::Decode {
                path: image_path.to_path_buf(),
                source: other,
            },
        })?;

        let (width, height) = source.dimensions();
        let pixel_box = to_pixel_box(bbox, width, height);

        let crop = if pixel_box.w == 0 || pixel_box.h == 0 {
            // PNG has no zero-dimension encoding; a degenerate box yields a
            // blank minimal image instead of an error.
            DynamicImage::new_rgba8(pixel_box.w.max(1), pixel_box.h.max(1))
        } else {
            normalize_for_png(source.crop_imm(pixel_box.x, pixel_box.y, pixel_box.w, pixel_box.h))
        };

        let saved_path = if save {
            let stem = image_path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("crop");
            let path = self.crops_dir.join(format!("{stem}_box{box_id}.png"));
            crop.save_with_format(&path, ImageFormat::Png)
                .map_err(|source| CropError::Save {
                    path: path.clone(),
                    source,
                })?;
            debug!(path = %path.display(), "saved debug crop");
            Some(path)
        } else {
            None
        };

        let mut buf = Vec::new();
        crop.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .map_err(CropError::Encode)?;

        Ok(CropOutput {
            image: crop,
            pixel_box,
            png_base64: STANDARD.encode(&buf),
            saved_path,
        })
    }
}

/// Float-sample buffers have no PNG encoding. Palette sources are already
/// expanded to full color by the decoder, so everything else keeps the mode
/// it was decoded with.
fn normalize_for_png(img: DynamicImage) -> DynamicImage {
    match img {
        DynamicImage::ImageRgb32F(_) | DynamicImage::ImageRgba32F(_) => {
            DynamicImage::ImageRgba8(img.to_rgba8())
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};
    use tempfile::tempdir;

    fn write_test_image(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
        let img = ImageBuffer::from_fn(width, height, |x, y| {
            let v = ((x + y) % 255) as u8;
            Rgb([v, 128, 255u8.saturating_sub(v)])
        });
        let path = dir.join(name);
        img.save(&path).unwrap();
        path
    }

    #[test]
    fn crop_dimensions_match_the_computed_pixel_box() {
        let dir = tempdir().unwrap();
        let image_path = write_test_image(dir.path(), "tag01.png", 400, 300);
        let extractor = CropExtractor::new(dir.path().join("crops")).unwrap();

        let out = extractor
            .crop(&image_path, NormalizedBox::new(0.5, 0.5, 0.2, 0.3), 0, false)
            .unwrap();

        assert_eq!(
            out.pixel_box,
            PixelBox {
                x: 160,
                y: 105,
                w: 80,
                h: 90
            }
        );
        assert_eq!(out.image.dimensions(), (80, 90));
        assert!(out.saved_path.is_none());
    }

    #[test]
    fn base64_png_round_trips_to_the_same_dimensions() {
        let dir = tempdir().unwrap();
        let image_path = write_test_image(dir.path(), "tag02.png", 200, 100);
        let extractor = CropExtractor::new(dir.path().join("crops")).unwrap();

        let out = extractor
            .crop(&image_path, NormalizedBox::new(0.4, 0.6, 0.3, 0.5), 1, false)
            .unwrap();

        let bytes = STANDARD.decode(&out.png_base64).unwrap();
        let decoded = image::load_from_memory_with_format(&bytes, ImageFormat::Png).unwrap();
        assert_eq!(decoded.dimensions(), (out.pixel_box.w, out.pixel_box.h));
    }

    #[test]
    fn zero_area_box_produces_a_valid_minimal_image() {
        let dir = tempdir().unwrap();
        let image_path = write_test_image(dir.path(), "tag03.png", 100, 100);
        let extractor = CropExtractor::new(dir.path().join("crops")).unwrap();

        let out = extractor
            .crop(&image_path, NormalizedBox::new(0.5, 0.5, 0.0, 0.5), 2, false)
            .unwrap();

        assert_eq!(out.pixel_box.w, 0);
        assert_eq!(out.image.dimensions(), (1, 50));
        let bytes = STANDARD.decode(&out.png_base64).unwrap();
        assert!(image::load_from_memory_with_format(&bytes, ImageFormat::Png).is_ok());
    }

    #[test]
    fn save_writes_a_deterministically_named_debug_copy() {
        let dir = tempdir().unwrap();
        let image_path = write_test_image(dir.path(), "shelf_a.png", 120, 80);
        let crops_dir = dir.path().join("crops");
        let extractor = CropExtractor::new(&crops_dir).unwrap();

        let out = extractor
            .crop(&image_path, NormalizedBox::new(0.5, 0.5, 0.5, 0.5), 7, true)
            .unwrap();

        let saved = out.saved_path.unwrap();
        assert_eq!(saved, crops_dir.join("shelf_a_box7.png"));
        assert!(saved.exists());
        assert!(image::open(&saved).is_ok());
    }

    #[test]
    fn missing_source_maps_to_not_found() {
        let dir = tempdir().unwrap();
        let extractor = CropExtractor::new(dir.path().join("crops")).unwrap();

        let err = extractor
            .crop(
                &dir.path().join("absent.png"),
                NormalizedBox::new(0.5, 0.5, 0.2, 0.2),
                0,
                false,
            )
            .unwrap_err();

        assert!(matches!(err, CropError::NotFound(_)));
    }

    #[test]
    fn extractor_creation_is_idempotent() {
        let dir = tempdir().unwrap();
        let crops_dir = dir.path().join("crops");
        CropExtractor::new(&crops_dir).unwrap();
        CropExtractor::new(&crops_dir).unwrap();
        assert!(crops_dir.is_dir());
    }
}
