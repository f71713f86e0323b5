//! Flat-file catalog: the images directory, YOLO label files, and the class
//! name list, all owned by an external labeling pipeline and read-only here.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use pricelens_core::{LabeledBox, NormalizedBox};

/// Extensions accepted as catalog images (matched case-insensitively).
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "webp"];

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("no image found for base name: {0}")]
    ImageNotFound(String),

    #[error("label file not found: {0}")]
    LabelsNotFound(PathBuf),

    #[error("malformed label row at {path}:{line}: {reason}")]
    MalformedLabel {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("label file {path} references unknown class id {class_id}")]
    UnknownClass { path: PathBuf, class_id: usize },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Read-side repository over the catalog directories. All lookups hit the
/// filesystem fresh; nothing is cached across requests.
pub struct Catalog {
    images_dir: PathBuf,
    labels_dir: PathBuf,
    classes_file: PathBuf,
}

impl Catalog {
    pub fn new(
        images_dir: impl Into<PathBuf>,
        labels_dir: impl Into<PathBuf>,
        classes_file: impl Into<PathBuf>,
    ) -> Self {
        Self {
            images_dir: images_dir.into(),
            labels_dir: labels_dir.into(),
            classes_file: classes_file.into(),
        }
    }

    pub fn images_dir(&self) -> &Path {
        &self.images_dir
    }

    /// Absolute path of a catalog image by filename. No existence check;
    /// the crop extractor reports missing files.
    pub fn image_path(&self, filename: &str) -> PathBuf {
        self.images_dir.join(filename)
    }

    /// Image filenames in the catalog, filtered to known extensions and
    /// lexicographically sorted.
    pub fn list_images(&self) -> Result<Vec<String>, CatalogError> {
        let entries = fs::read_dir(&self.images_dir).map_err(|source| CatalogError::Io {
            path: self.images_dir.clone(),
            source,
        })?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| CatalogError::Io {
                path: self.images_dir.clone(),
                source,
            })?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if has_image_extension(&name) {
                names.push(name);
            }
        }
        names.sort();
        debug!(count = names.len(), "listed catalog images");
        Ok(names)
    }

    /// The image whose stem equals `base_name`. A base name with no matching
    /// image is a lookup failure, never an empty result.
    pub fn find_image(&self, base_name: &str) -> Result<String, CatalogError> {
        self.list_images()?
            .into_iter()
            .find(|f| Path::new(f).file_stem().and_then(|s| s.to_str()) == Some(base_name))
            .ok_or_else(|| CatalogError::ImageNotFound(base_name.to_string()))
    }

    /// Rows of `labels/{base_name}.txt` as `(class_id, box)`. Blank lines are
    /// skipped; the class id column is parsed leniently ("0" or "0.0").
    pub fn read_labels(&self, base_name: &str) -> Result<Vec<(usize, NormalizedBox)>, CatalogError> {
        let path = self.labels_dir.join(format!("{base_name}.txt"));
        let raw = fs::read_to_string(&path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                CatalogError::LabelsNotFound(path.clone())
            } else {
                CatalogError::Io {
                    path: path.clone(),
                    source,
                }
            }
        })?;

        let mut rows = Vec::new();
        for (idx, line) in raw.lines().enumerate() {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.is_empty() {
                continue;
            }
            if parts.len() != 5 {
                return Err(CatalogError::MalformedLabel {
                    path: path.clone(),
                    line: idx + 1,
                    reason: format!("expected 5 columns, got {}", parts.len()),
                });
            }

            let class_id = parse_class_id(parts[0]).ok_or_else(|| CatalogError::MalformedLabel {
                path: path.clone(),
                line: idx + 1,
                reason: format!("invalid class id: {:?}", parts[0]),
            })?;

            let mut coords = [0.0f64; 4];
            for (slot, token) in coords.iter_mut().zip(&parts[1..]) {
                *slot = token
                    .parse::<f64>()
                    .map_err(|_| CatalogError::MalformedLabel {
                        path: path.clone(),
                        line: idx + 1,
                        reason: format!("invalid coordinate: {token:?}"),
                    })?;
            }

            rows.push((
                class_id,
                NormalizedBox::new(coords[0], coords[1], coords[2], coords[3]),
            ));
        }
        Ok(rows)
    }

    /// Class names in file order, indexed by `class_id`. Blank lines are
    /// dropped without shifting indices of the remaining names.
    pub fn list_classes(&self) -> Result<Vec<String>, CatalogError> {
        let raw = fs::read_to_string(&self.classes_file).map_err(|source| CatalogError::Io {
            path: self.classes_file.clone(),
            source,
        })?;
        Ok(raw
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(str::to_owned)
            .collect())
    }

    /// All detections for `base_name`, with `id` assigned by row order and
    /// `label` resolved through the class list. Fails up front when no image
    /// matches the base name.
    pub fn labeled_boxes(&self, base_name: &str) -> Result<Vec<LabeledBox>, CatalogError> {
        self.find_image(base_name)?;
        let classes = self.list_classes()?;
        let label_path = self.labels_dir.join(format!("{base_name}.txt"));

        self.read_labels(base_name)?
            .into_iter()
            .enumerate()
            .map(|(id, (class_id, bbox))| {
                let label = classes
                    .get(class_id)
                    .cloned()
                    .ok_or_else(|| CatalogError::UnknownClass {
                        path: label_path.clone(),
                        class_id,
                    })?;
                Ok(LabeledBox { id, bbox, label })
            })
            .collect()
    }
}

fn has_image_extension(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Label files in the wild carry "0" or "0.0" in the class column.
fn parse_class_id(token: &str) -> Option<usize> {
    token
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0 && v.fract() == 0.0)
        .map(|v| v as usize)
}
