use thiserror::Error;

/// Top-level error type for the pricelens runtime.
///
/// Extraction-pipeline failures never reach callers as errors — the tag
/// extraction service absorbs them into a degraded `Pricetag`. What remains
/// here are catalog lookups (legitimate protocol errors) and startup
/// configuration problems.
#[derive(Debug, Error)]
pub enum PricelensError {
    #[error("image not found for base name: {0}")]
    ImageNotFound(String),

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("vision provider error ({provider}): {message}")]
    VisionError { provider: String, message: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
