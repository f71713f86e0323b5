//! REST handlers for the annotation UI.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde_json::{json, Value};
use tracing::error;

use pricelens_catalog::CatalogError;
use pricelens_core::{AnalyzeRequest, LabeledBox, Pricetag};

use crate::server::AppState;

/// Health check endpoint.
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "pricelens",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// `GET /images` — catalog image filenames, sorted.
pub async fn list_images(State(state): State<AppState>) -> Result<Json<Vec<String>>, StatusCode> {
    match state.catalog.list_images() {
        Ok(images) => Ok(Json(images)),
        Err(e) => {
            error!(error = %e, "failed to list catalog images");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// `GET /labels/:base_name` — all detections for one image, ids assigned by
/// label-file row order. A misconfigured catalog is a protocol error here,
/// unlike the analyze endpoint which never fails.
pub async fn get_labels(
    Path(base_name): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Vec<LabeledBox>>, (StatusCode, String)> {
    match state.catalog.labeled_boxes(&base_name) {
        Ok(boxes) => Ok(Json(boxes)),
        Err(e @ (CatalogError::ImageNotFound(_) | CatalogError::LabelsNotFound(_))) => {
            Err((StatusCode::NOT_FOUND, e.to_string()))
        }
        Err(e) => {
            error!(base_name = %base_name, error = %e, "label lookup failed");
            Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}

/// `POST /analyze-price-tag` — always answers 200 with a `Pricetag`;
/// business-logic failures arrive as degraded results with evidence in
/// `what_was_read`. Only a malformed body surfaces a protocol error.
pub async fn analyze_price_tag(
    State(state): State<AppState>,
    Json(payload): Json<AnalyzeRequest>,
) -> Json<Pricetag> {
    Json(state.extractor.analyze(&payload).await)
}
