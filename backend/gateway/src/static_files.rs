//! Flat-file serving for source images and debug crops.
//!
//! Crops are retrievable by their deterministic `{stem}_box{id}.png` name,
//! so every `debug_crop:` marker in an analysis result resolves to a URL.

use std::path::{Path, PathBuf};

use axum::{
    extract::Path as UrlPath,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tokio::fs;
use tracing::{debug, warn};

/// Router serving the contents of one directory, flat (no subdirectories).
pub fn static_router(dir: PathBuf) -> Router {
    Router::new().route(
        "/:filename",
        get(move |UrlPath(filename): UrlPath<String>| serve_file(dir.clone(), filename)),
    )
}

async fn serve_file(dir: PathBuf, filename: String) -> Response {
    if is_suspicious(&filename) {
        warn!(filename = %filename, "rejected suspicious static path");
        return (StatusCode::BAD_REQUEST, "invalid filename").into_response();
    }

    let path = dir.join(&filename);
    debug!(path = %path.display(), "serving static file");

    match fs::read(&path).await {
        Ok(bytes) => {
            let mut headers = HeaderMap::new();
            headers.insert(header::CONTENT_TYPE, image_mime(&path).parse().unwrap());
            headers.insert(
                header::CACHE_CONTROL,
                "public, max-age=86400".parse().unwrap(),
            );
            headers.insert(
                header::CONTENT_LENGTH,
                bytes.len().to_string().parse().unwrap(),
            );
            (StatusCode::OK, headers, bytes).into_response()
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            (StatusCode::NOT_FOUND, "file not found").into_response()
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read static file");
            (StatusCode::INTERNAL_SERVER_ERROR, "failed to read file").into_response()
        }
    }
}

/// Path traversal guard. Route matching already limits us to one segment;
/// this keeps the check independent of the router.
fn is_suspicious(filename: &str) -> bool {
    filename.contains("..") || filename.contains('/') || filename.contains('\\')
}

/// MIME by extension, limited to the image types the catalog stores.
fn image_mime(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "bmp" => "image/bmp",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}
