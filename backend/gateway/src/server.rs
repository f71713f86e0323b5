//! Router assembly and the HTTP server loop.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use pricelens_catalog::Catalog;
use pricelens_extraction::TagExtractor;

use crate::routes;
use crate::static_files;

/// Application state shared across routes. Both collaborators are stateless
/// per request; the filesystem is the only shared resource.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<Catalog>,
    pub extractor: Arc<TagExtractor>,
}

/// Build the full application router: REST API, static mounts, CORS.
pub fn build_router(state: AppState, images_dir: PathBuf, crops_dir: PathBuf) -> Router {
    Router::new()
        .route("/api/health", get(routes::health))
        .route("/images", get(routes::list_images))
        .route("/labels/:base_name", get(routes::get_labels))
        .route("/analyze-price-tag", post(routes::analyze_price_tag))
        .nest_service("/static/images", static_files::static_router(images_dir))
        .nest_service("/static/crops", static_files::static_router(crops_dir))
        .with_state(state)
        .layer(cors_layer())
}

/// Start the Axum HTTP server.
pub async fn start_server(addr: SocketAddr, app: Router) -> Result<()> {
    info!("pricelens HTTP server listening on {}", addr);
    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// The annotation frontend runs on the Vite or CRA dev server.
fn cors_layer() -> CorsLayer {
    let origins = [
        HeaderValue::from_static("http://localhost:5173"),
        HeaderValue::from_static("http://localhost:3000"),
    ];
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}
