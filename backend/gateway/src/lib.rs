//! pricelens HTTP gateway.
//!
//! REST endpoints for the annotation UI plus static serving of source
//! images and debug crops.

pub mod routes;
pub mod server;
pub mod static_files;

pub use server::{build_router, start_server, AppState};
