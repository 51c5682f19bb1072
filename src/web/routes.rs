//! Router configuration for the web server.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use super::handlers;
use super::AppState;

/// Uploads are held in memory while the form is parsed.
const MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        // Form buttons
        .route("/probe", post(handlers::probe))
        .route("/convert", post(handlers::convert))
        .route("/clear", post(handlers::clear))
        // Result file
        .route("/download", get(handlers::download))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}
