pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::documents::handlers;
use crate::logo_probe::handle_logo_probe;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Term sheets
        .route("/api/v1/term-sheets", post(handlers::handle_generate))
        .route("/api/v1/term-sheets/pdf", post(handlers::handle_render_pdf))
        .route("/api/v1/term-sheets/html", post(handlers::handle_preview_html))
        .route(
            "/api/v1/term-sheets/files/:filename",
            get(handlers::handle_download_file),
        )
        .route(
            "/api/v1/term-sheets/files/:filename/preview",
            get(handlers::handle_preview_file),
        )
        // Diagnostics
        .route("/api/v1/logo/probe", post(handle_logo_probe))
        .with_state(state)
}
