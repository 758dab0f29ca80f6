pub mod health;
pub mod ui;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::session::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/", get(ui::index_handler))
        .route("/health", get(health::health_handler))
        .route("/api/v1/letters", post(handlers::handle_upload))
        .route(
            "/api/v1/letters/:id",
            get(handlers::handle_get_session).delete(handlers::handle_reset),
        )
        .route("/api/v1/letters/:id/refine", post(handlers::handle_refine))
        .route(
            "/api/v1/letters/:id/download",
            get(handlers::handle_download),
        )
        .layer(DefaultBodyLimit::max(upload_limit))
        .with_state(state)
}
