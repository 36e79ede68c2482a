pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::state::AppState;
use crate::storyboard::handlers;

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/", get(handlers::handle_upload_form))
        .route("/health", get(health::health_handler))
        .route(
            "/create_storyboard",
            post(handlers::handle_create_storyboard),
        )
        .layer(DefaultBodyLimit::max(upload_limit))
        .with_state(state)
}
