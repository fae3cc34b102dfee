pub mod generate;
pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

/// The HTTP surface is a thin adapter: two routes, handlers delegate to the
/// pipeline immediately.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/generate", post(generate::handle_generate))
        .with_state(state)
}
