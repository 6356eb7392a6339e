pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::classify::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/classify", post(handlers::handle_classify))
        .route("/criteria", get(handlers::handle_get_criteria))
        .route(
            "/prompt",
            get(handlers::handle_get_prompt).put(handlers::handle_update_prompt),
        )
        .route("/prompt/reset", post(handlers::handle_reset_prompt))
        .with_state(state)
}
