//! Axum HTTP handlers.

pub mod config;
pub mod retrieve;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/retrieve", post(retrieve::retrieve))
        .route("/api/blocks/count", get(retrieve::block_count))
        .route("/api/config", get(config::get_config).put(config::update_config))
        .with_state(state)
}
