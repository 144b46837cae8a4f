pub mod api;
pub mod error;
pub mod gotenberg;
pub mod state;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use cvforge_engine::export::EXPORT_ROUTE;

use crate::state::AppState;

/// Largest accepted export request body
pub const BODY_LIMIT: usize = 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(api::health_check))
        .route(EXPORT_ROUTE, post(api::export_pdf))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .with_state(state)
}
