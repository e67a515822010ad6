pub mod api;
pub mod health;
pub mod pages;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(pages::index))
        .route("/report", post(pages::submit_report))
        .route("/api/report", post(api::create_report))
        .route("/health", get(health::health))
        .with_state(state)
}
