pub mod error;
pub mod handlers;
pub mod payload;
pub mod state;

pub use state::ApiState;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

use crate::infra::http::RouterState;

pub fn build_api_router(max_request_bytes: usize) -> Router<RouterState> {
    Router::new()
        .route("/api/setup", post(handlers::complete_setup))
        .route("/api/setup/status", get(handlers::setup_status))
        .route("/api/asset/{uid}", get(handlers::asset))
        .route("/api/force-refresh", post(handlers::force_refresh))
        .route("/api/debug", get(handlers::debug))
        .route("/api/debug-config", get(handlers::debug_config))
        .route("/api/debug-setup", get(handlers::debug_setup))
        .layer(DefaultBodyLimit::max(max_request_bytes))
}
