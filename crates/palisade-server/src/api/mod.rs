pub mod dto;
pub mod handlers;

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::AppState;

pub fn create_router() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Reputation endpoints
        .route("/api/v1/reputation/{address}", get(handlers::get_reputation))
        .route("/api/v1/reputation/batch", post(handlers::batch_reputation))
        // Cache management
        .route("/api/v1/cache", delete(handlers::clear_cache))
}
