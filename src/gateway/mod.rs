//! HTTP gateway
//!
//! Thin axum surface over the coordinator and the read-only stores. All
//! business decisions live below this layer; handlers deserialize, call,
//! and map errors to the stable external codes.

pub mod handlers;
pub mod state;
pub mod types;

use axum::Router;
use axum::routing::{get, post};
use std::sync::Arc;

use state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/wallet/transfer", post(handlers::create_transfer))
        .route("/wallet/transfer/{key}", get(handlers::get_transfer))
        .route("/wallet/{id}", get(handlers::get_wallet))
        .route("/interest/daily", post(handlers::accrue_interest))
        .with_state(state)
}
