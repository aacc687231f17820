//! RPSLS Player Service
//!
//! HTTP service through which a player creates, joins, reveals and times out
//! commit-reveal games on chain.

pub mod config;
pub mod error;
pub mod handlers;
pub mod pending;
pub mod state;
pub mod watcher;

use axum::{
    routing::{get, post},
    Router,
};
use handlers::*;
use state::PlayerState;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

pub fn create_router(state: Arc<PlayerState>) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/wallet", get(get_wallet))
        .route("/api/wallet/connect", post(connect_wallet))
        .route("/api/wallet/disconnect", post(disconnect_wallet))
        .route("/api/games/mine", get(my_games))
        .route("/api/game/create", post(create_game))
        .route("/api/game/:contract", get(get_game))
        .route("/api/game/:contract/play", post(play))
        .route("/api/game/:contract/reveal", post(reveal))
        .route("/api/game/:contract/timeout", post(claim_timeout))
        .route("/api/system/tick", post(tick))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
