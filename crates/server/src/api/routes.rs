use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::{audit, device, game, handlers, middleware::metrics_middleware, switches, ws};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // API routes
    let api_routes: Router<Arc<AppState>> = Router::new()
        // Health, config and status
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .route("/status", get(handlers::get_status))
        // Audit
        .route("/audit", get(audit::query_audit))
        // Switch injection
        .route("/switches/{name}", post(switches::post_switch))
        // Game and turns
        .route("/game/start", post(game::start_game))
        .route("/game/end", post(game::end_game))
        .route("/game/players", post(game::add_player))
        .route("/game/turn/end", post(game::end_turn))
        .route("/game/turn/{player}", post(game::start_turn))
        .route("/game/qualify", post(game::qualify_locks))
        // Device and trough
        .route("/device/eject", post(device::eject))
        .route("/device/search", post(device::ball_search))
        .route("/trough/launch", post(device::launch))
        // Rule notifications
        .route("/ws", get(ws::ws_handler));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::metrics))
        .with_state(state)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
}
