//! Axum router construction for the Observer API.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::{handlers, operator, ws};

/// Build the complete Axum router for the Observer server.
///
/// CORS allows any origin so a dashboard served elsewhere can connect.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::index))
        .route("/ws/stream", get(ws::ws_stream))
        // Read API
        .route("/api/state", get(handlers::get_state))
        .route("/api/objects", get(handlers::list_objects))
        .route("/api/plan", get(handlers::get_plan))
        .route("/api/knowledge", get(handlers::list_knowledge))
        .route("/api/logs", get(handlers::list_logs))
        .route("/api/progression", get(handlers::get_progression))
        .route("/api/simulation/decide", post(handlers::decide))
        // Operator API
        .route("/api/operator/status", get(operator::status))
        .route("/api/operator/auto", post(operator::auto))
        .route("/api/operator/manual", post(operator::manual))
        .route("/api/operator/tick", post(operator::tick))
        .route("/api/operator/speed", post(operator::set_speed))
        .route("/api/operator/stop", post(operator::stop))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
