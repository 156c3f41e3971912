//! Operator REST API handlers for runtime simulation control.
//!
//! These endpoints give the operator one-way command authority over the
//! tick loop. They never touch the simulation state directly; a manual
//! tick is a request the loop consumes as soon as it is free.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/api/operator/status` | Current loop status |
//! | `POST` | `/api/operator/auto` | Switch to autonomous mode |
//! | `POST` | `/api/operator/manual` | Switch to manual mode |
//! | `POST` | `/api/operator/tick` | Queue one tick |
//! | `POST` | `/api/operator/speed` | Set tick interval (ms) |
//! | `POST` | `/api/operator/stop` | Stop the loop |

use std::sync::Arc;

use architect_core::operator::{MIN_TICK_INTERVAL_MS, OperatorState, RunMode};
use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;
use tracing::info;

use crate::error::ObserverError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /api/operator/speed`.
#[derive(Debug, serde::Deserialize)]
pub struct SetSpeedRequest {
    /// New tick interval in milliseconds (minimum 100).
    pub tick_interval_ms: u64,
}

/// Generic success response.
#[derive(Debug, serde::Serialize)]
struct OperatorResponse {
    ok: bool,
    message: String,
}

impl OperatorResponse {
    fn ok(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            ok: true,
            message: message.into(),
        })
    }
}

fn operator(state: &AppState) -> Result<&Arc<OperatorState>, ObserverError> {
    state
        .operator_state
        .as_ref()
        .ok_or_else(|| ObserverError::Unavailable(String::from("operator state not available")))
}

// ---------------------------------------------------------------------------
// GET /api/operator/status
// ---------------------------------------------------------------------------

/// Return mode, interval, pending requests, and link status.
///
/// # Errors
///
/// 503 when no operator state is attached.
pub async fn status(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ObserverError> {
    let operator = operator(&state)?;
    let snapshot = state.snapshot.read().await;
    Ok(Json(
        operator.status(snapshot.network_status, snapshot.ticks_settled),
    ))
}

// ---------------------------------------------------------------------------
// Mode
// ---------------------------------------------------------------------------

/// Schedule ticks automatically.
///
/// # Errors
///
/// 503 when no operator state is attached.
pub async fn auto(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ObserverError> {
    let previous = operator(&state)?.set_mode(RunMode::Autonomous);
    info!(?previous, "Operator switched to autonomous mode");
    Ok(OperatorResponse::ok("Autonomous mode engaged"))
}

/// Stop scheduling ticks; wait for manual requests.
///
/// # Errors
///
/// 503 when no operator state is attached.
pub async fn manual(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ObserverError> {
    let previous = operator(&state)?.set_mode(RunMode::Manual);
    info!(?previous, "Operator switched to manual mode");
    Ok(OperatorResponse::ok("Manual mode engaged"))
}

// ---------------------------------------------------------------------------
// POST /api/operator/tick
// ---------------------------------------------------------------------------

/// Queue a single tick. Ignored by the orchestrator if one is in flight.
///
/// # Errors
///
/// 503 when no operator state is attached.
pub async fn tick(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ObserverError> {
    operator(&state)?.request_tick();
    Ok(OperatorResponse::ok("Tick requested"))
}

// ---------------------------------------------------------------------------
// POST /api/operator/speed
// ---------------------------------------------------------------------------

/// Change the tick interval at runtime.
///
/// # Errors
///
/// 400 below the minimum interval, 503 when no operator state is attached.
pub async fn set_speed(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SetSpeedRequest>,
) -> Result<impl IntoResponse, ObserverError> {
    let prev = operator(&state)?
        .set_tick_interval_ms(body.tick_interval_ms)
        .ok_or_else(|| {
            ObserverError::InvalidQuery(format!(
                "tick_interval_ms must be at least {MIN_TICK_INTERVAL_MS}"
            ))
        })?;

    Ok(Json(serde_json::json!({
        "ok": true,
        "message": format!("Tick interval changed from {prev}ms to {}ms", body.tick_interval_ms),
        "previous_interval_ms": prev,
        "new_interval_ms": body.tick_interval_ms,
    })))
}

// ---------------------------------------------------------------------------
// POST /api/operator/stop
// ---------------------------------------------------------------------------

/// Stop the loop. An in-flight tick is abandoned without committing.
///
/// # Errors
///
/// 503 when no operator state is attached.
pub async fn stop(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ObserverError> {
    operator(&state)?.request_stop();
    info!("Operator requested stop");
    Ok(OperatorResponse::ok("Stop requested"))
}
