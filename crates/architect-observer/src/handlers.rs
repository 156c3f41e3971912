//! REST API endpoint handlers for the Observer server.
//!
//! Read handlers take the snapshot read lock for the duration of one
//! response; the orchestrator only writes between ticks, so reads never
//! observe a half-applied tick.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Minimal HTML status page |
//! | `GET` | `/api/state` | Whole simulation state |
//! | `GET` | `/api/objects` | Placed objects (optional type filter) |
//! | `GET` | `/api/plan` | Active plan or `null` |
//! | `GET` | `/api/knowledge` | Knowledge ledger (optional category filter) |
//! | `GET` | `/api/logs` | Log stream tail (optional kind filter) |
//! | `GET` | `/api/progression` | Progression stats |
//! | `POST` | `/api/simulation/decide` | Raw oracle pass-through |

use std::sync::Arc;

use architect_oracle::RawDecisionRequest;
use architect_types::{KnowledgeCategory, LogKind, WorldObjectType};
use axum::Json;
use axum::extract::{Query, State};
use axum::response::{Html, IntoResponse};
use tracing::warn;

use crate::error::ObserverError;
use crate::state::AppState;

/// Default number of log lines returned by `GET /api/logs`.
const DEFAULT_LOG_LIMIT: usize = 100;

// ---------------------------------------------------------------------------
// Query parameter structs
// ---------------------------------------------------------------------------

/// Query parameters for `GET /api/objects`.
#[derive(Debug, serde::Deserialize)]
pub struct ObjectsQuery {
    /// Only objects of this type (snake case, e.g. `modular_unit`).
    #[serde(rename = "type")]
    pub object_type: Option<String>,
}

/// Query parameters for `GET /api/knowledge`.
#[derive(Debug, serde::Deserialize)]
pub struct KnowledgeQuery {
    /// Only entries in this category (case-insensitive).
    pub category: Option<String>,
}

/// Query parameters for `GET /api/logs`.
#[derive(Debug, serde::Deserialize)]
pub struct LogsQuery {
    /// Only lines of this kind.
    pub kind: Option<String>,
    /// Maximum number of lines, newest kept (default 100).
    pub limit: Option<usize>,
}

// ---------------------------------------------------------------------------
// GET /
// ---------------------------------------------------------------------------

/// Serve a minimal HTML page with the headline numbers and API links.
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.snapshot.read().await;
    let html = format!(
        r#"<!DOCTYPE html>
<html>
<head><title>Architect-OS Observer</title></head>
<body style="font-family: monospace; background: #05080c; color: #7fdbff; padding: 2rem;">
<h1>Architect-OS Observer</h1>
<p>Goal: {goal}</p>
<p>Task: {task} ({progress}%)</p>
<p>Link: {network:?} | Ticks: {ticks} | Objects: {objects} | Knowledge: {knowledge} | Tier: {tier}</p>
<h2>API</h2>
<ul>
<li><a href="/api/state">/api/state</a></li>
<li><a href="/api/objects">/api/objects</a></li>
<li><a href="/api/plan">/api/plan</a></li>
<li><a href="/api/knowledge">/api/knowledge</a></li>
<li><a href="/api/logs">/api/logs</a></li>
<li><a href="/api/progression">/api/progression</a></li>
<li><a href="/api/operator/status">/api/operator/status</a></li>
<li>WebSocket: <code>ws://HOST/ws/stream</code></li>
</ul>
</body>
</html>"#,
        goal = escape_html(&snapshot.current_goal),
        task = escape_html(&snapshot.current_task),
        progress = snapshot.task_progress,
        network = snapshot.network_status,
        ticks = snapshot.ticks_settled,
        objects = snapshot.objects.len(),
        knowledge = snapshot.knowledge.len(),
        tier = snapshot.progression.complexity_level,
    );
    Html(html)
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

// ---------------------------------------------------------------------------
// Read endpoints
// ---------------------------------------------------------------------------

/// Return the whole simulation state.
pub async fn get_state(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.snapshot.read().await;
    Json(snapshot.clone())
}

/// List placed objects in placement order.
///
/// # Errors
///
/// 400 for an unknown object type.
pub async fn list_objects(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ObjectsQuery>,
) -> Result<impl IntoResponse, ObserverError> {
    let filter = query
        .object_type
        .as_deref()
        .map(|label| {
            WorldObjectType::from_label(label)
                .ok_or_else(|| ObserverError::InvalidQuery(format!("unknown object type: {label}")))
        })
        .transpose()?;

    let snapshot = state.snapshot.read().await;
    let objects: Vec<_> = snapshot
        .objects
        .iter()
        .filter(|o| filter.is_none_or(|t| o.object_type == t))
        .cloned()
        .collect();
    Ok(Json(objects))
}

/// Return the active plan, or JSON `null`.
pub async fn get_plan(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.snapshot.read().await;
    Json(snapshot.active_plan.clone())
}

/// List knowledge entries in ledger order.
///
/// # Errors
///
/// 400 for an unknown category.
pub async fn list_knowledge(
    State(state): State<Arc<AppState>>,
    Query(query): Query<KnowledgeQuery>,
) -> Result<impl IntoResponse, ObserverError> {
    let filter = query
        .category
        .as_deref()
        .map(|label| {
            KnowledgeCategory::from_label(label)
                .ok_or_else(|| ObserverError::InvalidQuery(format!("unknown category: {label}")))
        })
        .transpose()?;

    let snapshot = state.snapshot.read().await;
    let entries: Vec<_> = snapshot
        .knowledge
        .iter()
        .filter(|e| filter.is_none_or(|c| e.category == c))
        .cloned()
        .collect();
    Ok(Json(entries))
}

/// Return the newest log lines, oldest first.
///
/// # Errors
///
/// 400 for an unknown kind.
pub async fn list_logs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LogsQuery>,
) -> Result<impl IntoResponse, ObserverError> {
    let filter = query
        .kind
        .as_deref()
        .map(|label| {
            LogKind::from_label(label)
                .ok_or_else(|| ObserverError::InvalidQuery(format!("unknown log kind: {label}")))
        })
        .transpose()?;
    let limit = query.limit.unwrap_or(DEFAULT_LOG_LIMIT);

    let snapshot = state.snapshot.read().await;
    let mut lines: Vec<_> = snapshot
        .logs
        .iter()
        .rev()
        .filter(|l| filter.is_none_or(|k| l.kind == k))
        .take(limit)
        .cloned()
        .collect();
    lines.reverse();
    Ok(Json(lines))
}

/// Return progression stats.
pub async fn get_progression(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.snapshot.read().await;
    Json(snapshot.progression.clone())
}

// ---------------------------------------------------------------------------
// POST /api/simulation/decide
// ---------------------------------------------------------------------------

/// Forward a caller-supplied prompt to the oracle and return its JSON.
///
/// # Errors
///
/// 503 when no oracle is attached, 500 when the model call fails or its
/// reply is not JSON.
pub async fn decide(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RawDecisionRequest>,
) -> Result<impl IntoResponse, ObserverError> {
    let oracle = state
        .oracle
        .as_ref()
        .ok_or_else(|| ObserverError::Unavailable(String::from("no decision oracle configured")))?;

    match oracle.complete_raw(&request).await {
        Ok(value) => Ok(Json(value)),
        Err(e) => {
            warn!(error = %e, "Raw decision pass-through failed");
            Err(e.into())
        }
    }
}
