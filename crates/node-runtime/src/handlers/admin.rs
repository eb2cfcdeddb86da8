//! Admin HTTP router: liveness, Prometheus text, session and pending views.

use crate::container::KeyMeshContainer;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use keymesh_telemetry::encode_metrics;
use std::sync::Arc;

/// Build the admin router for `container`.
///
/// | Route | Body |
/// |-------|------|
/// | `GET /health` | board id and status |
/// | `GET /metrics` | Prometheus text exposition |
/// | `GET /sessions` | one entry per known peer session |
/// | `GET /pending` | in-flight request count and tracker counters |
pub fn admin_router(container: Arc<KeyMeshContainer>) -> Router {
    let health = Arc::clone(&container);
    let sessions = Arc::clone(&container);
    let pending = container;

    Router::new()
        .route(
            "/health",
            get(move || {
                let container = Arc::clone(&health);
                async move {
                    Json(serde_json::json!({
                        "status": "ok",
                        "board": container.local_peer,
                        "name": container.config.board.name,
                    }))
                }
            }),
        )
        .route("/metrics", get(metrics))
        .route(
            "/sessions",
            get(move || {
                let container = Arc::clone(&sessions);
                async move { Json(sessions_json(&container)) }
            }),
        )
        .route(
            "/pending",
            get(move || {
                let container = Arc::clone(&pending);
                async move {
                    let stats = container.tracker.stats().snapshot();
                    Json(serde_json::json!({
                        "count": container.tracker.pending_count(),
                        "stats": {
                            "issued": stats.issued,
                            "resolved": stats.resolved,
                            "retries": stats.retries,
                            "timeouts": stats.timeouts,
                            "unknown": stats.unknown,
                            "cancelled": stats.cancelled,
                            "duplicates_rejected": stats.duplicates_rejected,
                        }
                    }))
                }
            }),
        )
}

async fn metrics() -> impl IntoResponse {
    match encode_metrics() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [(header::CONTENT_TYPE, "text/plain")],
            e.to_string(),
        ),
    }
}

fn sessions_json(container: &KeyMeshContainer) -> serde_json::Value {
    let mut peers: Vec<_> = container.config.peer_ids();
    for peer in container.coordinator.active_sessions() {
        if !peers.contains(&peer) {
            peers.push(peer);
        }
    }

    let sessions: Vec<_> = peers
        .iter()
        .filter_map(|peer| container.coordinator.session(peer))
        .map(|session| {
            serde_json::json!({
                "peer": session.peer_id,
                "state": session.state.as_str(),
                "completed": session.completed_kinds(),
                "pending": session.pending,
                "failure": session.failure.as_ref().map(ToString::to_string),
                "elapsed_ms": session.updated_at.duration_since(session.started_at).as_millis() as u64,
            })
        })
        .collect();

    serde_json::json!({ "count": sessions.len(), "sessions": sessions })
}
