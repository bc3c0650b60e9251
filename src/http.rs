//! Query interface.

use std::{sync::Arc, time::Duration};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::{publisher::SnapshotPublisher, snapshot::Snapshot};

#[derive(Debug)]
pub struct AppState {
    pub publisher: Arc<SnapshotPublisher>,

    /// Age after which a snapshot is reported as stale.
    pub stale_after: Duration,
}

#[derive(Serialize)]
struct MetricsDocument<'a> {
    #[serde(flatten)]
    snapshot: &'a Snapshot,
    age_secs: i64,
    stale: bool,
}

#[derive(Serialize)]
struct HealthDto {
    status: &'static str,
    snapshot: bool,
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/metrics/topics/{name}", get(topic))
        .route("/metrics/subscribers/{group_id}", get(subscriber))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

fn error(status: StatusCode, msg: impl Into<String>) -> Response {
    (status, Json(json!({ "error": msg.into() }))).into_response()
}

fn no_snapshot() -> Response {
    error(StatusCode::SERVICE_UNAVAILABLE, "no snapshot available yet")
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthDto> {
    Json(HealthDto {
        status: "ok",
        snapshot: state.publisher.current().is_some(),
    })
}

async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    let Some(snapshot) = state.publisher.current() else {
        return no_snapshot();
    };

    let age_secs = (Utc::now() - snapshot.taken_at()).num_seconds().max(0);
    let stale = u64::try_from(age_secs).unwrap_or_default() > state.stale_after.as_secs();
    Json(MetricsDocument {
        snapshot: &snapshot,
        age_secs,
        stale,
    })
    .into_response()
}

async fn topic(Path(name): Path<String>, State(state): State<Arc<AppState>>) -> Response {
    let Some(snapshot) = state.publisher.current() else {
        return no_snapshot();
    };

    match snapshot.topic(&name) {
        Some(topic) => Json(topic).into_response(),
        None => error(StatusCode::NOT_FOUND, format!("unknown topic \"{name}\"")),
    }
}

async fn subscriber(Path(group_id): Path<String>, State(state): State<Arc<AppState>>) -> Response {
    let Some(snapshot) = state.publisher.current() else {
        return no_snapshot();
    };

    match snapshot.subscriber(&group_id) {
        Some(subscriber) => Json(subscriber).into_response(),
        None => error(
            StatusCode::NOT_FOUND,
            format!("unknown subscriber \"{group_id}\""),
        ),
    }
}
