use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;
use tracing::warn;

use crate::{services::store::SnapshotStore, state::AppState};

#[derive(Debug, Serialize)]
pub struct HealthBody {
    pub status: &'static str,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthBody>) {
    match state.backup.store().ping().await {
        Ok(()) => (StatusCode::OK, Json(HealthBody { status: "ok" })),
        Err(err) => {
            warn!("store probe failed: {err}");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthBody {
                    status: "unavailable",
                }),
            )
        }
    }
}
