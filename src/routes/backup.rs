use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Query, State},
    routing::get,
    Json, Router,
};
use tracing::debug;

use crate::{
    error::AppError,
    models::envelope::{FetchParams, FetchResponse, SavePayload, SaveResponse},
    state::AppState,
};

const DEFAULT_READ_ACTION: &str = "fetch";

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(fetch_backup).post(save_backup))
}

async fn fetch_backup(
    State(state): State<AppState>,
    params: Result<Query<FetchParams>, QueryRejection>,
) -> Result<Json<FetchResponse>, AppError> {
    let Query(params) =
        params.map_err(|err| AppError::Other(anyhow::anyhow!(err.body_text())))?;
    let action = params.action.as_deref().unwrap_or(DEFAULT_READ_ACTION);
    debug!(action, "read requested");

    let response = match state.backup.fetch(params.trip_id.as_deref()).await? {
        Some(snapshot) => FetchResponse::found(snapshot),
        None => FetchResponse::absent(),
    };
    Ok(Json(response))
}

// Parsed by hand: clients may post the JSON body as text/plain.
async fn save_backup(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<SaveResponse>, AppError> {
    let payload: SavePayload = serde_json::from_slice(&body)?;
    let timestamp = state
        .backup
        .save(
            payload.trip_id.as_deref(),
            &payload.content,
            payload.action.as_deref(),
        )
        .await?;
    Ok(Json(SaveResponse::saved(timestamp)))
}
