use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::envelope::ErrorBody;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Missing tripId")]
    MissingIdentifier,
    #[error("malformed {column} column stored for trip {trip_id}: {source}")]
    MalformedRecord {
        column: &'static str,
        trip_id: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),
    #[error("config error: {0}")]
    Config(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Only a missing identifier is the caller's fault; everything else is ours.
    pub fn is_client_error(&self) -> bool {
        matches!(self, AppError::MissingIdentifier)
    }

    pub fn status(&self) -> StatusCode {
        if self.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("request failed: {self}");
        }
        (status, Json(ErrorBody::new(self.to_string()))).into_response()
    }
}
