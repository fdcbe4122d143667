use serde::{Deserialize, Serialize};

use super::snapshot::{Snapshot, TripContent};

pub const NO_BACKUP_MESSAGE: &str = "No backup found for this trip";
pub const SAVED_MESSAGE: &str = "Backup saved successfully";

/// Query string of the read path.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchParams {
    pub trip_id: Option<String>,
    pub action: Option<String>,
}

/// Body of the write path.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavePayload {
    #[serde(default)]
    pub trip_id: Option<String>,
    #[serde(flatten)]
    pub content: TripContent,
    #[serde(default)]
    pub action: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FetchResponse {
    pub success: bool,
    pub data: Option<Snapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl FetchResponse {
    pub fn found(snapshot: Snapshot) -> Self {
        Self {
            success: true,
            data: Some(snapshot),
            message: None,
        }
    }

    pub fn absent() -> Self {
        Self {
            success: true,
            data: None,
            message: Some(NO_BACKUP_MESSAGE.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SaveResponse {
    pub success: bool,
    pub message: String,
    pub timestamp: String,
}

impl SaveResponse {
    pub fn saved(timestamp: String) -> Self {
        Self {
            success: true,
            message: SAVED_MESSAGE.to_string(),
            timestamp,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
