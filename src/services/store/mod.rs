//! Persistence for trip snapshots and their write history.
//!
//! Two logical tables back every store: `latest` holds one row per trip with
//! the current snapshot, `history` records every save and is never rewritten.
//! When `latest` somehow holds several rows for one trip, the first row in
//! storage order is the one read and the one updated.

pub mod memory;
pub mod sqlite;

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    config::AppConfig,
    db::init_pool,
    error::AppError,
    models::snapshot::{HistoryEntry, Snapshot, TripContent},
};

pub use memory::MemorySnapshotStore;
pub use sqlite::SqliteSnapshotStore;

/// What an upsert did to the `latest` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upserted {
    Inserted,
    Updated,
}

#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Creates both tables if they are missing. Safe to call more than once.
    async fn init(&self) -> Result<(), AppError>;

    /// Returns the first `latest` row for `trip_id`, or `None` when there is none.
    async fn find_latest(&self, trip_id: &str) -> Result<Option<Snapshot>, AppError>;

    /// Overwrites the content and timestamp of the first matching `latest` row in
    /// place, or appends a new row when the trip is unknown.
    async fn upsert(
        &self,
        trip_id: &str,
        content: &TripContent,
        updated_at: &str,
    ) -> Result<Upserted, AppError>;

    /// Appends one row to `history`.
    async fn append_history(
        &self,
        trip_id: &str,
        action: &str,
        content: &TripContent,
        timestamp: &str,
    ) -> Result<(), AppError>;

    /// History rows of one trip, oldest first.
    async fn history(&self, trip_id: &str) -> Result<Vec<HistoryEntry>, AppError>;

    /// Cheap liveness probe.
    async fn ping(&self) -> Result<(), AppError>;

    async fn close(&self);
}

/// Opens and initialises the store selected by the configuration.
pub async fn open_store(config: &AppConfig) -> Result<Arc<dyn SnapshotStore>, AppError> {
    let store: Arc<dyn SnapshotStore> = if config.uses_memory_store() {
        Arc::new(MemorySnapshotStore::new())
    } else {
        let pool = init_pool(&config.database_url, config.max_connections).await?;
        Arc::new(SqliteSnapshotStore::new(pool))
    };
    store.init().await?;
    Ok(store)
}

fn decode_history_data(trip_id: &str, data: &str) -> Result<TripContent, AppError> {
    if data.is_empty() {
        return Ok(TripContent::default());
    }
    serde_json::from_str(data).map_err(|source| AppError::MalformedRecord {
        column: "data",
        trip_id: trip_id.to_string(),
        source,
    })
}
