use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{decode_history_data, SnapshotStore, Upserted};
use crate::{
    error::AppError,
    models::snapshot::{HistoryEntry, Snapshot, StoredColumns, TripContent},
};

#[derive(Debug, Clone)]
struct LatestRow {
    trip_id: String,
    columns: StoredColumns,
    updated_at: String,
}

#[derive(Debug, Clone)]
struct HistoryRow {
    timestamp: String,
    trip_id: String,
    action: String,
    data: String,
}

#[derive(Debug, Default)]
struct Tables {
    latest: Vec<LatestRow>,
    history: Vec<HistoryRow>,
}

/// Row store kept in process memory. Rows hold the same JSON text the SQLite
/// tables do and are scanned front to back.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    tables: RwLock<Tables>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn latest_row_count(&self, trip_id: &str) -> usize {
        self.tables
            .read()
            .await
            .latest
            .iter()
            .filter(|row| row.trip_id == trip_id)
            .count()
    }

    /// Appends a raw `latest` row without looking for an existing one.
    pub async fn push_raw_latest(&self, trip_id: &str, columns: StoredColumns, updated_at: &str) {
        self.tables.write().await.latest.push(LatestRow {
            trip_id: trip_id.to_string(),
            columns,
            updated_at: updated_at.to_string(),
        });
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn init(&self) -> Result<(), AppError> {
        Ok(())
    }

    async fn find_latest(&self, trip_id: &str) -> Result<Option<Snapshot>, AppError> {
        let tables = self.tables.read().await;
        let Some(row) = tables.latest.iter().find(|row| row.trip_id == trip_id) else {
            return Ok(None);
        };
        let content = TripContent::from_columns(
            &row.trip_id,
            Some(row.columns.dates.as_str()),
            Some(row.columns.activities.as_str()),
            Some(row.columns.expenses.as_str()),
            Some(row.columns.members.as_str()),
        )?;
        Ok(Some(Snapshot {
            trip_id: row.trip_id.clone(),
            content,
            updated_at: row.updated_at.clone(),
        }))
    }

    async fn upsert(
        &self,
        trip_id: &str,
        content: &TripContent,
        updated_at: &str,
    ) -> Result<Upserted, AppError> {
        let columns = content.to_columns()?;
        let mut tables = self.tables.write().await;
        if let Some(row) = tables.latest.iter_mut().find(|row| row.trip_id == trip_id) {
            row.columns = columns;
            row.updated_at = updated_at.to_string();
            return Ok(Upserted::Updated);
        }
        tables.latest.push(LatestRow {
            trip_id: trip_id.to_string(),
            columns,
            updated_at: updated_at.to_string(),
        });
        Ok(Upserted::Inserted)
    }

    async fn append_history(
        &self,
        trip_id: &str,
        action: &str,
        content: &TripContent,
        timestamp: &str,
    ) -> Result<(), AppError> {
        let data = content.to_history_data()?;
        self.tables.write().await.history.push(HistoryRow {
            timestamp: timestamp.to_string(),
            trip_id: trip_id.to_string(),
            action: action.to_string(),
            data,
        });
        Ok(())
    }

    async fn history(&self, trip_id: &str) -> Result<Vec<HistoryEntry>, AppError> {
        let tables = self.tables.read().await;
        tables
            .history
            .iter()
            .filter(|row| row.trip_id == trip_id)
            .map(|row| -> Result<HistoryEntry, AppError> {
                Ok(HistoryEntry {
                    timestamp: row.timestamp.clone(),
                    trip_id: row.trip_id.clone(),
                    action: row.action.clone(),
                    data: decode_history_data(&row.trip_id, &row.data)?,
                })
            })
            .collect()
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }

    async fn close(&self) {}
}
