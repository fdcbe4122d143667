use std::sync::Arc;

use mockable::Clock;
use tracing::info;

use crate::{
    clock::Stamper,
    error::AppError,
    models::snapshot::{action_or_default, Snapshot, TripContent},
    services::store::{SnapshotStore, Upserted},
};

/// Read and write handling for trip backups on top of a [`SnapshotStore`].
#[derive(Clone)]
pub struct BackupService {
    store: Arc<dyn SnapshotStore>,
    stamper: Arc<Stamper>,
}

impl BackupService {
    pub fn new(store: Arc<dyn SnapshotStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            stamper: Arc::new(Stamper::new(clock)),
        }
    }

    pub fn store(&self) -> &Arc<dyn SnapshotStore> {
        &self.store
    }

    /// Current snapshot of a trip. An unknown trip is `Ok(None)`.
    pub async fn fetch(&self, trip_id: Option<&str>) -> Result<Option<Snapshot>, AppError> {
        let trip_id = require_trip_id(trip_id)?;
        let snapshot = self.store.find_latest(trip_id).await?;
        match &snapshot {
            Some(found) => info!(trip_id, updated_at = %found.updated_at, "backup fetched"),
            None => info!(trip_id, "no backup stored"),
        }
        Ok(snapshot)
    }

    /// Logs the save to history, then replaces the trip's current snapshot.
    /// Both rows carry the same timestamp, which is returned.
    pub async fn save(
        &self,
        trip_id: Option<&str>,
        content: &TripContent,
        action: Option<&str>,
    ) -> Result<String, AppError> {
        let trip_id = require_trip_id(trip_id)?;
        let action = action_or_default(action);
        let timestamp = self.stamper.next();

        self.store
            .append_history(trip_id, action, content, &timestamp)
            .await?;
        let outcome = self.store.upsert(trip_id, content, &timestamp).await?;
        let created = outcome == Upserted::Inserted;

        info!(trip_id, action, timestamp = %timestamp, created, "backup saved");
        Ok(timestamp)
    }
}

fn require_trip_id(trip_id: Option<&str>) -> Result<&str, AppError> {
    match trip_id {
        Some(id) if !id.is_empty() => Ok(id),
        _ => Err(AppError::MissingIdentifier),
    }
}

#[cfg(test)]
mod tests {
    use mockable::DefaultClock;
    use serde_json::json;

    use super::*;
    use crate::services::store::MemorySnapshotStore;

    fn service() -> (BackupService, Arc<MemorySnapshotStore>) {
        let store = Arc::new(MemorySnapshotStore::new());
        let service = BackupService::new(store.clone(), Arc::new(DefaultClock));
        (service, store)
    }

    #[tokio::test]
    async fn fetch_without_identifier_is_a_client_error() {
        let (service, _) = service();
        for trip_id in [None, Some("")] {
            let err = service.fetch(trip_id).await.unwrap_err();
            assert!(err.is_client_error());
        }
    }

    #[tokio::test]
    async fn save_without_identifier_writes_nothing() {
        let (service, store) = service();
        let err = service
            .save(Some(""), &TripContent::default(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::MissingIdentifier));
        assert!(store.history("").await.unwrap().is_empty());
        assert_eq!(store.latest_row_count("").await, 0);
    }

    #[tokio::test]
    async fn save_then_fetch_round_trips_content() {
        let (service, _) = service();
        let content = TripContent {
            dates: json!(["2024-01-01"]),
            activities: json!({ "2024-01-01": [{ "title": "museum" }] }),
            expenses: json!({}),
            members: json!(["alice"]),
        };
        let timestamp = service.save(Some("t1"), &content, None).await.unwrap();

        let snapshot = service.fetch(Some("t1")).await.unwrap().expect("snapshot");
        assert_eq!(snapshot.trip_id, "t1");
        assert_eq!(snapshot.content, content);
        assert_eq!(snapshot.updated_at, timestamp);
    }

    #[tokio::test]
    async fn history_and_latest_share_one_timestamp_per_save() {
        let (service, store) = service();
        let first = service
            .save(Some("t1"), &TripContent::default(), Some("sync"))
            .await
            .unwrap();
        let second = service
            .save(Some("t1"), &TripContent::default(), None)
            .await
            .unwrap();
        assert!(second > first);

        let history = store.history("t1").await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].timestamp, first);
        assert_eq!(history[0].action, "sync");
        assert_eq!(history[1].timestamp, second);
        assert_eq!(history[1].action, "export");
        assert_eq!(store.latest_row_count("t1").await, 1);

        let latest = store.find_latest("t1").await.unwrap().expect("row");
        assert_eq!(latest.updated_at, second);
    }
}
