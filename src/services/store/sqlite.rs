use async_trait::async_trait;
use sqlx::FromRow;
use tracing::debug;

use super::{decode_history_data, SnapshotStore, Upserted};
use crate::{
    db::DbPool,
    error::AppError,
    models::snapshot::{HistoryEntry, Snapshot, TripContent},
};

#[derive(Debug, FromRow)]
struct LatestRow {
    trip_id: String,
    dates: Option<String>,
    activities: Option<String>,
    expenses: Option<String>,
    members: Option<String>,
    updated_at: String,
}

impl LatestRow {
    fn into_snapshot(self) -> Result<Snapshot, AppError> {
        let content = TripContent::from_columns(
            &self.trip_id,
            self.dates.as_deref(),
            self.activities.as_deref(),
            self.expenses.as_deref(),
            self.members.as_deref(),
        )?;
        Ok(Snapshot {
            trip_id: self.trip_id,
            content,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct HistoryRow {
    timestamp: String,
    trip_id: String,
    #[sqlx(rename = "type")]
    action: String,
    data: String,
}

#[derive(Clone)]
pub struct SqliteSnapshotStore {
    pool: DbPool,
}

impl SqliteSnapshotStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl SnapshotStore for SqliteSnapshotStore {
    async fn init(&self) -> Result<(), AppError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    async fn find_latest(&self, trip_id: &str) -> Result<Option<Snapshot>, AppError> {
        let row = sqlx::query_as::<_, LatestRow>(
            "SELECT trip_id, dates, activities, expenses, members, updated_at \
             FROM latest WHERE trip_id = ? ORDER BY row_id LIMIT 1",
        )
        .bind(trip_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(LatestRow::into_snapshot).transpose()
    }

    async fn upsert(
        &self,
        trip_id: &str,
        content: &TripContent,
        updated_at: &str,
    ) -> Result<Upserted, AppError> {
        let columns = content.to_columns()?;
        let updated = sqlx::query(
            "UPDATE latest \
             SET dates = ?, activities = ?, expenses = ?, members = ?, updated_at = ? \
             WHERE row_id = (SELECT row_id FROM latest WHERE trip_id = ? ORDER BY row_id LIMIT 1)",
        )
        .bind(&columns.dates)
        .bind(&columns.activities)
        .bind(&columns.expenses)
        .bind(&columns.members)
        .bind(updated_at)
        .bind(trip_id)
        .execute(&self.pool)
        .await?;

        if updated.rows_affected() > 0 {
            debug!(trip_id, "updated latest row in place");
            return Ok(Upserted::Updated);
        }

        sqlx::query(
            "INSERT INTO latest (trip_id, dates, activities, expenses, members, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(trip_id)
        .bind(&columns.dates)
        .bind(&columns.activities)
        .bind(&columns.expenses)
        .bind(&columns.members)
        .bind(updated_at)
        .execute(&self.pool)
        .await?;
        debug!(trip_id, "appended latest row");
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
        sqlx::query("INSERT INTO history (timestamp, trip_id, type, data) VALUES (?, ?, ?, ?)")
            .bind(timestamp)
            .bind(trip_id)
            .bind(action)
            .bind(data)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn history(&self, trip_id: &str) -> Result<Vec<HistoryEntry>, AppError> {
        let rows = sqlx::query_as::<_, HistoryRow>(
            "SELECT timestamp, trip_id, type, data FROM history WHERE trip_id = ? ORDER BY row_id",
        )
        .bind(trip_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| -> Result<HistoryEntry, AppError> {
                let data = decode_history_data(&row.trip_id, &row.data)?;
                Ok(HistoryEntry {
                    timestamp: row.timestamp,
                    trip_id: row.trip_id,
                    action: row.action,
                    data,
                })
            })
            .collect()
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
