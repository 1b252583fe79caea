//! SQLite-backed saga journal.
//!
//! One row per composite create/update, upserted on every state change so a
//! restart can find writes that never reached Committed or RolledBack.

use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use netevent_domain::{EventId, FacilityHistoryId, SagaId, SagaKind, SagaRecord, SagaState, TaskId};

use crate::infrastructure::ports::{RepoError, SagaLogPort};

/// SQLite implementation of the saga journal.
pub struct SqliteSagaLog {
    pool: SqlitePool,
}

impl SqliteSagaLog {
    pub async fn new(db_path: &str) -> Result<Self, RepoError> {
        let pool = SqlitePool::connect(&format!("sqlite:{}?mode=rwc", db_path))
            .await
            .map_err(|e| RepoError::database("saga_log", e))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS event_sagas (
                id TEXT PRIMARY KEY,
                kind TEXT NOT NULL,
                state TEXT NOT NULL,
                event_id TEXT,
                task_ids TEXT NOT NULL,
                facility_history_ids TEXT NOT NULL,
                error TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await
        .map_err(|e| RepoError::database("saga_log", e))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_event_sagas_state ON event_sagas(state)")
            .execute(&pool)
            .await
            .map_err(|e| RepoError::database("saga_log", e))?;

        Ok(Self { pool })
    }

    fn row_to_saga(row: &SqliteRow) -> Result<SagaRecord, RepoError> {
        let id: String = row.get("id");
        let kind: String = row.get("kind");
        let state: String = row.get("state");
        let event_id: Option<String> = row.get("event_id");
        let task_ids: String = row.get("task_ids");
        let facility_history_ids: String = row.get("facility_history_ids");
        let created_at: String = row.get("created_at");
        let updated_at: String = row.get("updated_at");

        let task_ids: Vec<TaskId> = serde_json::from_str(&task_ids)
            .map_err(|e| RepoError::Serialization(e.to_string()))?;
        let facility_history_ids: Vec<FacilityHistoryId> =
            serde_json::from_str(&facility_history_ids)
                .map_err(|e| RepoError::Serialization(e.to_string()))?;

        Ok(SagaRecord {
            id: SagaId::parse(&id)?,
            kind: kind.parse::<SagaKind>().map_err(RepoError::serialization)?,
            state: state.parse::<SagaState>().map_err(RepoError::serialization)?,
            event_id: event_id.as_deref().map(EventId::parse).transpose()?,
            task_ids,
            facility_history_ids,
            error: row.get("error"),
            created_at: parse_timestamp(&created_at)?,
            updated_at: parse_timestamp(&updated_at)?,
        })
    }
}

fn parse_timestamp(raw: &str) -> Result<chrono::DateTime<chrono::Utc>, RepoError> {
    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&chrono::Utc))
        .map_err(|e| RepoError::Serialization(format!("invalid timestamp '{}': {}", raw, e)))
}

#[async_trait]
impl SagaLogPort for SqliteSagaLog {
    async fn record(&self, saga: &SagaRecord) -> Result<(), RepoError> {
        let task_ids = serde_json::to_string(&saga.task_ids)
            .map_err(|e| RepoError::Serialization(e.to_string()))?;
        let facility_history_ids = serde_json::to_string(&saga.facility_history_ids)
            .map_err(|e| RepoError::Serialization(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO event_sagas
                (id, kind, state, event_id, task_ids, facility_history_ids, error, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                state = excluded.state,
                event_id = excluded.event_id,
                task_ids = excluded.task_ids,
                facility_history_ids = excluded.facility_history_ids,
                error = excluded.error,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(saga.id.to_string())
        .bind(saga.kind.as_str())
        .bind(saga.state.as_str())
        .bind(saga.event_id.map(|id| id.to_string()))
        .bind(task_ids)
        .bind(facility_history_ids)
        .bind(saga.error.as_deref())
        .bind(saga.created_at.to_rfc3339())
        .bind(saga.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::database("saga_log", e))?;

        Ok(())
    }

    async fn get(&self, id: SagaId) -> Result<Option<SagaRecord>, RepoError> {
        let row = sqlx::query("SELECT * FROM event_sagas WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepoError::database("saga_log", e))?;

        row.as_ref().map(Self::row_to_saga).transpose()
    }

    async fn list_unfinished(&self) -> Result<Vec<SagaRecord>, RepoError> {
        let rows = sqlx::query(
            "SELECT * FROM event_sagas
             WHERE state NOT IN ('committed', 'rolled_back')
             ORDER BY created_at",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepoError::database("saga_log", e))?;

        rows.iter().map(Self::row_to_saga).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    async fn journal() -> (tempfile::TempDir, SqliteSagaLog) {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("sagas.db");
        let log = SqliteSagaLog::new(path.to_str().expect("utf-8 path"))
            .await
            .expect("open journal");
        (dir, log)
    }

    #[tokio::test]
    async fn record_then_get_round_trips_ids_and_state() {
        let (_dir, log) = journal().await;
        let now = Utc.with_ymd_and_hms(2024, 4, 1, 12, 0, 0).unwrap();
        let saga = SagaRecord::begin(SagaKind::Create, None, now)
            .with_touched(vec![TaskId::new(), TaskId::new()], vec![FacilityHistoryId::new()]);

        log.record(&saga).await.unwrap();
        let loaded = log.get(saga.id).await.unwrap().expect("saga stored");
        assert_eq!(loaded, saga);
    }

    #[tokio::test]
    async fn upsert_moves_saga_out_of_unfinished() {
        let (_dir, log) = journal().await;
        let now = Utc.with_ymd_and_hms(2024, 4, 1, 12, 0, 0).unwrap();
        let mut saga = SagaRecord::begin(SagaKind::Update, Some(EventId::new()), now);
        log.record(&saga).await.unwrap();
        assert_eq!(log.list_unfinished().await.unwrap().len(), 1);

        saga.advance(SagaState::SubEntitiesCreated, now).unwrap();
        saga.advance(SagaState::EventPersisted, now).unwrap();
        saga.advance(SagaState::Committed, now).unwrap();
        log.record(&saga).await.unwrap();

        assert!(log.list_unfinished().await.unwrap().is_empty());
        let loaded = log.get(saga.id).await.unwrap().expect("saga stored");
        assert_eq!(loaded.state, SagaState::Committed);
    }

    #[tokio::test]
    async fn missing_saga_is_none() {
        let (_dir, log) = journal().await;
        assert!(log.get(SagaId::new()).await.unwrap().is_none());
    }
}
