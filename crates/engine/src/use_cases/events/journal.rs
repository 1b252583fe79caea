//! Saga journal for composite event writes.

use std::sync::Arc;

use netevent_domain::{EventId, FacilityHistoryId, SagaKind, SagaRecord, SagaState, TaskId};

use super::EventError;
use crate::infrastructure::ports::{ClockPort, RepoError, SagaLogPort};

/// Writes saga records through the journal port.
///
/// Only [`SagaJournal::begin`] can fail the caller: once side effects have
/// started, a journal write failure is logged and the operation carries on.
pub struct SagaJournal {
    log: Arc<dyn SagaLogPort>,
    clock: Arc<dyn ClockPort>,
}

impl SagaJournal {
    pub fn new(log: Arc<dyn SagaLogPort>, clock: Arc<dyn ClockPort>) -> Self {
        Self { log, clock }
    }

    /// Record the intent before any store write happens.
    pub async fn begin(
        &self,
        kind: SagaKind,
        event_id: Option<EventId>,
    ) -> Result<SagaRecord, EventError> {
        let saga = SagaRecord::begin(kind, event_id, self.clock.now());
        self.log.record(&saga).await.map_err(EventError::Repo)?;
        tracing::debug!(saga_id = %saga.id, kind = %kind, "Saga started");
        Ok(saga)
    }

    /// Persist the ids the fan-out has touched so far.
    pub async fn touched(
        &self,
        saga: &mut SagaRecord,
        task_ids: &[TaskId],
        facility_history_ids: &[FacilityHistoryId],
    ) {
        saga.task_ids = task_ids.to_vec();
        saga.facility_history_ids = facility_history_ids.to_vec();
        saga.updated_at = self.clock.now();
        self.save(saga).await;
    }

    pub async fn event_persisted(&self, saga: &mut SagaRecord, event_id: EventId) {
        saga.event_id = Some(event_id);
        self.advance(saga, SagaState::EventPersisted).await;
    }

    pub async fn advance(&self, saga: &mut SagaRecord, next: SagaState) {
        if let Err(e) = saga.advance(next, self.clock.now()) {
            tracing::error!(saga_id = %saga.id, error = %e, "Rejected saga transition");
            return;
        }
        self.save(saga).await;
    }

    /// Enter a failure state, keeping the error text for recovery.
    pub async fn fail(&self, saga: &mut SagaRecord, next: SagaState, error: &str) {
        saga.error = Some(error.to_string());
        self.advance(saga, next).await;
    }

    pub async fn unfinished(&self) -> Result<Vec<SagaRecord>, RepoError> {
        self.log.list_unfinished().await
    }

    async fn save(&self, saga: &SagaRecord) {
        if let Err(e) = self.log.record(saga).await {
            tracing::warn!(
                saga_id = %saga.id,
                state = %saga.state,
                error = %e,
                "Failed to journal saga progress"
            );
        }
    }
}
