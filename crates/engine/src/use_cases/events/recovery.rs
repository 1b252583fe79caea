//! Startup resolution of composite writes interrupted by a crash.

use std::sync::Arc;

use netevent_domain::{SagaId, SagaKind, SagaRecord, SagaState};

use super::create::back_link;
use super::journal::SagaJournal;
use super::rollback::compensate_create;
use super::{EventError, EventStores};

/// What recovery did with each unfinished saga.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecoveryReport {
    /// Create sagas undone by deleting what they wrote
    pub compensated: Vec<SagaId>,
    /// Create sagas finished by the back-link pass
    pub rolled_forward: Vec<SagaId>,
    /// Sagas that only lacked the final state
    pub committed: Vec<SagaId>,
    /// Update sagas; their backup is not journaled, so they are left alone
    pub needs_attention: Vec<SagaId>,
    /// Compensation failed again
    pub failed: Vec<SagaId>,
}

impl RecoveryReport {
    pub fn is_empty(&self) -> bool {
        self.compensated.is_empty()
            && self.rolled_forward.is_empty()
            && self.committed.is_empty()
            && self.needs_attention.is_empty()
            && self.failed.is_empty()
    }
}

pub struct RecoverSagas {
    stores: EventStores,
    journal: Arc<SagaJournal>,
}

impl RecoverSagas {
    pub fn new(stores: EventStores, journal: Arc<SagaJournal>) -> Self {
        Self { stores, journal }
    }

    pub async fn execute(&self) -> Result<RecoveryReport, EventError> {
        let sagas = self.journal.unfinished().await?;
        let mut report = RecoveryReport::default();

        for mut saga in sagas {
            match saga.kind {
                SagaKind::Update => {
                    tracing::warn!(
                        saga_id = %saga.id,
                        event_id = ?saga.event_id,
                        state = %saga.state,
                        "Interrupted event update needs manual attention"
                    );
                    report.needs_attention.push(saga.id);
                }
                SagaKind::Create => self.recover_create(&mut saga, &mut report).await,
            }
        }

        if !report.is_empty() {
            tracing::info!(
                compensated = report.compensated.len(),
                rolled_forward = report.rolled_forward.len(),
                committed = report.committed.len(),
                needs_attention = report.needs_attention.len(),
                failed = report.failed.len(),
                "Saga recovery finished"
            );
        }
        Ok(report)
    }

    async fn recover_create(&self, saga: &mut SagaRecord, report: &mut RecoveryReport) {
        match (saga.state, saga.event_id) {
            (SagaState::BackLinked, _) => {
                self.journal.advance(saga, SagaState::Committed).await;
                report.committed.push(saga.id);
            }
            (SagaState::EventPersisted, Some(event_id)) => {
                let tasks = saga.task_ids.clone();
                let histories = saga.facility_history_ids.clone();
                match back_link(&self.stores, event_id, &tasks, &histories).await {
                    Ok(()) => {
                        self.journal.advance(saga, SagaState::BackLinked).await;
                        self.journal.advance(saga, SagaState::Committed).await;
                        tracing::info!(saga_id = %saga.id, event_id = %event_id, "Rolled event create forward");
                        report.rolled_forward.push(saga.id);
                    }
                    Err(e) => {
                        tracing::warn!(saga_id = %saga.id, error = %e, "Roll-forward failed, compensating");
                        self.compensate(saga, &e.to_string(), report).await;
                    }
                }
            }
            _ => self.compensate(saga, "interrupted before commit", report).await,
        }
    }

    async fn compensate(&self, saga: &mut SagaRecord, cause: &str, report: &mut RecoveryReport) {
        if saga.state != SagaState::RollingBack {
            self.journal.fail(saga, SagaState::RollingBack, cause).await;
        }

        let tasks = saga.task_ids.clone();
        let histories = saga.facility_history_ids.clone();
        match compensate_create(&self.stores, &tasks, &histories, saga.event_id).await {
            Ok(()) => {
                self.journal.advance(saga, SagaState::RolledBack).await;
                report.compensated.push(saga.id);
            }
            Err(e) => {
                tracing::error!(saga_id = %saga.id, error = %e, "Saga compensation failed again");
                self.journal.advance(saga, SagaState::RollbackFailed).await;
                report.failed.push(saga.id);
            }
        }
    }
}
