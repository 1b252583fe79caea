//! Update an event and reconcile its tasks and facility histories.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use netevent_domain::{
    Event, EventId, EventTypeId, FacilityHistoryId, SagaKind, SagaRecord, SagaState, TaskId,
    UserId,
};
use netevent_shared::{FacilityHistoryInput, TaskInput, UpdateEvent as UpdateEventInput};
use tokio_util::sync::CancellationToken;

use super::create::{facility_history_draft, task_draft};
use super::fan_out::{run_unit, run_with_deadline, BatchOutcome};
use super::journal::SagaJournal;
use super::rollback::{restore_update, Backup};
use super::{custom_fields, EventError, EventStores};
use crate::infrastructure::ports::{
    EventUpdate, FacilityHistoryUpdate, IdRef, RepoError, TaskUpdate,
};
use crate::use_cases::validation::{parse_id, ValidationErrors};

/// Replaces an event's fields and reconciles its sub-entities.
///
/// Payload entries with an id overwrite that document in place and must name
/// one the event already owns; entries without one are created linked to the
/// event. Previously linked documents
/// the payload no longer mentions are deleted. On failure the sub-entities
/// are restored from a snapshot taken before any write; restored documents
/// get new identifiers.
pub struct UpdateEvent {
    stores: EventStores,
    journal: Arc<SagaJournal>,
    deadline: Option<Duration>,
}

impl UpdateEvent {
    pub fn new(stores: EventStores, journal: Arc<SagaJournal>, deadline: Option<Duration>) -> Self {
        Self {
            stores,
            journal,
            deadline,
        }
    }

    pub async fn execute(
        &self,
        id: impl Into<IdRef<EventId>>,
        input: UpdateEventInput,
    ) -> Result<Event, EventError> {
        self.execute_with_cancel(id, input, CancellationToken::new())
            .await
    }

    pub async fn execute_with_cancel(
        &self,
        id: impl Into<IdRef<EventId>>,
        input: UpdateEventInput,
        cancel: CancellationToken,
    ) -> Result<Event, EventError> {
        let id = id.into().resolve()?;
        run_with_deadline(self.deadline, &cancel, |token| self.run(id, input, token)).await
    }

    async fn run(
        &self,
        event_id: EventId,
        input: UpdateEventInput,
        cancel: CancellationToken,
    ) -> Result<Event, EventError> {
        let current = self.stores.events.get(event_id).await?;
        let backup = self.snapshot(&current).await?;

        let task_refs = owned_ids(
            input.tasks.iter().map(|t| t.id.as_deref()),
            &backup.task_ids(),
            "tasks",
            "Task",
        )?;
        let history_refs = owned_ids(
            input.facility_histories.iter().map(|h| h.id.as_deref()),
            &backup.facility_history_ids(),
            "facilityHistories",
            "FacilityHistory",
        )?;

        let mut saga = self.journal.begin(SagaKind::Update, Some(event_id)).await?;

        let (tasks, histories) = tokio::join!(
            self.reconcile_tasks(event_id, &input.tasks, &task_refs, &backup, &cancel),
            self.reconcile_facility_histories(
                event_id,
                &input.facility_histories,
                &history_refs,
                &backup,
                &cancel,
            ),
        );
        let (task_ids, task_error) = tasks.into_parts();
        let (history_ids, history_error) = histories.into_parts();
        self.journal
            .touched(&mut saga, &task_ids, &history_ids)
            .await;

        if let Some(error) = task_error.or(history_error) {
            return Err(self.abort(&mut saga, event_id, error, &backup).await);
        }
        self.journal
            .advance(&mut saga, SagaState::SubEntitiesCreated)
            .await;

        if cancel.is_cancelled() {
            return Err(self
                .abort(&mut saga, event_id, EventError::Cancelled, &backup)
                .await);
        }

        let now = self.stores.clock.now();
        let update = match event_update(&input, task_ids.clone(), history_ids.clone(), now) {
            Ok(update) => update,
            Err(error) => return Err(self.abort(&mut saga, event_id, error, &backup).await),
        };
        let event = match self.stores.events.update(event_id, &update).await {
            Ok(event) => event,
            Err(error) => {
                return Err(self
                    .abort(&mut saga, event_id, error.into(), &backup)
                    .await)
            }
        };
        self.journal.event_persisted(&mut saga, event_id).await;
        self.journal.advance(&mut saga, SagaState::Committed).await;

        tracing::info!(
            event_id = %event_id,
            saga_id = %saga.id,
            tasks = task_ids.len(),
            facility_histories = history_ids.len(),
            "Event updated"
        );
        Ok(event)
    }

    /// Every sub-entity the event references or that links back to it.
    async fn snapshot(&self, current: &Event) -> Result<Backup, EventError> {
        let mut tasks = self.stores.tasks.find_many(&current.tasks).await?;
        for task in self.stores.tasks.find_by_event(current.id).await? {
            if !tasks.iter().any(|t| t.id == task.id) {
                tasks.push(task);
            }
        }

        let mut facility_histories = self
            .stores
            .facility_histories
            .find_many(&current.facility_histories)
            .await?;
        for history in self.stores.facility_histories.find_by_event(current.id).await? {
            if !facility_histories.iter().any(|h| h.id == history.id) {
                facility_histories.push(history);
            }
        }

        Ok(Backup {
            event_tasks: current.tasks.clone(),
            event_facility_histories: current.facility_histories.clone(),
            tasks,
            facility_histories,
        })
    }

    async fn reconcile_tasks(
        &self,
        event_id: EventId,
        inputs: &[TaskInput],
        ids: &[Option<TaskId>],
        backup: &Backup,
        cancel: &CancellationToken,
    ) -> BatchOutcome<TaskId> {
        let unreferenced: Vec<TaskId> = backup
            .task_ids()
            .into_iter()
            .filter(|id| !ids.contains(&Some(*id)))
            .collect();

        let outcome = run_unit(inputs.iter().zip(ids), cancel, |index, (input, id)| async move {
            match *id {
                None => {
                    let draft = task_draft(&self.stores, index, input, Some(event_id)).await?;
                    Ok::<_, EventError>(self.stores.tasks.create(&draft).await?.id)
                }
                Some(id) => {
                    let draft = task_draft(&self.stores, index, input, Some(event_id)).await?;
                    let overwrite = TaskUpdate {
                        event: Some(event_id),
                        name: Some(draft.name),
                        user: Some(draft.user),
                        task_type: Some(draft.task_type),
                        start_date: Some(draft.start_date),
                        end_date: Some(draft.end_date),
                        updated_at: Some(self.stores.clock.now()),
                    };
                    Ok(self.stores.tasks.update(id, &overwrite).await?.id)
                }
            }
        })
        .await;

        self.drop_unreferenced(outcome, &unreferenced, |id| async move {
            self.stores.tasks.delete(id).await.map(|_| ())
        })
        .await
    }

    async fn reconcile_facility_histories(
        &self,
        event_id: EventId,
        inputs: &[FacilityHistoryInput],
        ids: &[Option<FacilityHistoryId>],
        backup: &Backup,
        cancel: &CancellationToken,
    ) -> BatchOutcome<FacilityHistoryId> {
        let unreferenced: Vec<FacilityHistoryId> = backup
            .facility_history_ids()
            .into_iter()
            .filter(|id| !ids.contains(&Some(*id)))
            .collect();

        let outcome = run_unit(inputs.iter().zip(ids), cancel, |index, (input, id)| async move {
            match *id {
                None => {
                    let draft =
                        facility_history_draft(&self.stores, index, input, Some(event_id)).await?;
                    Ok::<_, EventError>(self.stores.facility_histories.create(&draft).await?.id)
                }
                Some(id) => {
                    let draft =
                        facility_history_draft(&self.stores, index, input, Some(event_id)).await?;
                    let overwrite = FacilityHistoryUpdate {
                        facility: Some(draft.facility),
                        borrow_date: Some(draft.borrow_date),
                        return_date: Some(draft.return_date),
                        event: Some(event_id),
                        updated_at: Some(self.stores.clock.now()),
                    };
                    Ok(self.stores.facility_histories.update(id, &overwrite).await?.id)
                }
            }
        })
        .await;

        self.drop_unreferenced(outcome, &unreferenced, |id| async move {
            self.stores.facility_histories.delete(id).await.map(|_| ())
        })
        .await
    }

    /// Delete pre-existing documents the payload no longer lists.
    ///
    /// Runs whether or not the unit succeeded; a failed unit's rollback
    /// restores them from the snapshot. A delete failure fails a unit that
    /// had otherwise completed.
    async fn drop_unreferenced<Id, F, Fut>(
        &self,
        outcome: BatchOutcome<Id>,
        unreferenced: &[Id],
        delete: F,
    ) -> BatchOutcome<Id>
    where
        Id: Copy + std::fmt::Display,
        F: Fn(Id) -> Fut,
        Fut: std::future::Future<Output = Result<(), RepoError>>,
    {
        let mut first_error = None;
        for id in unreferenced {
            match delete(*id).await {
                Ok(()) => tracing::debug!(id = %id, "Removed unreferenced sub-entity"),
                Err(e) if e.is_not_found() => {}
                Err(e) => {
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }

        match (outcome, first_error) {
            (BatchOutcome::Completed(touched), Some(e)) => BatchOutcome::Failed {
                touched,
                error: e.into(),
            },
            (outcome, _) => outcome,
        }
    }

    async fn abort(
        &self,
        saga: &mut SagaRecord,
        event_id: EventId,
        error: EventError,
        backup: &Backup,
    ) -> EventError {
        tracing::warn!(
            saga_id = %saga.id,
            event_id = %event_id,
            error = %error,
            "Event update failed, restoring sub-entities"
        );
        let cause = error.to_string();
        self.journal
            .fail(saga, SagaState::RollingBack, &cause)
            .await;

        let task_ids = saga.task_ids.clone();
        let history_ids = saga.facility_history_ids.clone();
        match restore_update(&self.stores, event_id, &task_ids, &history_ids, backup).await {
            Ok(()) => {
                self.journal.advance(saga, SagaState::RolledBack).await;
                error
            }
            Err(source) => {
                tracing::error!(
                    saga_id = %saga.id,
                    event_id = %event_id,
                    error = %source,
                    "Event update rollback failed; partial data may remain"
                );
                self.journal.advance(saga, SagaState::RollbackFailed).await;
                EventError::RollbackFailed { cause, source }
            }
        }
    }
}

/// Parse the payload's sub-entity ids, one slot per entry.
///
/// Every id must name a document the event already owns; anything else is
/// NotFound. Runs before any write.
fn owned_ids<'a, Id>(
    raw_ids: impl Iterator<Item = Option<&'a str>>,
    owned: &[Id],
    list: &str,
    entity_type: &'static str,
) -> Result<Vec<Option<Id>>, EventError>
where
    Id: FromStr + PartialEq + fmt::Display,
    Id::Err: fmt::Display,
{
    raw_ids
        .enumerate()
        .map(|(index, raw)| {
            let Some(raw) = raw else { return Ok(None) };
            let id: Id = parse_id(raw, &format!("{list}[{index}].id"))?;
            if !owned.contains(&id) {
                return Err(EventError::NotFound {
                    entity_type,
                    id: id.to_string(),
                });
            }
            Ok(Some(id))
        })
        .collect()
}

/// Full replacement of the event's fields. `created_at` is never touched.
fn event_update(
    input: &UpdateEventInput,
    tasks: Vec<TaskId>,
    facility_histories: Vec<FacilityHistoryId>,
    now: chrono::DateTime<chrono::Utc>,
) -> Result<EventUpdate, EventError> {
    let mut errors = ValidationErrors::new();
    let event_type = errors.check(parse_id::<EventTypeId>(&input.event_type_id, "eventTypeId"));
    let owner = errors.check(parse_id::<UserId>(&input.owner_id, "ownerId"));
    let reviewer = match input.reviewer.as_deref().map(str::trim) {
        None | Some("") => Some(None),
        Some(raw) => errors.check(parse_id::<UserId>(raw, "reviewer")).map(Some),
    };
    let (Some(event_type), Some(owner), Some(reviewer)) = (event_type, owner, reviewer) else {
        return Err(EventError::Validation(errors));
    };

    Ok(EventUpdate {
        tags: Some(input.tags.clone()),
        is_approved: Some(input.is_approved),
        reviewer: Some(reviewer),
        is_finished: Some(input.is_finished),
        tasks: Some(tasks),
        facility_histories: Some(facility_histories),
        name: Some(input.name.trim().to_string()),
        language: Some(input.language.clone()),
        event_type: Some(event_type),
        mode: Some(input.mode.clone()),
        location: Some(input.location.clone()),
        accommodation: Some(input.accommodation.clone()),
        registration_close_date: Some(input.registration_close_date),
        start_date: Some(input.start_date),
        end_date: Some(input.end_date),
        max_participants: Some(input.max_participants),
        description: Some(input.description.clone()),
        owner: Some(owner),
        budget: Some(input.budget),
        image: Some(input.image.clone()),
        is_deleted: Some(input.is_deleted),
        custom_fields: Some(custom_fields(&input.custom_fields)),
        updated_at: Some(now),
    })
}
