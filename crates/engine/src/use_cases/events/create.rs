//! Create an event together with its tasks and facility histories.

use std::sync::Arc;
use std::time::Duration;

use netevent_domain::{
    Event, EventId, EventTypeId, FacilityHistoryId, FacilityId, SagaKind, SagaRecord, SagaState,
    TaskId, UserId,
};
use netevent_shared::{FacilityHistoryInput, NewEvent, TaskInput};
use tokio_util::sync::CancellationToken;

use super::fan_out::{run_unit, run_with_deadline, BatchOutcome};
use super::journal::SagaJournal;
use super::rollback::compensate_create;
use super::{custom_fields, EventError, EventStores};
use crate::infrastructure::ports::{EventDraft, FacilityHistoryDraft, TaskDraft};
use crate::use_cases::validation::{parse_id, ValidationErrors};

/// Creates an event and its inline sub-entities as one composite write.
///
/// Tasks and facility histories are created by two concurrent units (items
/// within a unit are sequential), then the event is persisted with the
/// collected ids, then every sub-entity is back-linked. Any failure along
/// the way removes everything created so far.
pub struct CreateEvent {
    stores: EventStores,
    journal: Arc<SagaJournal>,
    deadline: Option<Duration>,
}

impl CreateEvent {
    pub fn new(stores: EventStores, journal: Arc<SagaJournal>, deadline: Option<Duration>) -> Self {
        Self {
            stores,
            journal,
            deadline,
        }
    }

    pub async fn execute(&self, input: NewEvent) -> Result<Event, EventError> {
        self.execute_with_cancel(input, CancellationToken::new()).await
    }

    /// Like [`execute`](Self::execute), but stops early (and rolls back)
    /// once `cancel` fires.
    pub async fn execute_with_cancel(
        &self,
        input: NewEvent,
        cancel: CancellationToken,
    ) -> Result<Event, EventError> {
        run_with_deadline(self.deadline, &cancel, |token| self.run(input, token)).await
    }

    async fn run(&self, input: NewEvent, cancel: CancellationToken) -> Result<Event, EventError> {
        let mut saga = self.journal.begin(SagaKind::Create, None).await?;

        let (task_outcome, history_outcome) = tokio::join!(
            self.create_tasks(&input.tasks, &cancel),
            self.create_facility_histories(&input.facility_histories, &cancel),
        );
        let (task_ids, task_error) = task_outcome.into_parts();
        let (history_ids, history_error) = history_outcome.into_parts();
        self.journal
            .touched(&mut saga, &task_ids, &history_ids)
            .await;

        if let Some(error) = task_error.or(history_error) {
            return Err(self.abort(&mut saga, error, None).await);
        }
        self.journal
            .advance(&mut saga, SagaState::SubEntitiesCreated)
            .await;

        if cancel.is_cancelled() {
            return Err(self.abort(&mut saga, EventError::Cancelled, None).await);
        }

        let draft = match event_draft(&input, task_ids.clone(), history_ids.clone()) {
            Ok(draft) => draft,
            Err(error) => return Err(self.abort(&mut saga, error, None).await),
        };
        let event = match self.stores.events.create(&draft).await {
            Ok(event) => event,
            Err(error) => return Err(self.abort(&mut saga, error.into(), None).await),
        };
        self.journal.event_persisted(&mut saga, event.id).await;

        if let Err(error) = back_link(&self.stores, event.id, &task_ids, &history_ids).await {
            return Err(self.abort(&mut saga, error, Some(event.id)).await);
        }
        self.journal.advance(&mut saga, SagaState::BackLinked).await;
        self.journal.advance(&mut saga, SagaState::Committed).await;

        tracing::info!(
            event_id = %event.id,
            saga_id = %saga.id,
            tasks = task_ids.len(),
            facility_histories = history_ids.len(),
            "Event created"
        );
        Ok(event)
    }

    async fn create_tasks(
        &self,
        inputs: &[TaskInput],
        cancel: &CancellationToken,
    ) -> BatchOutcome<TaskId> {
        run_unit(inputs, cancel, |index, input| async move {
            let draft = task_draft(&self.stores, index, input, None).await?;
            Ok::<_, EventError>(self.stores.tasks.create(&draft).await?.id)
        })
        .await
    }

    async fn create_facility_histories(
        &self,
        inputs: &[FacilityHistoryInput],
        cancel: &CancellationToken,
    ) -> BatchOutcome<FacilityHistoryId> {
        run_unit(inputs, cancel, |index, input| async move {
            let draft = facility_history_draft(&self.stores, index, input, None).await?;
            Ok::<_, EventError>(self.stores.facility_histories.create(&draft).await?.id)
        })
        .await
    }

    /// Compensate and pick the error the caller sees.
    async fn abort(
        &self,
        saga: &mut SagaRecord,
        error: EventError,
        event_id: Option<EventId>,
    ) -> EventError {
        tracing::warn!(saga_id = %saga.id, error = %error, "Event create failed, compensating");
        let cause = error.to_string();
        self.journal
            .fail(saga, SagaState::RollingBack, &cause)
            .await;

        let task_ids = saga.task_ids.clone();
        let history_ids = saga.facility_history_ids.clone();
        match compensate_create(&self.stores, &task_ids, &history_ids, event_id).await {
            Ok(()) => {
                self.journal.advance(saga, SagaState::RolledBack).await;
                error
            }
            Err(source) => {
                tracing::error!(
                    saga_id = %saga.id,
                    error = %source,
                    "Event create compensation failed; partial data may remain"
                );
                self.journal.advance(saga, SagaState::RollbackFailed).await;
                EventError::RollbackFailed { cause, source }
            }
        }
    }
}

/// Point every created sub-entity at `event_id`.
pub(super) async fn back_link(
    stores: &EventStores,
    event_id: EventId,
    task_ids: &[TaskId],
    facility_history_ids: &[FacilityHistoryId],
) -> Result<(), EventError> {
    let now = stores.clock.now();
    let (tasks, histories) = tokio::join!(
        async {
            for id in task_ids {
                stores.tasks.set_event(*id, event_id, now).await?;
            }
            Ok::<_, EventError>(())
        },
        async {
            for id in facility_history_ids {
                stores.facility_histories.set_event(*id, event_id, now).await?;
            }
            Ok::<_, EventError>(())
        },
    );
    tasks.and(histories)
}

/// Parse and existence-check a task's references.
pub(super) async fn task_draft(
    stores: &EventStores,
    index: usize,
    input: &TaskInput,
    event: Option<EventId>,
) -> Result<TaskDraft, EventError> {
    let field = format!("tasks[{index}].userId");
    let user: UserId = parse_id(&input.user_id, &field)?;
    if !stores.references.user_exists(user).await? {
        return Err(EventError::InvalidReference {
            field,
            entity: "User",
            id: user.to_string(),
        });
    }
    Ok(TaskDraft {
        event,
        name: input.name.clone(),
        user,
        task_type: input.task_type.clone(),
        start_date: input.start_date,
        end_date: input.end_date,
        created_at: None,
        updated_at: None,
    })
}

/// Parse and existence-check a facility history's references.
pub(super) async fn facility_history_draft(
    stores: &EventStores,
    index: usize,
    input: &FacilityHistoryInput,
    event: Option<EventId>,
) -> Result<FacilityHistoryDraft, EventError> {
    let field = format!("facilityHistories[{index}].facilityId");
    let facility: FacilityId = parse_id(&input.facility_id, &field)?;
    if !stores.references.facility_exists(facility).await? {
        return Err(EventError::InvalidReference {
            field,
            entity: "Facility",
            id: facility.to_string(),
        });
    }
    Ok(FacilityHistoryDraft {
        facility,
        borrow_date: input.borrow_date,
        return_date: input.return_date,
        event,
        created_at: None,
        updated_at: None,
    })
}

/// The event document for a create. Fresh events are unapproved,
/// unfinished, not deleted and have no reviewer.
fn event_draft(
    input: &NewEvent,
    tasks: Vec<TaskId>,
    facility_histories: Vec<FacilityHistoryId>,
) -> Result<EventDraft, EventError> {
    let mut errors = ValidationErrors::new();
    let event_type = errors.check(parse_id::<EventTypeId>(&input.event_type_id, "eventTypeId"));
    let owner = errors.check(parse_id::<UserId>(&input.owner_id, "ownerId"));
    let (Some(event_type), Some(owner)) = (event_type, owner) else {
        return Err(EventError::Validation(errors));
    };

    Ok(EventDraft {
        tags: input.tags.clone(),
        is_approved: false,
        reviewer: None,
        is_finished: false,
        tasks,
        facility_histories,
        name: input.name.trim().to_string(),
        language: input.language.clone(),
        event_type,
        mode: input.mode.clone(),
        location: input.location.clone(),
        accommodation: input.accommodation.clone(),
        registration_close_date: input.registration_close_date,
        start_date: input.start_date,
        end_date: input.end_date,
        max_participants: input.max_participants,
        description: input.description.clone(),
        owner,
        budget: input.budget,
        image: input.image.clone(),
        is_deleted: false,
        custom_fields: custom_fields(&input.custom_fields),
        created_at: None,
        updated_at: None,
    })
}
