//! Compensating actions for failed composite writes.
//!
//! A document that is already gone counts as compensated, so every action
//! here can be retried. All actions are attempted even after one fails; the
//! first failure is reported.

use netevent_domain::{EventId, FacilityHistory, FacilityHistoryId, Task, TaskId};

use super::EventStores;
use crate::infrastructure::ports::{EventUpdate, FacilityHistoryDraft, RepoError, TaskDraft};

/// Sub-entities an event pointed at before an update started.
#[derive(Debug, Clone, Default)]
pub(super) struct Backup {
    pub event_tasks: Vec<TaskId>,
    pub event_facility_histories: Vec<FacilityHistoryId>,
    pub tasks: Vec<Task>,
    pub facility_histories: Vec<FacilityHistory>,
}

impl Backup {
    pub fn task_ids(&self) -> Vec<TaskId> {
        self.tasks.iter().map(|t| t.id).collect()
    }

    pub fn facility_history_ids(&self) -> Vec<FacilityHistoryId> {
        self.facility_histories.iter().map(|h| h.id).collect()
    }
}

#[derive(Default)]
struct FirstFailure(Option<RepoError>);

impl FirstFailure {
    fn note<T>(&mut self, result: Result<T, RepoError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) if e.is_not_found() => None,
            Err(e) => {
                tracing::warn!(error = %e, "Compensating action failed");
                if self.0.is_none() {
                    self.0 = Some(e);
                }
                None
            }
        }
    }

    fn into_result(self) -> Result<(), RepoError> {
        match self.0 {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

async fn delete_all(
    stores: &EventStores,
    task_ids: &[TaskId],
    facility_history_ids: &[FacilityHistoryId],
    failures: &mut FirstFailure,
) {
    for id in task_ids {
        failures.note(stores.tasks.delete(*id).await);
    }
    for id in facility_history_ids {
        failures.note(stores.facility_histories.delete(*id).await);
    }
}

/// Undo a create: remove the sub-entities it made and, if it got that far,
/// the event document.
pub(super) async fn compensate_create(
    stores: &EventStores,
    task_ids: &[TaskId],
    facility_history_ids: &[FacilityHistoryId],
    event_id: Option<EventId>,
) -> Result<(), RepoError> {
    let mut failures = FirstFailure::default();
    delete_all(stores, task_ids, facility_history_ids, &mut failures).await;
    if let Some(id) = event_id {
        failures.note(stores.events.delete(id).await);
    }
    failures.into_result()
}

/// Undo an update's sub-entity changes.
///
/// Deletes everything the update touched plus any backed-up document that
/// still exists, re-creates the backup (same values and timestamps, new
/// identifiers), then points the event at the restored ids. The event's
/// `updated_at` is left as it was.
pub(super) async fn restore_update(
    stores: &EventStores,
    event_id: EventId,
    touched_tasks: &[TaskId],
    touched_facility_histories: &[FacilityHistoryId],
    backup: &Backup,
) -> Result<(), RepoError> {
    let mut failures = FirstFailure::default();

    let mut task_ids = touched_tasks.to_vec();
    for id in backup.task_ids() {
        if !task_ids.contains(&id) {
            task_ids.push(id);
        }
    }
    let mut facility_history_ids = touched_facility_histories.to_vec();
    for id in backup.facility_history_ids() {
        if !facility_history_ids.contains(&id) {
            facility_history_ids.push(id);
        }
    }
    delete_all(stores, &task_ids, &facility_history_ids, &mut failures).await;

    let mut restored_tasks: Vec<(TaskId, TaskId)> = Vec::new();
    for task in &backup.tasks {
        if let Some(created) = failures.note(stores.tasks.create(&TaskDraft::restore(task)).await) {
            restored_tasks.push((task.id, created.id));
        }
    }
    let mut restored_histories: Vec<(FacilityHistoryId, FacilityHistoryId)> = Vec::new();
    for history in &backup.facility_histories {
        let draft = FacilityHistoryDraft::restore(history);
        if let Some(created) = failures.note(stores.facility_histories.create(&draft).await) {
            restored_histories.push((history.id, created.id));
        }
    }

    let relink = EventUpdate::relink(
        remap(&backup.event_tasks, &restored_tasks),
        remap(&backup.event_facility_histories, &restored_histories),
    );
    failures.note(stores.events.update(event_id, &relink).await);

    let result = failures.into_result();
    tracing::info!(
        event_id = %event_id,
        restored_tasks = restored_tasks.len(),
        restored_facility_histories = restored_histories.len(),
        ok = result.is_ok(),
        "Update rolled back"
    );
    result
}

/// Map the event's original reference order onto restored ids.
///
/// Restored documents the event did not list are appended after the listed
/// ones; listed ids with no restored copy are dropped.
fn remap<Id: Copy + PartialEq>(order: &[Id], restored: &[(Id, Id)]) -> Vec<Id> {
    let mut ids: Vec<Id> = order
        .iter()
        .filter_map(|old| restored.iter().find(|(o, _)| o == old).map(|(_, new)| *new))
        .collect();
    for (old, new) in restored {
        if !order.contains(old) {
            ids.push(*new);
        }
    }
    ids
}
