//! End-to-end scenarios for the consistency engine over the in-memory store.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use netevent_domain::{
    EventId, EventTypeId, FacilityHistory, FacilityId, SagaKind, SagaRecord, SagaState, Task,
    TaskId, UserId,
};
use netevent_shared::{
    FacilityHistoryInput, NewEvent, TaskInput, UpdateEvent as UpdateEventInput,
};
use tokio_util::sync::CancellationToken;

use super::{EventError, EventStores, EventUseCases};
use crate::use_cases::validation::ValidationError;
use crate::infrastructure::clock::FixedClock;
use crate::infrastructure::memory::{Collection, InMemoryStore, Op};
use crate::infrastructure::ports::{SagaLogPort, TaskDraft, TaskRepo};
use crate::repositories::{
    EventRepository, FacilityHistoryRepository, ReferenceLookup, TaskRepository,
};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

fn day(d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, d, 9, 0, 0).unwrap()
}

struct Harness {
    store: Arc<InMemoryStore>,
    stores: EventStores,
    events: EventUseCases,
    user: UserId,
    facility: FacilityId,
    event_type: EventTypeId,
}

fn harness_with_deadline(deadline: Option<Duration>) -> Harness {
    let clock = Arc::new(FixedClock(now()));
    let store = Arc::new(InMemoryStore::new(clock.clone()));
    let user = UserId::new();
    let facility = FacilityId::new();
    let event_type = EventTypeId::new();
    store.add_user(user);
    store.add_facility(facility);
    store.add_event_type(event_type);

    let stores = EventStores {
        events: Arc::new(EventRepository::new(store.clone())),
        tasks: Arc::new(TaskRepository::new(store.clone())),
        facility_histories: Arc::new(FacilityHistoryRepository::new(store.clone())),
        references: Arc::new(ReferenceLookup::new(store.clone())),
        clock,
    };
    let events = EventUseCases::new(stores.clone(), store.clone(), deadline);
    Harness {
        store,
        stores,
        events,
        user,
        facility,
        event_type,
    }
}

fn harness() -> Harness {
    harness_with_deadline(None)
}

impl Harness {
    fn task(&self, name: &str) -> TaskInput {
        TaskInput {
            id: None,
            name: name.to_string(),
            user_id: self.user.to_string(),
            task_type: "logistics".to_string(),
            start_date: day(1),
            end_date: day(2),
        }
    }

    fn facility_history(&self) -> FacilityHistoryInput {
        FacilityHistoryInput {
            id: None,
            facility_id: self.facility.to_string(),
            borrow_date: day(10),
            return_date: day(11),
        }
    }

    fn new_event(&self, tasks: usize, facility_histories: usize) -> NewEvent {
        NewEvent {
            tags: vec!["community".to_string()],
            tasks: (0..tasks).map(|i| self.task(&format!("task {i}"))).collect(),
            facility_histories: (0..facility_histories)
                .map(|_| self.facility_history())
                .collect(),
            name: "Spring Meetup".to_string(),
            language: "en".to_string(),
            event_type_id: self.event_type.to_string(),
            mode: "offline".to_string(),
            location: "Hall A".to_string(),
            accommodation: "none".to_string(),
            registration_close_date: day(5),
            start_date: day(10),
            end_date: day(11),
            max_participants: 50,
            description: "Quarterly meetup".to_string(),
            owner_id: self.user.to_string(),
            budget: 250.0,
            image: "cover.png".to_string(),
            custom_fields: vec![],
        }
    }

    fn update_of(&self, input: &NewEvent) -> UpdateEventInput {
        UpdateEventInput {
            tags: input.tags.clone(),
            tasks: vec![],
            facility_histories: vec![],
            name: input.name.clone(),
            language: input.language.clone(),
            event_type_id: input.event_type_id.clone(),
            mode: input.mode.clone(),
            location: input.location.clone(),
            accommodation: input.accommodation.clone(),
            registration_close_date: input.registration_close_date,
            start_date: input.start_date,
            end_date: input.end_date,
            max_participants: input.max_participants,
            description: input.description.clone(),
            owner_id: input.owner_id.clone(),
            budget: input.budget,
            image: input.image.clone(),
            is_approved: true,
            reviewer: None,
            is_finished: false,
            is_deleted: false,
            custom_fields: vec![],
        }
    }

    fn assert_empty(&self) {
        assert_eq!(self.store.event_count(), 0, "events left behind");
        assert_eq!(self.store.task_count(), 0, "tasks left behind");
        assert_eq!(self.store.facility_history_count(), 0, "facility histories left behind");
    }

    async fn assert_no_open_sagas(&self) {
        let open = self.store.list_unfinished().await.unwrap();
        assert!(open.is_empty(), "unfinished sagas: {open:?}");
    }
}

// =============================================================================
// Create
// =============================================================================

#[tokio::test]
async fn create_links_every_sub_entity_to_the_event() {
    let h = harness();
    let event = h.events.create.execute(h.new_event(2, 1)).await.unwrap();

    assert_eq!(event.tasks.len(), 2);
    assert_eq!(event.facility_histories.len(), 1);
    assert!(!event.is_approved && !event.is_finished && !event.is_deleted);
    assert_eq!(event.reviewer, None);

    let tasks = h.stores.tasks.find_many(&event.tasks).await.unwrap();
    assert_eq!(tasks.len(), 2);
    assert!(tasks.iter().all(|t| t.is_linked_to(event.id)));
    assert_eq!(tasks[0].name, "task 0");
    assert_eq!(tasks[1].name, "task 1");

    let histories = h
        .stores
        .facility_histories
        .find_by_event(event.id)
        .await
        .unwrap();
    assert_eq!(histories.len(), 1);
    assert_eq!(histories[0].id, event.facility_histories[0]);

    h.assert_no_open_sagas().await;
}

#[tokio::test]
async fn create_without_sub_entities_persists_the_event_only() {
    let h = harness();
    let event = h.events.create.execute(h.new_event(0, 0)).await.unwrap();

    assert!(event.tasks.is_empty());
    assert_eq!(h.store.event_count(), 1);
    assert_eq!(h.store.task_count(), 0);
}

#[tokio::test]
async fn failed_facility_history_insert_removes_everything() {
    let h = harness();
    h.store.fail_nth(Collection::FacilityHistories, Op::Create, 2);

    let err = h.events.create.execute(h.new_event(2, 2)).await.unwrap_err();

    assert!(matches!(err, EventError::Repo(_)), "got {err:?}");
    assert_eq!(h.store.calls(Collection::Events, Op::Create), 0);
    h.assert_empty();
    h.assert_no_open_sagas().await;
}

#[tokio::test]
async fn unknown_task_user_fails_the_create_and_rolls_back() {
    let h = harness();
    let mut input = h.new_event(2, 1);
    input.tasks[1].user_id = UserId::new().to_string();

    let err = h.events.create.execute(input).await.unwrap_err();

    assert!(
        matches!(err, EventError::InvalidReference { ref field, entity: "User", .. } if field == "tasks[1].userId"),
        "got {err:?}"
    );
    h.assert_empty();
}

#[tokio::test]
async fn failed_event_insert_removes_sub_entities() {
    let h = harness();
    h.store.fail_nth(Collection::Events, Op::Create, 1);

    let err = h.events.create.execute(h.new_event(3, 2)).await.unwrap_err();

    assert!(matches!(err, EventError::Repo(_)));
    assert_eq!(h.store.calls(Collection::Tasks, Op::DeleteOne), 3);
    assert_eq!(h.store.calls(Collection::FacilityHistories, Op::DeleteOne), 2);
    h.assert_empty();
}

#[tokio::test]
async fn failed_back_link_removes_the_event_as_well() {
    let h = harness();
    h.store.fail_nth(Collection::Tasks, Op::UpdateOne, 2);

    let err = h.events.create.execute(h.new_event(2, 1)).await.unwrap_err();

    assert!(matches!(err, EventError::Repo(_)));
    h.assert_empty();
    h.assert_no_open_sagas().await;
}

#[tokio::test]
async fn failed_compensation_is_reported_and_left_for_recovery() {
    let h = harness();
    h.store.fail_nth(Collection::Events, Op::Create, 1);
    h.store.fail_nth(Collection::Tasks, Op::DeleteOne, 1);

    let err = h.events.create.execute(h.new_event(2, 0)).await.unwrap_err();

    assert!(matches!(err, EventError::RollbackFailed { .. }), "got {err:?}");
    // The second task was still removed.
    assert_eq!(h.store.task_count(), 1);

    let open = h.store.list_unfinished().await.unwrap();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].state, SagaState::RollbackFailed);

    let report = h.events.recover.execute().await.unwrap();
    assert_eq!(report.compensated, vec![open[0].id]);
    h.assert_empty();
}

#[tokio::test]
async fn cancelled_create_rolls_back() {
    let h = harness();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = h
        .events
        .create
        .execute_with_cancel(h.new_event(2, 1), cancel)
        .await
        .unwrap_err();

    assert!(matches!(err, EventError::Cancelled));
    h.assert_empty();
    h.assert_no_open_sagas().await;
}

#[tokio::test]
async fn create_within_deadline_succeeds() {
    let h = harness_with_deadline(Some(Duration::from_secs(30)));
    let event = h.events.create.execute(h.new_event(1, 1)).await.unwrap();
    assert_eq!(event.tasks.len(), 1);
}

// =============================================================================
// Update
// =============================================================================

#[tokio::test]
async fn update_overwrites_creates_and_drops_sub_entities() {
    let h = harness();
    let created_input = h.new_event(2, 1);
    let created = h.events.create.execute(created_input.clone()).await.unwrap();
    let kept = created.tasks[0];
    let dropped = created.tasks[1];

    let mut input = h.update_of(&created_input);
    let mut renamed = h.task("renamed");
    renamed.id = Some(kept.to_string());
    input.tasks = vec![renamed, h.task("brand new")];
    input.name = "Summer Meetup".to_string();

    let event = h.events.update.execute(created.id, input).await.unwrap();

    assert_eq!(event.name, "Summer Meetup");
    assert!(event.is_approved);
    assert_eq!(event.created_at, created.created_at);
    assert_eq!(event.tasks.len(), 2);
    assert_eq!(event.tasks[0], kept);
    assert!(event.facility_histories.is_empty());

    let tasks = h.stores.tasks.find_many(&event.tasks).await.unwrap();
    assert_eq!(tasks[0].name, "renamed");
    assert_eq!(tasks[1].name, "brand new");
    assert!(tasks.iter().all(|t| t.is_linked_to(event.id)));

    assert!(h.stores.tasks.get(dropped).await.unwrap_err().is_not_found());
    assert_eq!(h.store.facility_history_count(), 0);
    h.assert_no_open_sagas().await;
}

#[tokio::test]
async fn failed_event_write_restores_sub_entities() {
    let h = harness();
    let created_input = h.new_event(2, 1);
    let created = h.events.create.execute(created_input.clone()).await.unwrap();
    let before: Vec<Task> = h.stores.tasks.find_by_event(created.id).await.unwrap();

    let mut input = h.update_of(&created_input);
    let mut changed = h.task("changed");
    changed.id = Some(created.tasks[0].to_string());
    input.tasks = vec![changed, h.task("extra")];
    input.name = "Should not stick".to_string();
    h.store.fail_nth(Collection::Events, Op::UpdateOne, 1);

    let err = h
        .events
        .update
        .execute(created.id.to_string(), input)
        .await
        .unwrap_err();
    assert!(matches!(err, EventError::Repo(_)));

    let after = h.stores.tasks.find_by_event(created.id).await.unwrap();
    assert_eq!(after.len(), before.len());
    for (restored, original) in after.iter().zip(&before) {
        assert!(restored.same_content(original));
        assert_eq!(restored.created_at, original.created_at);
    }
    assert_eq!(h.store.task_count(), 2);
    assert_eq!(h.store.facility_history_count(), 1);

    let event = h.stores.events.get(created.id).await.unwrap();
    assert_eq!(event.name, created.name);
    assert_eq!(event.updated_at, created.updated_at);
    assert_eq!(
        event.tasks,
        after.iter().map(|t| t.id).collect::<Vec<_>>()
    );
    h.assert_no_open_sagas().await;
}

#[tokio::test]
async fn update_of_unknown_event_is_not_found_and_writes_nothing() {
    let h = harness();
    let input = h.update_of(&h.new_event(0, 0));

    let err = h.events.update.execute(EventId::new(), input).await.unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(h.store.calls(Collection::Tasks, Op::Create), 0);
    h.assert_no_open_sagas().await;
}

#[tokio::test]
async fn update_with_unknown_sub_entity_id_is_not_found() {
    let h = harness();
    let created_input = h.new_event(1, 0);
    let created = h.events.create.execute(created_input.clone()).await.unwrap();

    let mut input = h.update_of(&created_input);
    let mut ghost = h.task("ghost");
    ghost.id = Some(netevent_domain::TaskId::new().to_string());
    input.tasks = vec![ghost];

    let err = h.events.update.execute(created.id, input).await.unwrap_err();

    assert!(err.is_not_found(), "got {err:?}");
    let tasks = h.stores.tasks.find_by_event(created.id).await.unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].id, created.tasks[0]);
    assert_eq!(h.store.calls(Collection::Tasks, Op::DeleteOne), 0);
    assert_eq!(h.store.calls(Collection::Tasks, Op::Create), 1);
    h.assert_no_open_sagas().await;
}

async fn two_events(h: &Harness) -> (netevent_domain::Event, netevent_domain::Event, NewEvent) {
    let a_input = h.new_event(1, 0);
    let a = h.events.create.execute(a_input.clone()).await.unwrap();
    let mut b_input = h.new_event(1, 0);
    b_input.name = "Autumn Meetup".to_string();
    let b = h.events.create.execute(b_input).await.unwrap();
    (a, b, a_input)
}

#[tokio::test]
async fn update_cannot_take_over_another_events_task() {
    let h = harness();
    let (a, b, a_input) = two_events(&h).await;

    let mut input = h.update_of(&a_input);
    let mut stolen = h.task("stolen");
    stolen.id = Some(b.tasks[0].to_string());
    input.tasks = vec![stolen];

    let err = h
        .events
        .validate
        .validate_update(a.id, &input)
        .await
        .unwrap_err();
    let EventError::Validation(errors) = err else {
        panic!("expected validation error, got {err:?}");
    };
    assert!(errors.has_field("tasks[0].id"));

    let err = h.events.update.execute(a.id, input).await.unwrap_err();
    assert!(err.is_not_found(), "got {err:?}");

    let b_task = h.stores.tasks.get(b.tasks[0]).await.unwrap();
    assert!(b_task.is_linked_to(b.id));
    assert_eq!(b_task.name, "task 0");
    let a_task = h.stores.tasks.get(a.tasks[0]).await.unwrap();
    assert!(a_task.is_linked_to(a.id));
    h.assert_no_open_sagas().await;
}

#[tokio::test]
async fn rejected_foreign_task_survives_a_failing_update() {
    let h = harness();
    let (a, b, a_input) = two_events(&h).await;
    h.store.fail_nth(Collection::Events, Op::UpdateOne, 1);

    let mut input = h.update_of(&a_input);
    let mut stolen = h.task("stolen");
    stolen.id = Some(b.tasks[0].to_string());
    input.tasks = vec![stolen, h.task("extra")];

    let err = h.events.update.execute(a.id, input).await.unwrap_err();
    assert!(err.is_not_found(), "got {err:?}");

    // Nothing was written, so the injected event fault never fired.
    assert_eq!(h.store.calls(Collection::Events, Op::UpdateOne), 0);
    assert_eq!(h.store.calls(Collection::Tasks, Op::DeleteOne), 0);
    assert_eq!(h.store.task_count(), 2);

    let b_event = h.stores.events.get(b.id).await.unwrap();
    assert_eq!(b_event.tasks, b.tasks);
    let linked = h.stores.tasks.find_by_event(b.id).await.unwrap();
    assert_eq!(linked.len(), 1);
    assert_eq!(linked[0].id, b.tasks[0]);
}

#[tokio::test]
async fn malformed_sub_entity_id_fails_before_any_delete() {
    let h = harness();
    let created_input = h.new_event(2, 0);
    let created = h.events.create.execute(created_input.clone()).await.unwrap();

    let mut input = h.update_of(&created_input);
    let mut broken = h.task("broken");
    broken.id = Some("not-an-id".to_string());
    input.tasks = vec![broken];

    let err = h.events.update.execute(created.id, input).await.unwrap_err();

    assert!(
        matches!(err, EventError::Validation(ref e) if e.has_field("tasks[0].id")),
        "got {err:?}"
    );
    assert_eq!(h.store.calls(Collection::Tasks, Op::DeleteOne), 0);
    let tasks = h.stores.tasks.find_by_event(created.id).await.unwrap();
    assert_eq!(tasks.len(), 2);
    h.assert_no_open_sagas().await;
}

#[tokio::test]
async fn failure_in_one_unit_removes_what_the_other_created() {
    let h = harness();
    let created_input = h.new_event(1, 1);
    let created = h.events.create.execute(created_input.clone()).await.unwrap();
    let tasks_before: Vec<Task> = h.stores.tasks.find_by_event(created.id).await.unwrap();
    let histories_before: Vec<FacilityHistory> = h
        .stores
        .facility_histories
        .find_by_event(created.id)
        .await
        .unwrap();

    let mut input = h.update_of(&created_input);
    let mut kept = h.task("kept");
    kept.id = Some(created.tasks[0].to_string());
    input.tasks = vec![kept, h.task("new a"), h.task("new b")];
    input.facility_histories = vec![h.facility_history(), h.facility_history()];
    // The create above made facility history #1; #3 is the update's second one.
    h.store.fail_nth(Collection::FacilityHistories, Op::Create, 3);

    let err = h.events.update.execute(created.id, input).await.unwrap_err();
    assert!(matches!(err, EventError::Repo(_)), "got {err:?}");
    assert_eq!(h.store.calls(Collection::Events, Op::UpdateOne), 1);

    let tasks_after = h.stores.tasks.find_by_event(created.id).await.unwrap();
    assert_eq!(tasks_after.len(), 1);
    assert!(tasks_after[0].same_content(&tasks_before[0]));
    assert_eq!(tasks_after[0].created_at, tasks_before[0].created_at);
    assert!(tasks_after.iter().all(|t| t.name != "new a" && t.name != "new b"));

    let histories_after = h
        .stores
        .facility_histories
        .find_by_event(created.id)
        .await
        .unwrap();
    assert_eq!(histories_after.len(), 1);
    assert!(histories_after[0].same_content(&histories_before[0]));

    assert_eq!(h.store.task_count(), 1);
    assert_eq!(h.store.facility_history_count(), 1);

    let event = h.stores.events.get(created.id).await.unwrap();
    assert_eq!(event.tasks, vec![tasks_after[0].id]);
    assert_eq!(event.facility_histories, vec![histories_after[0].id]);
    assert_eq!(event.updated_at, created.updated_at);
    h.assert_no_open_sagas().await;
}

#[tokio::test]
async fn failed_update_restore_is_left_for_an_operator() {
    let h = harness();
    let created_input = h.new_event(2, 0);
    let created = h.events.create.execute(created_input.clone()).await.unwrap();

    let mut input = h.update_of(&created_input);
    input.tasks = created
        .tasks
        .iter()
        .map(|id| {
            let mut t = h.task("overwritten");
            t.id = Some(id.to_string());
            t
        })
        .collect();
    h.store.fail_nth(Collection::Events, Op::UpdateOne, 1);
    h.store.fail_nth(Collection::Tasks, Op::DeleteOne, 1);

    let err = h.events.update.execute(created.id, input).await.unwrap_err();
    assert!(matches!(err, EventError::RollbackFailed { .. }), "got {err:?}");

    // The first overwritten task could not be removed; both originals were re-created.
    assert_eq!(h.store.task_count(), 3);

    let open = h.store.list_unfinished().await.unwrap();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].kind, SagaKind::Update);
    assert_eq!(open[0].state, SagaState::RollbackFailed);

    let report = h.events.recover.execute().await.unwrap();
    assert_eq!(report.needs_attention, vec![open[0].id]);
}

// =============================================================================
// Delete
// =============================================================================

#[tokio::test]
async fn soft_deleted_event_drops_out_of_the_default_listing() {
    let h = harness();
    let event = h.events.create.execute(h.new_event(1, 0)).await.unwrap();

    let deleted = h.events.delete.execute(event.id).await.unwrap();
    assert!(deleted.is_deleted);
    assert_eq!(h.store.task_count(), 1);

    assert!(h.events.list.execute(false).await.unwrap().is_empty());
    assert_eq!(h.events.list.execute(true).await.unwrap().len(), 1);

    // Name is free again.
    h.events.validate.validate_new(&h.new_event(0, 0)).await.unwrap();
}

#[tokio::test]
async fn names_are_stored_trimmed_and_stay_unique() {
    let h = harness();
    let mut input = h.new_event(0, 0);
    input.name = "Gala ".to_string();

    h.events.validate.validate_new(&input).await.unwrap();
    let event = h.events.create.execute(input.clone()).await.unwrap();
    assert_eq!(event.name, "Gala");

    let err = h.events.validate.validate_new(&input).await.unwrap_err();
    let EventError::Validation(errors) = err else {
        panic!("expected validation error, got {err:?}");
    };
    assert!(errors
        .iter()
        .any(|e| matches!(e, ValidationError::Duplicate { value, .. } if value == "Gala")));

    let mut update = h.update_of(&input);
    update.name = "  Gala".to_string();
    let updated = h.events.update.execute(event.id, update).await.unwrap();
    assert_eq!(updated.name, "Gala");
}

#[tokio::test]
async fn details_skip_a_dangling_task_reference() {
    let h = harness();
    let event = h.events.create.execute(h.new_event(2, 0)).await.unwrap();
    h.stores.tasks.delete(event.tasks[0]).await.unwrap();

    let details = h.events.details.execute(event.id).await.unwrap();

    assert_eq!(details.event.tasks.len(), 2);
    let ids: Vec<TaskId> = details.tasks.iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![event.tasks[1]]);
}

#[tokio::test]
async fn details_resolve_sub_entities_in_reference_order() {
    let h = harness();
    let event = h.events.create.execute(h.new_event(3, 2)).await.unwrap();

    let details = h.events.details.execute(event.id.to_string()).await.unwrap();
    let ids: Vec<_> = details.tasks.iter().map(|t| t.id).collect();
    assert_eq!(ids, event.tasks);
    assert_eq!(details.facility_histories.len(), 2);
}

// =============================================================================
// Recovery
// =============================================================================

async fn orphan_task(h: &Harness) -> Task {
    let draft = TaskDraft {
        event: None,
        name: "orphan".to_string(),
        user: h.user,
        task_type: "logistics".to_string(),
        start_date: day(1),
        end_date: day(2),
        created_at: None,
        updated_at: None,
    };
    TaskRepo::create(h.store.as_ref(), &draft).await.unwrap()
}

#[tokio::test]
async fn recovery_compensates_creates_interrupted_before_persist() {
    let h = harness();
    let task = orphan_task(&h).await;
    let mut saga =
        SagaRecord::begin(SagaKind::Create, None, now()).with_touched(vec![task.id], vec![]);
    saga.advance(SagaState::SubEntitiesCreated, now()).unwrap();
    h.store.record(&saga).await.unwrap();

    let report = h.events.recover.execute().await.unwrap();

    assert_eq!(report.compensated, vec![saga.id]);
    h.assert_empty();
    h.assert_no_open_sagas().await;
}

#[tokio::test]
async fn recovery_rolls_forward_a_persisted_create() {
    let h = harness();
    let mut input = h.new_event(0, 0);
    input.name = "Half done".to_string();
    let event = h.events.create.execute(input).await.unwrap();
    let task = orphan_task(&h).await;

    let mut saga = SagaRecord::begin(SagaKind::Create, None, now()).with_touched(vec![task.id], vec![]);
    saga.advance(SagaState::SubEntitiesCreated, now()).unwrap();
    saga.advance(SagaState::EventPersisted, now()).unwrap();
    saga.event_id = Some(event.id);
    h.store.record(&saga).await.unwrap();

    let report = h.events.recover.execute().await.unwrap();

    assert_eq!(report.rolled_forward, vec![saga.id]);
    let linked = h.stores.tasks.get(task.id).await.unwrap();
    assert!(linked.is_linked_to(event.id));
    h.assert_no_open_sagas().await;
}

#[tokio::test]
async fn recovery_leaves_update_sagas_for_an_operator() {
    let h = harness();
    let saga = SagaRecord::begin(SagaKind::Update, Some(EventId::new()), now());
    h.store.record(&saga).await.unwrap();

    let report = h.events.recover.execute().await.unwrap();

    assert_eq!(report.needs_attention, vec![saga.id]);
    assert_eq!(h.store.list_unfinished().await.unwrap().len(), 1);
}
