//! In-memory record store.
//!
//! Implements every store port over `DashMap`s. Used by the `memory` backend
//! and by the engine tests. Documents keep insertion order through a
//! monotonically increasing sequence number so `find_all` is stable.
//!
//! Test builds can inject faults: fail the n-th call of one operation on one
//! collection (see [`InMemoryStore::fail_nth`]).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use netevent_domain::{
    Event, EventId, EventTypeId, FacilityHistory, FacilityHistoryId, FacilityId, SagaId,
    SagaRecord, Task, TaskId, UserId,
};

use crate::infrastructure::ports::{
    ClockPort, EventDraft, EventFilter, EventRepo, EventUpdate, FacilityHistoryDraft,
    FacilityHistoryFilter, FacilityHistoryRepo, FacilityHistoryUpdate, ReferenceRepo, RepoError,
    SagaLogPort, TaskDraft, TaskFilter, TaskRepo, TaskUpdate,
};

/// Collections a fault can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Events,
    Tasks,
    FacilityHistories,
}

/// Store operations a fault can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    FindAll,
    FindOne,
    Create,
    UpdateOne,
    DeleteOne,
}

impl Op {
    fn name(self) -> &'static str {
        match self {
            Self::FindAll => "find_all",
            Self::FindOne => "find_one",
            Self::Create => "create",
            Self::UpdateOne => "update_one",
            Self::DeleteOne => "delete_one",
        }
    }
}

struct Stored<T> {
    seq: u64,
    doc: T,
}

/// Thread-safe in-memory implementation of the record-store ports.
pub struct InMemoryStore {
    clock: Arc<dyn ClockPort>,
    seq: AtomicU64,
    events: DashMap<EventId, Stored<Event>>,
    tasks: DashMap<TaskId, Stored<Task>>,
    facility_histories: DashMap<FacilityHistoryId, Stored<FacilityHistory>>,
    users: DashSet<UserId>,
    facilities: DashSet<FacilityId>,
    event_types: DashSet<EventTypeId>,
    /// Treat every referenced id as existing
    open_references: bool,
    sagas: DashMap<SagaId, SagaRecord>,
    #[cfg(test)]
    faults: faults::FaultPlan,
}

impl InMemoryStore {
    pub fn new(clock: Arc<dyn ClockPort>) -> Self {
        Self {
            clock,
            seq: AtomicU64::new(0),
            events: DashMap::new(),
            tasks: DashMap::new(),
            facility_histories: DashMap::new(),
            users: DashSet::new(),
            facilities: DashSet::new(),
            event_types: DashSet::new(),
            open_references: false,
            sagas: DashMap::new(),
            #[cfg(test)]
            faults: faults::FaultPlan::default(),
        }
    }

    /// Accept any well-formed user, facility and event-type id.
    ///
    /// The memory backend has no user/facility collections to check against.
    pub fn with_open_references(mut self) -> Self {
        self.open_references = true;
        self
    }

    pub fn add_user(&self, id: UserId) {
        self.users.insert(id);
    }

    pub fn add_facility(&self, id: FacilityId) {
        self.facilities.insert(id);
    }

    pub fn add_event_type(&self, id: EventTypeId) {
        self.event_types.insert(id);
    }

    fn next_seq(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::Relaxed)
    }

    fn inject(&self, collection: Collection, op: Op) -> Result<(), RepoError> {
        #[cfg(test)]
        {
            self.faults.check(collection, op)
        }
        #[cfg(not(test))]
        {
            let _ = (collection, op);
            Ok(())
        }
    }

    /// Matching documents ordered by insertion.
    fn select<K, T, F>(map: &DashMap<K, Stored<T>>, pred: F) -> Vec<(u64, T)>
    where
        K: std::hash::Hash + Eq,
        T: Clone,
        F: Fn(&T) -> bool,
    {
        let mut rows: Vec<(u64, T)> = map
            .iter()
            .filter(|entry| pred(&entry.value().doc))
            .map(|entry| (entry.value().seq, entry.value().doc.clone()))
            .collect();
        rows.sort_by_key(|(seq, _)| *seq);
        rows
    }
}

// =============================================================================
// Events
// =============================================================================

#[async_trait]
impl EventRepo for InMemoryStore {
    async fn find_all(&self, filter: &EventFilter) -> Result<Vec<Event>, RepoError> {
        tokio::task::yield_now().await;
        self.inject(Collection::Events, Op::FindAll)?;
        Ok(Self::select(&self.events, |e| filter.matches(e))
            .into_iter()
            .map(|(_, e)| e)
            .collect())
    }

    async fn find_one(&self, filter: &EventFilter) -> Result<Event, RepoError> {
        tokio::task::yield_now().await;
        self.inject(Collection::Events, Op::FindOne)?;
        Self::select(&self.events, |e| filter.matches(e))
            .into_iter()
            .next()
            .map(|(_, e)| e)
            .ok_or_else(|| RepoError::not_found("Event", filter.describe()))
    }

    async fn create(&self, draft: &EventDraft) -> Result<Event, RepoError> {
        tokio::task::yield_now().await;
        self.inject(Collection::Events, Op::Create)?;
        let event = draft.clone().into_event(EventId::new(), self.clock.now());
        self.events.insert(
            event.id,
            Stored {
                seq: self.next_seq(),
                doc: event.clone(),
            },
        );
        Ok(event)
    }

    async fn update_one(
        &self,
        filter: &EventFilter,
        update: &EventUpdate,
    ) -> Result<Event, RepoError> {
        tokio::task::yield_now().await;
        self.inject(Collection::Events, Op::UpdateOne)?;
        let id = Self::select(&self.events, |e| filter.matches(e))
            .into_iter()
            .next()
            .map(|(_, e)| e.id)
            .ok_or_else(|| RepoError::not_found("Event", filter.describe()))?;
        let mut entry = self
            .events
            .get_mut(&id)
            .ok_or_else(|| RepoError::not_found("Event", filter.describe()))?;
        update.apply(&mut entry.doc);
        Ok(entry.doc.clone())
    }

    async fn delete_one(&self, filter: &EventFilter) -> Result<Event, RepoError> {
        tokio::task::yield_now().await;
        self.inject(Collection::Events, Op::DeleteOne)?;
        let id = Self::select(&self.events, |e| filter.matches(e))
            .into_iter()
            .next()
            .map(|(_, e)| e.id)
            .ok_or_else(|| RepoError::not_found("Event", filter.describe()))?;
        self.events
            .remove(&id)
            .map(|(_, stored)| stored.doc)
            .ok_or_else(|| RepoError::not_found("Event", filter.describe()))
    }
}

// =============================================================================
// Tasks
// =============================================================================

#[async_trait]
impl TaskRepo for InMemoryStore {
    async fn find_all(&self, filter: &TaskFilter) -> Result<Vec<Task>, RepoError> {
        tokio::task::yield_now().await;
        self.inject(Collection::Tasks, Op::FindAll)?;
        Ok(Self::select(&self.tasks, |t| filter.matches(t))
            .into_iter()
            .map(|(_, t)| t)
            .collect())
    }

    async fn find_one(&self, filter: &TaskFilter) -> Result<Task, RepoError> {
        tokio::task::yield_now().await;
        self.inject(Collection::Tasks, Op::FindOne)?;
        Self::select(&self.tasks, |t| filter.matches(t))
            .into_iter()
            .next()
            .map(|(_, t)| t)
            .ok_or_else(|| RepoError::not_found("Task", filter.describe()))
    }

    async fn create(&self, draft: &TaskDraft) -> Result<Task, RepoError> {
        tokio::task::yield_now().await;
        self.inject(Collection::Tasks, Op::Create)?;
        let task = draft.clone().into_task(TaskId::new(), self.clock.now());
        self.tasks.insert(
            task.id,
            Stored {
                seq: self.next_seq(),
                doc: task.clone(),
            },
        );
        Ok(task)
    }

    async fn update_one(&self, filter: &TaskFilter, update: &TaskUpdate) -> Result<Task, RepoError> {
        tokio::task::yield_now().await;
        self.inject(Collection::Tasks, Op::UpdateOne)?;
        let id = Self::select(&self.tasks, |t| filter.matches(t))
            .into_iter()
            .next()
            .map(|(_, t)| t.id)
            .ok_or_else(|| RepoError::not_found("Task", filter.describe()))?;
        let mut entry = self
            .tasks
            .get_mut(&id)
            .ok_or_else(|| RepoError::not_found("Task", filter.describe()))?;
        update.apply(&mut entry.doc);
        Ok(entry.doc.clone())
    }

    async fn delete_one(&self, filter: &TaskFilter) -> Result<Task, RepoError> {
        tokio::task::yield_now().await;
        self.inject(Collection::Tasks, Op::DeleteOne)?;
        let id = Self::select(&self.tasks, |t| filter.matches(t))
            .into_iter()
            .next()
            .map(|(_, t)| t.id)
            .ok_or_else(|| RepoError::not_found("Task", filter.describe()))?;
        self.tasks
            .remove(&id)
            .map(|(_, stored)| stored.doc)
            .ok_or_else(|| RepoError::not_found("Task", filter.describe()))
    }
}

// =============================================================================
// Facility histories
// =============================================================================

#[async_trait]
impl FacilityHistoryRepo for InMemoryStore {
    async fn find_all(
        &self,
        filter: &FacilityHistoryFilter,
    ) -> Result<Vec<FacilityHistory>, RepoError> {
        tokio::task::yield_now().await;
        self.inject(Collection::FacilityHistories, Op::FindAll)?;
        Ok(Self::select(&self.facility_histories, |h| filter.matches(h))
            .into_iter()
            .map(|(_, h)| h)
            .collect())
    }

    async fn find_one(&self, filter: &FacilityHistoryFilter) -> Result<FacilityHistory, RepoError> {
        tokio::task::yield_now().await;
        self.inject(Collection::FacilityHistories, Op::FindOne)?;
        Self::select(&self.facility_histories, |h| filter.matches(h))
            .into_iter()
            .next()
            .map(|(_, h)| h)
            .ok_or_else(|| RepoError::not_found("FacilityHistory", filter.describe()))
    }

    async fn create(&self, draft: &FacilityHistoryDraft) -> Result<FacilityHistory, RepoError> {
        tokio::task::yield_now().await;
        self.inject(Collection::FacilityHistories, Op::Create)?;
        let history = draft
            .clone()
            .into_facility_history(FacilityHistoryId::new(), self.clock.now());
        self.facility_histories.insert(
            history.id,
            Stored {
                seq: self.next_seq(),
                doc: history.clone(),
            },
        );
        Ok(history)
    }

    async fn update_one(
        &self,
        filter: &FacilityHistoryFilter,
        update: &FacilityHistoryUpdate,
    ) -> Result<FacilityHistory, RepoError> {
        tokio::task::yield_now().await;
        self.inject(Collection::FacilityHistories, Op::UpdateOne)?;
        let id = Self::select(&self.facility_histories, |h| filter.matches(h))
            .into_iter()
            .next()
            .map(|(_, h)| h.id)
            .ok_or_else(|| RepoError::not_found("FacilityHistory", filter.describe()))?;
        let mut entry = self
            .facility_histories
            .get_mut(&id)
            .ok_or_else(|| RepoError::not_found("FacilityHistory", filter.describe()))?;
        update.apply(&mut entry.doc);
        Ok(entry.doc.clone())
    }

    async fn delete_one(
        &self,
        filter: &FacilityHistoryFilter,
    ) -> Result<FacilityHistory, RepoError> {
        tokio::task::yield_now().await;
        self.inject(Collection::FacilityHistories, Op::DeleteOne)?;
        let id = Self::select(&self.facility_histories, |h| filter.matches(h))
            .into_iter()
            .next()
            .map(|(_, h)| h.id)
            .ok_or_else(|| RepoError::not_found("FacilityHistory", filter.describe()))?;
        self.facility_histories
            .remove(&id)
            .map(|(_, stored)| stored.doc)
            .ok_or_else(|| RepoError::not_found("FacilityHistory", filter.describe()))
    }
}

// =============================================================================
// References
// =============================================================================

#[async_trait]
impl ReferenceRepo for InMemoryStore {
    async fn user_exists(&self, id: UserId) -> Result<bool, RepoError> {
        Ok(self.open_references || self.users.contains(&id))
    }

    async fn facility_exists(&self, id: FacilityId) -> Result<bool, RepoError> {
        Ok(self.open_references || self.facilities.contains(&id))
    }

    async fn event_type_exists(&self, id: EventTypeId) -> Result<bool, RepoError> {
        Ok(self.open_references || self.event_types.contains(&id))
    }
}

// =============================================================================
// Saga journal
// =============================================================================

#[async_trait]
impl SagaLogPort for InMemoryStore {
    async fn record(&self, saga: &SagaRecord) -> Result<(), RepoError> {
        self.sagas.insert(saga.id, saga.clone());
        Ok(())
    }

    async fn get(&self, id: SagaId) -> Result<Option<SagaRecord>, RepoError> {
        Ok(self.sagas.get(&id).map(|entry| entry.value().clone()))
    }

    async fn list_unfinished(&self) -> Result<Vec<SagaRecord>, RepoError> {
        let mut records: Vec<SagaRecord> = self
            .sagas
            .iter()
            .filter(|entry| !entry.value().is_finished())
            .map(|entry| entry.value().clone())
            .collect();
        records.sort_by_key(|saga| saga.created_at);
        Ok(records)
    }
}

// =============================================================================
// Fault injection (tests only)
// =============================================================================

#[cfg(test)]
impl InMemoryStore {
    /// Fail the `nth` (1-based) call of `op` on `collection`.
    pub fn fail_nth(&self, collection: Collection, op: Op, nth: usize) {
        self.faults.add(collection, op, nth, false);
    }

    /// Fail every call of `op` on `collection` from the `nth` onwards.
    pub fn fail_from(&self, collection: Collection, op: Op, nth: usize) {
        self.faults.add(collection, op, nth, true);
    }

    /// Number of calls made so far to `op` on `collection`.
    pub fn calls(&self, collection: Collection, op: Op) -> usize {
        self.faults.calls(collection, op)
    }

    pub fn total_calls(&self) -> usize {
        self.faults.total_calls()
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    pub fn facility_history_count(&self) -> usize {
        self.facility_histories.len()
    }
}

#[cfg(test)]
mod faults {
    use std::sync::Mutex;

    use dashmap::DashMap;

    use super::{Collection, Op};
    use crate::infrastructure::ports::RepoError;

    struct Fault {
        collection: Collection,
        op: Op,
        nth: usize,
        sticky: bool,
    }

    #[derive(Default)]
    pub(super) struct FaultPlan {
        faults: Mutex<Vec<Fault>>,
        counters: DashMap<(Collection, Op), usize>,
    }

    impl FaultPlan {
        pub(super) fn add(&self, collection: Collection, op: Op, nth: usize, sticky: bool) {
            if let Ok(mut faults) = self.faults.lock() {
                faults.push(Fault {
                    collection,
                    op,
                    nth,
                    sticky,
                });
            }
        }

        pub(super) fn check(&self, collection: Collection, op: Op) -> Result<(), RepoError> {
            let n = {
                let mut counter = self.counters.entry((collection, op)).or_insert(0);
                *counter += 1;
                *counter
            };
            let hit = self
                .faults
                .lock()
                .map(|faults| {
                    faults.iter().any(|f| {
                        f.collection == collection
                            && f.op == op
                            && (n == f.nth || (f.sticky && n >= f.nth))
                    })
                })
                .unwrap_or(false);
            if hit {
                return Err(RepoError::database(op.name(), "injected fault"));
            }
            Ok(())
        }

        pub(super) fn calls(&self, collection: Collection, op: Op) -> usize {
            self.counters
                .get(&(collection, op))
                .map(|c| *c)
                .unwrap_or(0)
        }

        pub(super) fn total_calls(&self) -> usize {
            self.counters.iter().map(|entry| *entry.value()).sum()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::FixedClock;
    use chrono::{TimeZone, Utc};

    fn store() -> InMemoryStore {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        InMemoryStore::new(Arc::new(FixedClock(now)))
    }

    fn task_draft(name: &str) -> TaskDraft {
        let t = Utc.with_ymd_and_hms(2024, 2, 1, 9, 0, 0).unwrap();
        TaskDraft {
            event: None,
            name: name.to_string(),
            user: UserId::new(),
            task_type: "ops".to_string(),
            start_date: t,
            end_date: t,
            created_at: None,
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn create_assigns_id_and_store_timestamps() {
        let store = store();
        let task = TaskRepo::create(&store, &task_draft("a")).await.unwrap();
        assert_eq!(task.created_at, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(task.created_at, task.updated_at);
        let found = TaskRepo::find_one(&store, &TaskFilter::by_id(task.id)).await.unwrap();
        assert_eq!(found, task);
    }

    #[tokio::test]
    async fn unmatched_update_and_delete_are_not_found() {
        let store = store();
        let filter = TaskFilter::by_id(TaskId::new());

        let update = TaskRepo::update_one(&store, &filter, &TaskUpdate::default()).await;
        assert!(matches!(update, Err(ref e) if e.is_not_found()));

        let delete = TaskRepo::delete_one(&store, &filter).await;
        assert!(matches!(delete, Err(ref e) if e.is_not_found()));
    }

    #[tokio::test]
    async fn find_all_keeps_insertion_order() {
        let store = store();
        let mut ids = Vec::new();
        for name in ["first", "second", "third"] {
            ids.push(TaskRepo::create(&store, &task_draft(name)).await.unwrap().id);
        }
        let found: Vec<TaskId> = TaskRepo::find_all(&store, &TaskFilter::default())
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(found, ids);
    }

    #[tokio::test]
    async fn injected_fault_hits_only_the_nth_call() {
        let store = store();
        store.fail_nth(Collection::Tasks, Op::Create, 2);

        assert!(TaskRepo::create(&store, &task_draft("a")).await.is_ok());
        let second = TaskRepo::create(&store, &task_draft("b")).await;
        assert!(matches!(second, Err(RepoError::Database { .. })));
        assert!(TaskRepo::create(&store, &task_draft("c")).await.is_ok());
        assert_eq!(store.task_count(), 2);
        assert_eq!(store.calls(Collection::Tasks, Op::Create), 3);
    }

    #[tokio::test]
    async fn unfinished_sagas_exclude_terminal_records() {
        use netevent_domain::{SagaKind, SagaState};

        let store = store();
        let now = Utc::now();
        let open = SagaRecord::begin(SagaKind::Create, None, now);
        let mut done = SagaRecord::begin(SagaKind::Update, Some(EventId::new()), now);
        done.state = SagaState::Committed;

        store.record(&open).await.unwrap();
        store.record(&done).await.unwrap();

        let unfinished = store.list_unfinished().await.unwrap();
        assert_eq!(unfinished.len(), 1);
        assert_eq!(unfinished[0].id, open.id);
    }
}
