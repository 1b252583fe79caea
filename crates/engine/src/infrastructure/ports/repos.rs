//! Repository port traits for record-store access.
//!
//! One port per collection. `find_one`, `update_one` and `delete_one` return
//! `RepoError::NotFound` when the filter matches nothing, never `Ok(None)`.

use async_trait::async_trait;
use netevent_domain::{
    Event, EventTypeId, FacilityHistory, FacilityId, SagaId, SagaRecord, Task, UserId,
};

use super::error::RepoError;
use super::types::{
    EventDraft, EventFilter, EventUpdate, FacilityHistoryDraft, FacilityHistoryFilter,
    FacilityHistoryUpdate, TaskDraft, TaskFilter, TaskUpdate,
};

// =============================================================================
// Composite-operation collections
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventRepo: Send + Sync {
    async fn find_all(&self, filter: &EventFilter) -> Result<Vec<Event>, RepoError>;
    async fn find_one(&self, filter: &EventFilter) -> Result<Event, RepoError>;
    async fn create(&self, draft: &EventDraft) -> Result<Event, RepoError>;
    async fn update_one(
        &self,
        filter: &EventFilter,
        update: &EventUpdate,
    ) -> Result<Event, RepoError>;
    async fn delete_one(&self, filter: &EventFilter) -> Result<Event, RepoError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskRepo: Send + Sync {
    async fn find_all(&self, filter: &TaskFilter) -> Result<Vec<Task>, RepoError>;
    async fn find_one(&self, filter: &TaskFilter) -> Result<Task, RepoError>;
    async fn create(&self, draft: &TaskDraft) -> Result<Task, RepoError>;
    async fn update_one(&self, filter: &TaskFilter, update: &TaskUpdate)
        -> Result<Task, RepoError>;
    async fn delete_one(&self, filter: &TaskFilter) -> Result<Task, RepoError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FacilityHistoryRepo: Send + Sync {
    async fn find_all(
        &self,
        filter: &FacilityHistoryFilter,
    ) -> Result<Vec<FacilityHistory>, RepoError>;
    async fn find_one(&self, filter: &FacilityHistoryFilter)
        -> Result<FacilityHistory, RepoError>;
    async fn create(&self, draft: &FacilityHistoryDraft) -> Result<FacilityHistory, RepoError>;
    async fn update_one(
        &self,
        filter: &FacilityHistoryFilter,
        update: &FacilityHistoryUpdate,
    ) -> Result<FacilityHistory, RepoError>;
    async fn delete_one(&self, filter: &FacilityHistoryFilter)
        -> Result<FacilityHistory, RepoError>;
}

// =============================================================================
// Referenced collections (existence checks only)
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReferenceRepo: Send + Sync {
    async fn user_exists(&self, id: UserId) -> Result<bool, RepoError>;
    async fn facility_exists(&self, id: FacilityId) -> Result<bool, RepoError>;
    async fn event_type_exists(&self, id: EventTypeId) -> Result<bool, RepoError>;
}

// =============================================================================
// Saga journal
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SagaLogPort: Send + Sync {
    /// Insert or replace the record with this id.
    async fn record(&self, saga: &SagaRecord) -> Result<(), RepoError>;
    async fn get(&self, id: SagaId) -> Result<Option<SagaRecord>, RepoError>;
    /// Records not yet Committed or RolledBack, oldest first.
    async fn list_unfinished(&self) -> Result<Vec<SagaRecord>, RepoError>;
}
