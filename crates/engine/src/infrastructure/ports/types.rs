//! Filter, draft and patch types shared by the record-store ports.
//!
//! Filters are conjunctions: every `Some` field must match. An empty filter
//! matches every document in the collection.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use netevent_domain::{
    CustomField, DomainError, Event, EventId, EventTypeId, FacilityHistory, FacilityHistoryId,
    FacilityId, Task, TaskId, UserId,
};

use super::error::RepoError;

// =============================================================================
// Identifier normalization
// =============================================================================

/// An identifier as a caller supplied it: already typed, or as the canonical
/// string form from the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdRef<T> {
    Native(T),
    Canonical(String),
}

impl<T> IdRef<T>
where
    T: FromStr<Err = DomainError> + Copy,
{
    /// Normalize to the native representation. Malformed strings are
    /// `RepoError::InvalidId`.
    pub fn resolve(&self) -> Result<T, RepoError> {
        match self {
            Self::Native(id) => Ok(*id),
            Self::Canonical(raw) => Ok(raw.trim().parse::<T>()?),
        }
    }
}

impl<T> From<&str> for IdRef<T> {
    fn from(value: &str) -> Self {
        Self::Canonical(value.to_string())
    }
}

impl<T> From<String> for IdRef<T> {
    fn from(value: String) -> Self {
        Self::Canonical(value)
    }
}

impl<T> From<&String> for IdRef<T> {
    fn from(value: &String) -> Self {
        Self::Canonical(value.clone())
    }
}

macro_rules! native_id_ref {
    ($($id:ty),* $(,)?) => {
        $(
            impl From<$id> for IdRef<$id> {
                fn from(value: $id) -> Self {
                    Self::Native(value)
                }
            }
        )*
    };
}

native_id_ref!(EventId, TaskId, FacilityHistoryId);

// =============================================================================
// Filters
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventFilter {
    pub id: Option<EventId>,
    pub name: Option<String>,
    /// Exclude this event (name-uniqueness checks on update)
    pub exclude_id: Option<EventId>,
    /// `None` does not filter on the soft-delete flag
    pub is_deleted: Option<bool>,
}

impl EventFilter {
    pub fn by_id(id: EventId) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn excluding(mut self, id: EventId) -> Self {
        self.exclude_id = Some(id);
        self
    }

    pub fn deleted(mut self, is_deleted: bool) -> Self {
        self.is_deleted = Some(is_deleted);
        self
    }

    pub fn matches(&self, event: &Event) -> bool {
        self.id.map_or(true, |id| event.id == id)
            && self.name.as_ref().map_or(true, |name| &event.name == name)
            && self.exclude_id.map_or(true, |id| event.id != id)
            && self.is_deleted.map_or(true, |flag| event.is_deleted == flag)
    }

    /// Human-readable form for NotFound errors and logs.
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if let Some(id) = self.id {
            parts.push(format!("id={}", id));
        }
        if let Some(name) = &self.name {
            parts.push(format!("name={}", name));
        }
        if let Some(id) = self.exclude_id {
            parts.push(format!("id!={}", id));
        }
        if let Some(flag) = self.is_deleted {
            parts.push(format!("is_deleted={}", flag));
        }
        describe_parts(parts)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskFilter {
    pub id: Option<TaskId>,
    pub ids: Option<Vec<TaskId>>,
    pub event: Option<EventId>,
}

impl TaskFilter {
    pub fn by_id(id: TaskId) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    pub fn by_ids(ids: Vec<TaskId>) -> Self {
        Self {
            ids: Some(ids),
            ..Self::default()
        }
    }

    pub fn by_event(event: EventId) -> Self {
        Self {
            event: Some(event),
            ..Self::default()
        }
    }

    pub fn matches(&self, task: &Task) -> bool {
        self.id.map_or(true, |id| task.id == id)
            && self.ids.as_ref().map_or(true, |ids| ids.contains(&task.id))
            && self.event.map_or(true, |event| task.event == Some(event))
    }

    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if let Some(id) = self.id {
            parts.push(format!("id={}", id));
        }
        if let Some(ids) = &self.ids {
            parts.push(format!("ids=[{} ids]", ids.len()));
        }
        if let Some(event) = self.event {
            parts.push(format!("event={}", event));
        }
        describe_parts(parts)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FacilityHistoryFilter {
    pub id: Option<FacilityHistoryId>,
    pub ids: Option<Vec<FacilityHistoryId>>,
    pub event: Option<EventId>,
}

impl FacilityHistoryFilter {
    pub fn by_id(id: FacilityHistoryId) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    pub fn by_ids(ids: Vec<FacilityHistoryId>) -> Self {
        Self {
            ids: Some(ids),
            ..Self::default()
        }
    }

    pub fn by_event(event: EventId) -> Self {
        Self {
            event: Some(event),
            ..Self::default()
        }
    }

    pub fn matches(&self, history: &FacilityHistory) -> bool {
        self.id.map_or(true, |id| history.id == id)
            && self.ids.as_ref().map_or(true, |ids| ids.contains(&history.id))
            && self.event.map_or(true, |event| history.event == Some(event))
    }

    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if let Some(id) = self.id {
            parts.push(format!("id={}", id));
        }
        if let Some(ids) = &self.ids {
            parts.push(format!("ids=[{} ids]", ids.len()));
        }
        if let Some(event) = self.event {
            parts.push(format!("event={}", event));
        }
        describe_parts(parts)
    }
}

fn describe_parts(parts: Vec<String>) -> String {
    if parts.is_empty() {
        "<any>".to_string()
    } else {
        parts.join(", ")
    }
}

// =============================================================================
// Drafts (new documents)
// =============================================================================

/// Fields of a new event document. The store assigns the id.
///
/// Timestamps default to the store clock; explicit values are kept.
#[derive(Debug, Clone, PartialEq)]
pub struct EventDraft {
    pub tags: Vec<String>,
    pub is_approved: bool,
    pub reviewer: Option<UserId>,
    pub is_finished: bool,
    pub tasks: Vec<TaskId>,
    pub facility_histories: Vec<FacilityHistoryId>,
    pub name: String,
    pub language: String,
    pub event_type: EventTypeId,
    pub mode: String,
    pub location: String,
    pub accommodation: String,
    pub registration_close_date: DateTime<Utc>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub max_participants: u32,
    pub description: String,
    pub owner: UserId,
    pub budget: f64,
    pub image: String,
    pub is_deleted: bool,
    pub custom_fields: Vec<CustomField>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl EventDraft {
    pub fn into_event(self, id: EventId, now: DateTime<Utc>) -> Event {
        Event {
            id,
            created_at: self.created_at.unwrap_or(now),
            updated_at: self.updated_at.unwrap_or(now),
            tags: self.tags,
            is_approved: self.is_approved,
            reviewer: self.reviewer,
            is_finished: self.is_finished,
            tasks: self.tasks,
            facility_histories: self.facility_histories,
            name: self.name,
            language: self.language,
            event_type: self.event_type,
            mode: self.mode,
            location: self.location,
            accommodation: self.accommodation,
            registration_close_date: self.registration_close_date,
            start_date: self.start_date,
            end_date: self.end_date,
            max_participants: self.max_participants,
            description: self.description,
            owner: self.owner,
            budget: self.budget,
            image: self.image,
            is_deleted: self.is_deleted,
            custom_fields: self.custom_fields,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaskDraft {
    pub event: Option<EventId>,
    pub name: String,
    pub user: UserId,
    pub task_type: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl TaskDraft {
    /// Draft that re-creates `task` with its field values and timestamps.
    pub fn restore(task: &Task) -> Self {
        Self {
            event: task.event,
            name: task.name.clone(),
            user: task.user,
            task_type: task.task_type.clone(),
            start_date: task.start_date,
            end_date: task.end_date,
            created_at: Some(task.created_at),
            updated_at: Some(task.updated_at),
        }
    }

    pub fn into_task(self, id: TaskId, now: DateTime<Utc>) -> Task {
        Task {
            id,
            created_at: self.created_at.unwrap_or(now),
            updated_at: self.updated_at.unwrap_or(now),
            event: self.event,
            name: self.name,
            user: self.user,
            task_type: self.task_type,
            start_date: self.start_date,
            end_date: self.end_date,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FacilityHistoryDraft {
    pub facility: FacilityId,
    pub borrow_date: DateTime<Utc>,
    pub return_date: DateTime<Utc>,
    pub event: Option<EventId>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl FacilityHistoryDraft {
    pub fn restore(history: &FacilityHistory) -> Self {
        Self {
            facility: history.facility,
            borrow_date: history.borrow_date,
            return_date: history.return_date,
            event: history.event,
            created_at: Some(history.created_at),
            updated_at: Some(history.updated_at),
        }
    }

    pub fn into_facility_history(
        self,
        id: FacilityHistoryId,
        now: DateTime<Utc>,
    ) -> FacilityHistory {
        FacilityHistory {
            id,
            created_at: self.created_at.unwrap_or(now),
            updated_at: self.updated_at.unwrap_or(now),
            facility: self.facility,
            borrow_date: self.borrow_date,
            return_date: self.return_date,
            event: self.event,
        }
    }
}

// =============================================================================
// Patches (partial updates)
// =============================================================================

/// Partial event update. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventUpdate {
    pub tags: Option<Vec<String>>,
    pub is_approved: Option<bool>,
    /// `Some(None)` clears the reviewer
    pub reviewer: Option<Option<UserId>>,
    pub is_finished: Option<bool>,
    pub tasks: Option<Vec<TaskId>>,
    pub facility_histories: Option<Vec<FacilityHistoryId>>,
    pub name: Option<String>,
    pub language: Option<String>,
    pub event_type: Option<EventTypeId>,
    pub mode: Option<String>,
    pub location: Option<String>,
    pub accommodation: Option<String>,
    pub registration_close_date: Option<DateTime<Utc>>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub max_participants: Option<u32>,
    pub description: Option<String>,
    pub owner: Option<UserId>,
    pub budget: Option<f64>,
    pub image: Option<String>,
    pub is_deleted: Option<bool>,
    pub custom_fields: Option<Vec<CustomField>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl EventUpdate {
    /// Re-point the sub-entity references without touching `updated_at`.
    pub fn relink(tasks: Vec<TaskId>, facility_histories: Vec<FacilityHistoryId>) -> Self {
        Self {
            tasks: Some(tasks),
            facility_histories: Some(facility_histories),
            ..Self::default()
        }
    }

    pub fn apply(&self, event: &mut Event) {
        if let Some(v) = &self.tags {
            event.tags = v.clone();
        }
        if let Some(v) = self.is_approved {
            event.is_approved = v;
        }
        if let Some(v) = self.reviewer {
            event.reviewer = v;
        }
        if let Some(v) = self.is_finished {
            event.is_finished = v;
        }
        if let Some(v) = &self.tasks {
            event.tasks = v.clone();
        }
        if let Some(v) = &self.facility_histories {
            event.facility_histories = v.clone();
        }
        if let Some(v) = &self.name {
            event.name = v.clone();
        }
        if let Some(v) = &self.language {
            event.language = v.clone();
        }
        if let Some(v) = self.event_type {
            event.event_type = v;
        }
        if let Some(v) = &self.mode {
            event.mode = v.clone();
        }
        if let Some(v) = &self.location {
            event.location = v.clone();
        }
        if let Some(v) = &self.accommodation {
            event.accommodation = v.clone();
        }
        if let Some(v) = self.registration_close_date {
            event.registration_close_date = v;
        }
        if let Some(v) = self.start_date {
            event.start_date = v;
        }
        if let Some(v) = self.end_date {
            event.end_date = v;
        }
        if let Some(v) = self.max_participants {
            event.max_participants = v;
        }
        if let Some(v) = &self.description {
            event.description = v.clone();
        }
        if let Some(v) = self.owner {
            event.owner = v;
        }
        if let Some(v) = self.budget {
            event.budget = v;
        }
        if let Some(v) = &self.image {
            event.image = v.clone();
        }
        if let Some(v) = self.is_deleted {
            event.is_deleted = v;
        }
        if let Some(v) = &self.custom_fields {
            event.custom_fields = v.clone();
        }
        if let Some(v) = self.updated_at {
            event.updated_at = v;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskUpdate {
    pub event: Option<EventId>,
    pub name: Option<String>,
    pub user: Option<UserId>,
    pub task_type: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl TaskUpdate {
    pub fn link_event(event: EventId, now: DateTime<Utc>) -> Self {
        Self {
            event: Some(event),
            updated_at: Some(now),
            ..Self::default()
        }
    }

    pub fn apply(&self, task: &mut Task) {
        if let Some(v) = self.event {
            task.event = Some(v);
        }
        if let Some(v) = &self.name {
            task.name = v.clone();
        }
        if let Some(v) = self.user {
            task.user = v;
        }
        if let Some(v) = &self.task_type {
            task.task_type = v.clone();
        }
        if let Some(v) = self.start_date {
            task.start_date = v;
        }
        if let Some(v) = self.end_date {
            task.end_date = v;
        }
        if let Some(v) = self.updated_at {
            task.updated_at = v;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FacilityHistoryUpdate {
    pub facility: Option<FacilityId>,
    pub borrow_date: Option<DateTime<Utc>>,
    pub return_date: Option<DateTime<Utc>>,
    pub event: Option<EventId>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl FacilityHistoryUpdate {
    pub fn link_event(event: EventId, now: DateTime<Utc>) -> Self {
        Self {
            event: Some(event),
            updated_at: Some(now),
            ..Self::default()
        }
    }

    pub fn apply(&self, history: &mut FacilityHistory) {
        if let Some(v) = self.facility {
            history.facility = v;
        }
        if let Some(v) = self.borrow_date {
            history.borrow_date = v;
        }
        if let Some(v) = self.return_date {
            history.return_date = v;
        }
        if let Some(v) = self.event {
            history.event = Some(v);
        }
        if let Some(v) = self.updated_at {
            history.updated_at = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_id_ref_resolves_to_native() {
        let id = TaskId::new();
        let by_string: IdRef<TaskId> = id.to_string().into();
        let native: IdRef<TaskId> = id.into();
        assert_eq!(by_string.resolve().unwrap(), id);
        assert_eq!(native.resolve().unwrap(), id);
    }

    #[test]
    fn malformed_id_ref_is_invalid_id() {
        let bad: IdRef<EventId> = "not-an-id".into();
        assert!(matches!(bad.resolve(), Err(RepoError::InvalidId(_))));
    }

    #[test]
    fn empty_filter_describes_as_any() {
        assert_eq!(TaskFilter::default().describe(), "<any>");
        let id = EventId::new();
        assert_eq!(
            EventFilter::by_id(id).deleted(false).describe(),
            format!("id={}, is_deleted=false", id)
        );
    }
}
