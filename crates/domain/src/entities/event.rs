//! Event entity - The central schedulable activity
//!
//! An Event owns its Tasks and FacilityHistories by reference only: the
//! `tasks` / `facility_histories` sequences hold bare identifiers, and each
//! referenced document carries the Event's id as its back-link once a
//! composite create/update has completed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{EventId, EventTypeId, FacilityHistoryId, TaskId, UserId};

/// A user-defined registration field attached to an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomField {
    pub name: String,
    /// Free-form type tag (e.g. "text", "select")
    #[serde(rename = "type")]
    pub field_type: String,
    pub values: Vec<String>,
    pub required: bool,
}

impl CustomField {
    pub fn new(name: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: field_type.into(),
            values: Vec::new(),
            required: false,
        }
    }

    pub fn with_values(mut self, values: Vec<String>) -> Self {
        self.values = values;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// A persisted event document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: EventId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub tags: Vec<String>,
    pub is_approved: bool,
    pub reviewer: Option<UserId>,
    pub is_finished: bool,
    pub tasks: Vec<TaskId>,
    pub facility_histories: Vec<FacilityHistoryId>,
    /// Unique among non-deleted events (checked by validation, not storage)
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
}

impl Event {
    /// True when `task_id` is one of this event's task references.
    pub fn references_task(&self, task_id: TaskId) -> bool {
        self.tasks.contains(&task_id)
    }

    /// True when `id` is one of this event's facility-history references.
    pub fn references_facility_history(&self, id: FacilityHistoryId) -> bool {
        self.facility_histories.contains(&id)
    }
}
