//! Request payloads for composite event writes
//!
//! Both payloads embed their sub-entity specs inline. On create every entry
//! is new; on update an entry with an `id` refers to an existing document to
//! be overwritten in place and an entry without one is created.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomFieldInput {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default, alias = "value")]
    pub values: Vec<String>,
    #[serde(default)]
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskInput {
    /// Existing task to overwrite; absent for a new task
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub user_id: String,
    #[serde(rename = "type")]
    pub task_type: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacilityHistoryInput {
    /// Existing history entry to overwrite; absent for a new one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub facility_id: String,
    pub borrow_date: DateTime<Utc>,
    pub return_date: DateTime<Utc>,
}

/// Payload for creating an event with its tasks and facility histories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub tasks: Vec<TaskInput>,
    #[serde(default)]
    pub facility_histories: Vec<FacilityHistoryInput>,
    pub name: String,
    pub language: String,
    pub event_type_id: String,
    pub mode: String,
    pub location: String,
    pub accommodation: String,
    pub registration_close_date: DateTime<Utc>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub max_participants: u32,
    pub description: String,
    pub owner_id: String,
    pub budget: f64,
    pub image: String,
    #[serde(default, alias = "customizeFields")]
    pub custom_fields: Vec<CustomFieldInput>,
}

/// Payload for replacing an event's fields and reconciling its sub-entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEvent {
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub tasks: Vec<TaskInput>,
    #[serde(default)]
    pub facility_histories: Vec<FacilityHistoryInput>,
    pub name: String,
    pub language: String,
    pub event_type_id: String,
    pub mode: String,
    pub location: String,
    pub accommodation: String,
    pub registration_close_date: DateTime<Utc>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub max_participants: u32,
    pub description: String,
    pub owner_id: String,
    pub budget: f64,
    pub image: String,
    #[serde(default)]
    pub is_approved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewer: Option<String>,
    #[serde(default)]
    pub is_finished: bool,
    #[serde(default)]
    pub is_deleted: bool,
    #[serde(default, alias = "customizeFields")]
    pub custom_fields: Vec<CustomFieldInput>,
}
