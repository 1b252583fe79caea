//! Response bodies returned by the event API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomFieldData {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    pub values: Vec<String>,
    pub required: bool,
}

/// An event with its references as bare identifier strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventData {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub tags: Vec<String>,
    pub is_approved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewer_id: Option<String>,
    pub is_finished: bool,
    pub task_ids: Vec<String>,
    pub facility_history_ids: Vec<String>,
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
    pub is_deleted: bool,
    pub custom_fields: Vec<CustomFieldData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskData {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    pub name: String,
    pub user_id: String,
    #[serde(rename = "type")]
    pub task_type: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacilityHistoryData {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub facility_id: String,
    pub borrow_date: DateTime<Utc>,
    pub return_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
}

/// An event with its tasks and facility histories resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDetailsData {
    #[serde(flatten)]
    pub event: EventData,
    pub tasks: Vec<TaskData>,
    pub facility_histories: Vec<FacilityHistoryData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldErrorData {
    /// Field path, e.g. `tasks[1].name`
    pub field: String,
    pub message: String,
}

/// Error body for every non-2xx response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldErrorData>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            fields: Vec::new(),
        }
    }

    pub fn with_fields(mut self, fields: Vec<FieldErrorData>) -> Self {
        self.fields = fields;
        self
    }
}
