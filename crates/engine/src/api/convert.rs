//! Domain to wire conversions.

use netevent_domain::{CustomField, Event, FacilityHistory, Task};
use netevent_shared::{CustomFieldData, EventData, EventDetailsData, FacilityHistoryData, TaskData};

use crate::use_cases::events::EventDetails;

pub(super) fn event_data(event: &Event) -> EventData {
    EventData {
        id: event.id.to_string(),
        created_at: event.created_at,
        updated_at: event.updated_at,
        tags: event.tags.clone(),
        is_approved: event.is_approved,
        reviewer_id: event.reviewer.map(|id| id.to_string()),
        is_finished: event.is_finished,
        task_ids: event.tasks.iter().map(ToString::to_string).collect(),
        facility_history_ids: event
            .facility_histories
            .iter()
            .map(ToString::to_string)
            .collect(),
        name: event.name.clone(),
        language: event.language.clone(),
        event_type_id: event.event_type.to_string(),
        mode: event.mode.clone(),
        location: event.location.clone(),
        accommodation: event.accommodation.clone(),
        registration_close_date: event.registration_close_date,
        start_date: event.start_date,
        end_date: event.end_date,
        max_participants: event.max_participants,
        description: event.description.clone(),
        owner_id: event.owner.to_string(),
        budget: event.budget,
        image: event.image.clone(),
        is_deleted: event.is_deleted,
        custom_fields: event.custom_fields.iter().map(custom_field_data).collect(),
    }
}

fn custom_field_data(field: &CustomField) -> CustomFieldData {
    CustomFieldData {
        name: field.name.clone(),
        field_type: field.field_type.clone(),
        values: field.values.clone(),
        required: field.required,
    }
}

fn task_data(task: &Task) -> TaskData {
    TaskData {
        id: task.id.to_string(),
        created_at: task.created_at,
        updated_at: task.updated_at,
        event_id: task.event.map(|id| id.to_string()),
        name: task.name.clone(),
        user_id: task.user.to_string(),
        task_type: task.task_type.clone(),
        start_date: task.start_date,
        end_date: task.end_date,
    }
}

fn facility_history_data(history: &FacilityHistory) -> FacilityHistoryData {
    FacilityHistoryData {
        id: history.id.to_string(),
        created_at: history.created_at,
        updated_at: history.updated_at,
        facility_id: history.facility.to_string(),
        borrow_date: history.borrow_date,
        return_date: history.return_date,
        event_id: history.event.map(|id| id.to_string()),
    }
}

pub(super) fn event_details_data(details: &EventDetails) -> EventDetailsData {
    EventDetailsData {
        event: event_data(&details.event),
        tasks: details.tasks.iter().map(task_data).collect(),
        facility_histories: details
            .facility_histories
            .iter()
            .map(facility_history_data)
            .collect(),
    }
}
