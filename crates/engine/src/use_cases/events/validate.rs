//! Validation gate for event create/update payloads.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use netevent_domain::{EventId, EventTypeId, FacilityHistoryId, FacilityId, TaskId, UserId};
use netevent_shared::{
    CustomFieldInput, FacilityHistoryInput, NewEvent, TaskInput, UpdateEvent as UpdateEventInput,
};

use super::EventError;
use crate::infrastructure::ports::IdRef;
use crate::repositories::{EventRepository, ReferenceLookup};
use crate::use_cases::validation::{
    parse_id, require_non_empty, require_ordered, ValidationError, ValidationErrors,
};

/// Scalar fields shared by both payloads.
struct EventFields<'a> {
    name: &'a str,
    language: &'a str,
    event_type_id: &'a str,
    mode: &'a str,
    location: &'a str,
    accommodation: &'a str,
    registration_close_date: DateTime<Utc>,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    max_participants: u32,
    description: &'a str,
    owner_id: &'a str,
    budget: f64,
    image: &'a str,
    tasks: &'a [TaskInput],
    facility_histories: &'a [FacilityHistoryInput],
    custom_fields: &'a [CustomFieldInput],
}

impl<'a> From<&'a NewEvent> for EventFields<'a> {
    fn from(e: &'a NewEvent) -> Self {
        Self {
            name: &e.name,
            language: &e.language,
            event_type_id: &e.event_type_id,
            mode: &e.mode,
            location: &e.location,
            accommodation: &e.accommodation,
            registration_close_date: e.registration_close_date,
            start_date: e.start_date,
            end_date: e.end_date,
            max_participants: e.max_participants,
            description: &e.description,
            owner_id: &e.owner_id,
            budget: e.budget,
            image: &e.image,
            tasks: &e.tasks,
            facility_histories: &e.facility_histories,
            custom_fields: &e.custom_fields,
        }
    }
}

impl<'a> From<&'a UpdateEventInput> for EventFields<'a> {
    fn from(e: &'a UpdateEventInput) -> Self {
        Self {
            name: &e.name,
            language: &e.language,
            event_type_id: &e.event_type_id,
            mode: &e.mode,
            location: &e.location,
            accommodation: &e.accommodation,
            registration_close_date: e.registration_close_date,
            start_date: e.start_date,
            end_date: e.end_date,
            max_participants: e.max_participants,
            description: &e.description,
            owner_id: &e.owner_id,
            budget: e.budget,
            image: &e.image,
            tasks: &e.tasks,
            facility_histories: &e.facility_histories,
            custom_fields: &e.custom_fields,
        }
    }
}

/// References that passed the field checks, awaiting the store lookups.
#[derive(Debug)]
pub struct CheckedRefs {
    event_type: EventTypeId,
    owner: UserId,
    reviewer: Option<UserId>,
}

/// Validates payloads before the consistency engine is invoked.
///
/// Field checks run first and never touch the store; store lookups run only
/// once every field check has passed.
pub struct ValidateEvent {
    events: Arc<EventRepository>,
    references: Arc<ReferenceLookup>,
}

impl ValidateEvent {
    pub fn new(events: Arc<EventRepository>, references: Arc<ReferenceLookup>) -> Self {
        Self { events, references }
    }

    pub async fn validate_new(&self, input: &NewEvent) -> Result<(), EventError> {
        let refs = Self::check_new_fields(input)?;
        self.check_store(input.name.as_str(), &refs, None, ValidationErrors::new())
            .await
    }

    pub async fn validate_update(
        &self,
        id: impl Into<IdRef<EventId>>,
        input: &UpdateEventInput,
    ) -> Result<(), EventError> {
        let id = id.into().resolve()?;
        let refs = Self::check_update_fields(input)?;
        let event = self.events.get(id).await?;

        let mut errors = ValidationErrors::new();
        check_owned(
            input.tasks.iter().map(|t| t.id.as_deref()),
            &event.tasks,
            "tasks",
            &mut errors,
        );
        check_owned(
            input.facility_histories.iter().map(|h| h.id.as_deref()),
            &event.facility_histories,
            "facilityHistories",
            &mut errors,
        );
        self.check_store(input.name.as_str(), &refs, Some(id), errors)
            .await
    }

    /// Field checks for a create payload. No I/O.
    pub fn check_new_fields(input: &NewEvent) -> Result<CheckedRefs, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let refs = check_fields(&EventFields::from(input), &mut errors);
        finish(errors, refs, Some(None))
    }

    /// Field checks for an update payload. No I/O.
    pub fn check_update_fields(
        input: &UpdateEventInput,
    ) -> Result<CheckedRefs, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let refs = check_fields(&EventFields::from(input), &mut errors);
        check_sub_entity_ids(&input.tasks, &input.facility_histories, &mut errors);
        let reviewer = match input.reviewer.as_deref().map(str::trim) {
            None | Some("") => Some(None),
            Some(raw) => errors.check(parse_id::<UserId>(raw, "reviewer")).map(Some),
        };
        finish(errors, refs, reviewer)
    }

    async fn check_store(
        &self,
        name: &str,
        refs: &CheckedRefs,
        current: Option<EventId>,
        mut errors: ValidationErrors,
    ) -> Result<(), EventError> {

        if !self.references.event_type_exists(refs.event_type).await? {
            errors.push(ValidationError::UnknownReference {
                field: "eventTypeId".to_string(),
                entity: "EventType",
                id: refs.event_type.to_string(),
            });
        }
        if !self.references.user_exists(refs.owner).await? {
            errors.push(ValidationError::UnknownReference {
                field: "ownerId".to_string(),
                entity: "User",
                id: refs.owner.to_string(),
            });
        }
        if let Some(reviewer) = refs.reviewer {
            if !self.references.user_exists(reviewer).await? {
                errors.push(ValidationError::UnknownReference {
                    field: "reviewer".to_string(),
                    entity: "User",
                    id: reviewer.to_string(),
                });
            }
        }
        if self.events.name_taken(name.trim(), current).await? {
            errors.push(ValidationError::Duplicate {
                field: "name".to_string(),
                value: name.trim().to_string(),
            });
        }

        errors.into_result().map_err(EventError::Validation)
    }
}

fn finish(
    errors: ValidationErrors,
    refs: Option<(EventTypeId, UserId)>,
    reviewer: Option<Option<UserId>>,
) -> Result<CheckedRefs, ValidationErrors> {
    errors.into_result()?;
    match (refs, reviewer) {
        (Some((event_type, owner)), Some(reviewer)) => Ok(CheckedRefs {
            event_type,
            owner,
            reviewer,
        }),
        // Unreachable: a failed parse always records an error.
        _ => Err(ValidationError::invalid("eventTypeId", "could not be parsed").into()),
    }
}

fn check_fields(
    fields: &EventFields<'_>,
    errors: &mut ValidationErrors,
) -> Option<(EventTypeId, UserId)> {
    for (value, field) in [
        (fields.name, "name"),
        (fields.language, "language"),
        (fields.mode, "mode"),
        (fields.location, "location"),
        (fields.accommodation, "accommodation"),
        (fields.description, "description"),
        (fields.image, "image"),
    ] {
        errors.check(require_non_empty(value, field));
    }

    let event_type = errors.check(parse_id::<EventTypeId>(fields.event_type_id, "eventTypeId"));
    let owner = errors.check(parse_id::<UserId>(fields.owner_id, "ownerId"));

    errors.check(require_ordered(
        fields.start_date,
        fields.end_date,
        "endDate",
        "must not be before startDate",
    ));
    errors.check(require_ordered(
        fields.registration_close_date,
        fields.end_date,
        "registrationCloseDate",
        "must not be after endDate",
    ));
    if fields.max_participants == 0 {
        errors.push(ValidationError::invalid("maxParticipants", "must be greater than 0"));
    }
    if !fields.budget.is_finite() || fields.budget < 0.0 {
        errors.push(ValidationError::invalid("budget", "must be a non-negative number"));
    }

    for (i, task) in fields.tasks.iter().enumerate() {
        errors.check(require_non_empty(&task.name, &format!("tasks[{i}].name")));
        errors.check(require_non_empty(&task.task_type, &format!("tasks[{i}].type")));
        errors.check(parse_id::<UserId>(&task.user_id, &format!("tasks[{i}].userId")));
        errors.check(require_ordered(
            task.start_date,
            task.end_date,
            &format!("tasks[{i}].endDate"),
            "must not be before startDate",
        ));
    }
    for (i, history) in fields.facility_histories.iter().enumerate() {
        errors.check(parse_id::<FacilityId>(
            &history.facility_id,
            &format!("facilityHistories[{i}].facilityId"),
        ));
        errors.check(require_ordered(
            history.borrow_date,
            history.return_date,
            &format!("facilityHistories[{i}].returnDate"),
            "must not be before borrowDate",
        ));
    }
    for (i, field) in fields.custom_fields.iter().enumerate() {
        errors.check(require_non_empty(&field.name, &format!("customFields[{i}].name")));
        errors.check(require_non_empty(
            &field.field_type,
            &format!("customFields[{i}].type"),
        ));
    }

    Some((event_type?, owner?))
}

/// Existing sub-entity ids must be well formed and listed once.
fn check_sub_entity_ids(
    tasks: &[TaskInput],
    facility_histories: &[FacilityHistoryInput],
    errors: &mut ValidationErrors,
) {
    let mut seen_tasks = HashSet::new();
    for (i, task) in tasks.iter().enumerate() {
        let Some(raw) = task.id.as_deref() else { continue };
        let field = format!("tasks[{i}].id");
        if let Some(id) = errors.check(parse_id::<TaskId>(raw, &field)) {
            if !seen_tasks.insert(id) {
                errors.push(ValidationError::invalid(field, "listed more than once"));
            }
        }
    }

    let mut seen_histories = HashSet::new();
    for (i, history) in facility_histories.iter().enumerate() {
        let Some(raw) = history.id.as_deref() else { continue };
        let field = format!("facilityHistories[{i}].id");
        if let Some(id) = errors.check(parse_id::<FacilityHistoryId>(raw, &field)) {
            if !seen_histories.insert(id) {
                errors.push(ValidationError::invalid(field, "listed more than once"));
            }
        }
    }
}

/// Existing sub-entity ids on an update must belong to the event itself.
fn check_owned<'a, Id>(
    raw_ids: impl Iterator<Item = Option<&'a str>>,
    owned: &[Id],
    list: &str,
    errors: &mut ValidationErrors,
) where
    Id: std::str::FromStr + PartialEq,
{
    for (i, raw) in raw_ids.enumerate() {
        let Some(raw) = raw else { continue };
        // Malformed ids are already reported by the field checks.
        let Ok(id) = raw.trim().parse::<Id>() else { continue };
        if !owned.contains(&id) {
            errors.push(ValidationError::invalid(
                format!("{list}[{i}].id"),
                "does not belong to this event",
            ));
        }
    }
}
