//! Read side: event listings and the aggregated detail view.

use std::sync::Arc;

use netevent_domain::{Event, EventId, FacilityHistory, Task};

use super::EventError;
use crate::infrastructure::ports::IdRef;
use crate::repositories::{EventRepository, FacilityHistoryRepository, TaskRepository};

/// An event with its referenced sub-entities resolved.
#[derive(Debug, Clone)]
pub struct EventDetails {
    pub event: Event,
    pub tasks: Vec<Task>,
    pub facility_histories: Vec<FacilityHistory>,
}

/// Fetch an event and resolve its reference lists.
///
/// Sub-entities come back in the event's reference order; a dangling
/// reference is skipped rather than failing the read.
pub struct GetEventDetails {
    events: Arc<EventRepository>,
    tasks: Arc<TaskRepository>,
    facility_histories: Arc<FacilityHistoryRepository>,
}

impl GetEventDetails {
    pub fn new(
        events: Arc<EventRepository>,
        tasks: Arc<TaskRepository>,
        facility_histories: Arc<FacilityHistoryRepository>,
    ) -> Self {
        Self {
            events,
            tasks,
            facility_histories,
        }
    }

    pub async fn execute(&self, id: impl Into<IdRef<EventId>>) -> Result<EventDetails, EventError> {
        let event = self.events.get(id).await?;
        let (tasks, facility_histories) = tokio::try_join!(
            self.tasks.find_many(&event.tasks),
            self.facility_histories.find_many(&event.facility_histories),
        )?;

        let missing = event.tasks.len().saturating_sub(tasks.len())
            + event
                .facility_histories
                .len()
                .saturating_sub(facility_histories.len());
        if missing > 0 {
            tracing::warn!(event_id = %event.id, missing, "Event has dangling sub-entity references");
        }

        Ok(EventDetails {
            event,
            tasks,
            facility_histories,
        })
    }
}

pub struct ListEvents {
    events: Arc<EventRepository>,
}

impl ListEvents {
    pub fn new(events: Arc<EventRepository>) -> Self {
        Self { events }
    }

    pub async fn execute(&self, include_deleted: bool) -> Result<Vec<Event>, EventError> {
        Ok(self.events.list(include_deleted).await?)
    }
}
