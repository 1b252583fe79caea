//! Soft delete of events.

use std::sync::Arc;

use netevent_domain::{Event, EventId};

use super::EventError;
use crate::infrastructure::ports::{ClockPort, EventUpdate, IdRef};
use crate::repositories::EventRepository;

/// Marks an event deleted. Sub-entities are left in place.
pub struct DeleteEvent {
    events: Arc<EventRepository>,
    clock: Arc<dyn ClockPort>,
}

impl DeleteEvent {
    pub fn new(events: Arc<EventRepository>, clock: Arc<dyn ClockPort>) -> Self {
        Self { events, clock }
    }

    /// Deleting an already deleted event returns it unchanged.
    pub async fn execute(&self, id: impl Into<IdRef<EventId>>) -> Result<Event, EventError> {
        let id = id.into().resolve()?;
        let event = self.events.get(id).await?;
        if event.is_deleted {
            return Ok(event);
        }

        let update = EventUpdate {
            is_deleted: Some(true),
            updated_at: Some(self.clock.now()),
            ..EventUpdate::default()
        };
        let event = self.events.update(id, &update).await?;
        tracing::info!(event_id = %id, "Event soft-deleted");
        Ok(event)
    }
}
