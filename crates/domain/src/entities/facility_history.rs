//! FacilityHistory entity - A facility borrowed for an event's duration

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{EventId, FacilityHistoryId, FacilityId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacilityHistory {
    pub id: FacilityHistoryId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub facility: FacilityId,
    pub borrow_date: DateTime<Utc>,
    pub return_date: DateTime<Utc>,
    /// Back-link to the owning event; empty until the event exists
    pub event: Option<EventId>,
}

impl FacilityHistory {
    pub fn is_linked_to(&self, event_id: EventId) -> bool {
        self.event == Some(event_id)
    }

    /// Compare everything except identity and timestamps.
    pub fn same_content(&self, other: &FacilityHistory) -> bool {
        self.facility == other.facility
            && self.borrow_date == other.borrow_date
            && self.return_date == other.return_date
            && self.event == other.event
    }
}
