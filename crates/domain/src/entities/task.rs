//! Task entity - A unit of work assigned to a user within an event

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{EventId, TaskId, UserId};

/// A persisted task document.
///
/// `event` is empty while the owning event is still being created and is
/// back-filled once the event document exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub event: Option<EventId>,
    pub name: String,
    pub user: UserId,
    #[serde(rename = "type")]
    pub task_type: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

impl Task {
    pub fn is_linked_to(&self, event_id: EventId) -> bool {
        self.event == Some(event_id)
    }

    /// Compare everything except identity and timestamps.
    pub fn same_content(&self, other: &Task) -> bool {
        self.event == other.event
            && self.name == other.name
            && self.user == other.user
            && self.task_type == other.task_type
            && self.start_date == other.start_date
            && self.end_date == other.end_date
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn task() -> Task {
        let t = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        Task {
            id: TaskId::new(),
            created_at: t,
            updated_at: t,
            event: None,
            name: "Set up stage".to_string(),
            user: UserId::new(),
            task_type: "logistics".to_string(),
            start_date: t,
            end_date: t,
        }
    }

    #[test]
    fn same_content_ignores_identity() {
        let a = task();
        let mut b = a.clone();
        b.id = TaskId::new();
        b.created_at = b.created_at + chrono::Duration::days(1);
        assert!(a.same_content(&b));

        b.name = "Tear down stage".to_string();
        assert!(!a.same_content(&b));
    }

    #[test]
    fn unlinked_task_is_not_linked_to_any_event() {
        let t = task();
        assert!(!t.is_linked_to(EventId::new()));
    }
}
