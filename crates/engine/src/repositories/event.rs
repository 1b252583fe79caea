//! Event document operations.

use std::sync::Arc;

use netevent_domain::{Event, EventId};

use crate::infrastructure::ports::{EventDraft, EventFilter, EventRepo, EventUpdate, IdRef, RepoError};

/// Event document operations.
pub struct EventRepository {
    repo: Arc<dyn EventRepo>,
}

impl EventRepository {
    pub fn new(repo: Arc<dyn EventRepo>) -> Self {
        Self { repo }
    }

    pub async fn get(&self, id: impl Into<IdRef<EventId>>) -> Result<Event, RepoError> {
        let id = id.into().resolve()?;
        self.repo.find_one(&EventFilter::by_id(id)).await
    }

    pub async fn find_all(&self, filter: &EventFilter) -> Result<Vec<Event>, RepoError> {
        self.repo.find_all(filter).await
    }

    /// All events; soft-deleted ones only when asked for.
    pub async fn list(&self, include_deleted: bool) -> Result<Vec<Event>, RepoError> {
        let filter = if include_deleted {
            EventFilter::default()
        } else {
            EventFilter::default().deleted(false)
        };
        self.repo.find_all(&filter).await
    }

    /// Whether a non-deleted event other than `excluding` already uses `name`.
    pub async fn name_taken(
        &self,
        name: &str,
        excluding: Option<EventId>,
    ) -> Result<bool, RepoError> {
        let mut filter = EventFilter::by_name(name).deleted(false);
        if let Some(id) = excluding {
            filter = filter.excluding(id);
        }
        let matches = self.repo.find_all(&filter).await?;
        Ok(!matches.is_empty())
    }

    pub async fn create(&self, draft: &EventDraft) -> Result<Event, RepoError> {
        let event = self.repo.create(draft).await?;
        tracing::debug!(event_id = %event.id, name = %event.name, "Event document created");
        Ok(event)
    }

    pub async fn update(
        &self,
        id: impl Into<IdRef<EventId>>,
        update: &EventUpdate,
    ) -> Result<Event, RepoError> {
        let id = id.into().resolve()?;
        self.repo.update_one(&EventFilter::by_id(id), update).await
    }

    /// Hard delete. Only compensation removes event documents.
    pub async fn delete(&self, id: impl Into<IdRef<EventId>>) -> Result<Event, RepoError> {
        let id = id.into().resolve()?;
        let event = self.repo.delete_one(&EventFilter::by_id(id)).await?;
        tracing::debug!(event_id = %id, "Event document deleted");
        Ok(event)
    }
}
