//! Existence checks against collections the engine does not own.

use std::sync::Arc;

use netevent_domain::{EventTypeId, FacilityId, UserId};

use crate::infrastructure::ports::{ReferenceRepo, RepoError};

pub struct ReferenceLookup {
    repo: Arc<dyn ReferenceRepo>,
}

impl ReferenceLookup {
    pub fn new(repo: Arc<dyn ReferenceRepo>) -> Self {
        Self { repo }
    }

    pub async fn user_exists(&self, id: UserId) -> Result<bool, RepoError> {
        let exists = self.repo.user_exists(id).await?;
        if !exists {
            tracing::debug!(user_id = %id, "Referenced user not found");
        }
        Ok(exists)
    }

    pub async fn facility_exists(&self, id: FacilityId) -> Result<bool, RepoError> {
        let exists = self.repo.facility_exists(id).await?;
        if !exists {
            tracing::debug!(facility_id = %id, "Referenced facility not found");
        }
        Ok(exists)
    }

    pub async fn event_type_exists(&self, id: EventTypeId) -> Result<bool, RepoError> {
        let exists = self.repo.event_type_exists(id).await?;
        if !exists {
            tracing::debug!(event_type_id = %id, "Referenced event type not found");
        }
        Ok(exists)
    }
}
