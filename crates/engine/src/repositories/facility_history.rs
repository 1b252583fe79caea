//! Facility-history document operations.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use netevent_domain::{EventId, FacilityHistory, FacilityHistoryId};

use crate::infrastructure::ports::{
    FacilityHistoryDraft, FacilityHistoryFilter, FacilityHistoryRepo, FacilityHistoryUpdate, IdRef,
    RepoError,
};

/// Facility-history document operations.
pub struct FacilityHistoryRepository {
    repo: Arc<dyn FacilityHistoryRepo>,
}

impl FacilityHistoryRepository {
    pub fn new(repo: Arc<dyn FacilityHistoryRepo>) -> Self {
        Self { repo }
    }

    pub async fn get(
        &self,
        id: impl Into<IdRef<FacilityHistoryId>>,
    ) -> Result<FacilityHistory, RepoError> {
        let id = id.into().resolve()?;
        self.repo.find_one(&FacilityHistoryFilter::by_id(id)).await
    }

    /// Entries with the given ids in listed order; unknown ids are skipped.
    pub async fn find_many(
        &self,
        ids: &[FacilityHistoryId],
    ) -> Result<Vec<FacilityHistory>, RepoError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let found = self
            .repo
            .find_all(&FacilityHistoryFilter::by_ids(ids.to_vec()))
            .await?;
        Ok(ids
            .iter()
            .filter_map(|id| found.iter().find(|h| h.id == *id).cloned())
            .collect())
    }

    pub async fn find_by_event(&self, event_id: EventId) -> Result<Vec<FacilityHistory>, RepoError> {
        self.repo
            .find_all(&FacilityHistoryFilter::by_event(event_id))
            .await
    }

    pub async fn create(&self, draft: &FacilityHistoryDraft) -> Result<FacilityHistory, RepoError> {
        let history = self.repo.create(draft).await?;
        tracing::debug!(
            facility_history_id = %history.id,
            facility_id = %history.facility,
            "Facility history created"
        );
        Ok(history)
    }

    pub async fn update(
        &self,
        id: impl Into<IdRef<FacilityHistoryId>>,
        update: &FacilityHistoryUpdate,
    ) -> Result<FacilityHistory, RepoError> {
        let id = id.into().resolve()?;
        self.repo
            .update_one(&FacilityHistoryFilter::by_id(id), update)
            .await
    }

    pub async fn set_event(
        &self,
        id: FacilityHistoryId,
        event_id: EventId,
        now: DateTime<Utc>,
    ) -> Result<FacilityHistory, RepoError> {
        self.repo
            .update_one(
                &FacilityHistoryFilter::by_id(id),
                &FacilityHistoryUpdate::link_event(event_id, now),
            )
            .await
    }

    pub async fn delete(
        &self,
        id: impl Into<IdRef<FacilityHistoryId>>,
    ) -> Result<FacilityHistory, RepoError> {
        let id = id.into().resolve()?;
        let history = self
            .repo
            .delete_one(&FacilityHistoryFilter::by_id(id))
            .await?;
        tracing::debug!(facility_history_id = %id, "Facility history deleted");
        Ok(history)
    }
}
