//! Task document operations.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use netevent_domain::{EventId, Task, TaskId};

use crate::infrastructure::ports::{IdRef, RepoError, TaskDraft, TaskFilter, TaskRepo, TaskUpdate};

/// Task document operations.
pub struct TaskRepository {
    repo: Arc<dyn TaskRepo>,
}

impl TaskRepository {
    pub fn new(repo: Arc<dyn TaskRepo>) -> Self {
        Self { repo }
    }

    pub async fn get(&self, id: impl Into<IdRef<TaskId>>) -> Result<Task, RepoError> {
        let id = id.into().resolve()?;
        self.repo.find_one(&TaskFilter::by_id(id)).await
    }

    /// Tasks with the given ids, in the order the ids are listed.
    ///
    /// Ids with no stored document are skipped.
    pub async fn find_many(&self, ids: &[TaskId]) -> Result<Vec<Task>, RepoError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let found = self.repo.find_all(&TaskFilter::by_ids(ids.to_vec())).await?;
        Ok(ids
            .iter()
            .filter_map(|id| found.iter().find(|t| t.id == *id).cloned())
            .collect())
    }

    /// Tasks whose back-link points at `event_id`.
    pub async fn find_by_event(&self, event_id: EventId) -> Result<Vec<Task>, RepoError> {
        self.repo.find_all(&TaskFilter::by_event(event_id)).await
    }

    pub async fn create(&self, draft: &TaskDraft) -> Result<Task, RepoError> {
        let task = self.repo.create(draft).await?;
        tracing::debug!(task_id = %task.id, event_id = ?task.event, "Task created");
        Ok(task)
    }

    pub async fn update(
        &self,
        id: impl Into<IdRef<TaskId>>,
        update: &TaskUpdate,
    ) -> Result<Task, RepoError> {
        let id = id.into().resolve()?;
        self.repo.update_one(&TaskFilter::by_id(id), update).await
    }

    /// Point the task's back-link at `event_id`.
    pub async fn set_event(
        &self,
        id: TaskId,
        event_id: EventId,
        now: DateTime<Utc>,
    ) -> Result<Task, RepoError> {
        self.repo
            .update_one(&TaskFilter::by_id(id), &TaskUpdate::link_event(event_id, now))
            .await
    }

    pub async fn delete(&self, id: impl Into<IdRef<TaskId>>) -> Result<Task, RepoError> {
        let id = id.into().resolve()?;
        let task = self.repo.delete_one(&TaskFilter::by_id(id)).await?;
        tracing::debug!(task_id = %id, "Task deleted");
        Ok(task)
    }
}
