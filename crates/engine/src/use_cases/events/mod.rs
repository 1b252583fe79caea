//! Event consistency engine.
//!
//! Composite writes that keep an Event and its Tasks / FacilityHistories in
//! step across three collections with no multi-document transaction. Each
//! write fans out one sequential unit per sub-entity collection, persists the
//! event, and compensates on any failure. Progress is journaled as a
//! [`SagaRecord`](netevent_domain::SagaRecord) so a crash can be resolved by
//! [`RecoverSagas`] on the next start.

use std::sync::Arc;
use std::time::Duration;

use netevent_domain::CustomField;
use netevent_shared::CustomFieldInput;

use crate::infrastructure::ports::{ClockPort, RepoError, SagaLogPort};
use crate::repositories::{
    EventRepository, FacilityHistoryRepository, ReferenceLookup, TaskRepository,
};
use crate::use_cases::validation::{ValidationError, ValidationErrors};

mod create;
mod delete;
mod details;
mod fan_out;
mod journal;
mod recovery;
mod rollback;
mod update;
mod validate;

#[cfg(test)]
mod scenario_tests;

pub use create::CreateEvent;
pub use delete::DeleteEvent;
pub use details::{EventDetails, GetEventDetails, ListEvents};
pub use fan_out::BatchOutcome;
pub use journal::SagaJournal;
pub use recovery::{RecoverSagas, RecoveryReport};
pub use update::UpdateEvent;
pub use validate::ValidateEvent;

/// Errors from event use cases.
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("{entity_type} not found: {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// A referenced user or facility does not exist.
    #[error("{field} refers to a missing {entity}: {id}")]
    InvalidReference {
        field: String,
        entity: &'static str,
        id: String,
    },

    #[error("Operation cancelled")]
    Cancelled,

    /// Compensation could not undo a failed write; data may be partial.
    #[error("Rollback failed after '{cause}': {source}")]
    RollbackFailed {
        cause: String,
        #[source]
        source: RepoError,
    },

    #[error("Repository error: {0}")]
    Repo(RepoError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl EventError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<RepoError> for EventError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::NotFound { entity_type, id } => Self::NotFound { entity_type, id },
            RepoError::InvalidId(reason) => {
                Self::Validation(ValidationError::invalid("id", reason).into())
            }
            other => Self::Repo(other),
        }
    }
}

impl From<ValidationError> for EventError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e.into())
    }
}

/// Repositories and clock shared by every event use case.
#[derive(Clone)]
pub struct EventStores {
    pub events: Arc<EventRepository>,
    pub tasks: Arc<TaskRepository>,
    pub facility_histories: Arc<FacilityHistoryRepository>,
    pub references: Arc<ReferenceLookup>,
    pub clock: Arc<dyn ClockPort>,
}

/// Container for event use cases.
pub struct EventUseCases {
    pub validate: Arc<ValidateEvent>,
    pub create: Arc<CreateEvent>,
    pub update: Arc<UpdateEvent>,
    pub delete: Arc<DeleteEvent>,
    pub details: Arc<GetEventDetails>,
    pub list: Arc<ListEvents>,
    pub recover: Arc<RecoverSagas>,
}

impl EventUseCases {
    /// Wire every event use case over one set of stores and one journal.
    ///
    /// `deadline` bounds each composite write; when it expires the write is
    /// cancelled and rolled back.
    pub fn new(
        stores: EventStores,
        saga_log: Arc<dyn SagaLogPort>,
        deadline: Option<Duration>,
    ) -> Self {
        let journal = Arc::new(SagaJournal::new(saga_log, stores.clock.clone()));
        Self {
            validate: Arc::new(ValidateEvent::new(
                stores.events.clone(),
                stores.references.clone(),
            )),
            create: Arc::new(CreateEvent::new(stores.clone(), journal.clone(), deadline)),
            update: Arc::new(UpdateEvent::new(stores.clone(), journal.clone(), deadline)),
            delete: Arc::new(DeleteEvent::new(stores.events.clone(), stores.clock.clone())),
            details: Arc::new(GetEventDetails::new(
                stores.events.clone(),
                stores.tasks.clone(),
                stores.facility_histories.clone(),
            )),
            list: Arc::new(ListEvents::new(stores.events.clone())),
            recover: Arc::new(RecoverSagas::new(stores, journal)),
        }
    }
}

fn custom_fields(inputs: &[CustomFieldInput]) -> Vec<CustomField> {
    inputs
        .iter()
        .map(|f| CustomField {
            name: f.name.clone(),
            field_type: f.field_type.clone(),
            values: f.values.clone(),
            required: f.required,
        })
        .collect()
}
