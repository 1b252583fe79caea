//! Application state and composition.

use std::sync::Arc;
use std::time::Duration;

use crate::infrastructure::{
    memory::InMemoryStore,
    neo4j::Neo4jRepositories,
    ports::{ClockPort, EventRepo, FacilityHistoryRepo, ReferenceRepo, SagaLogPort, TaskRepo},
};
use crate::repositories::{
    EventRepository, FacilityHistoryRepository, ReferenceLookup, TaskRepository,
};
use crate::use_cases::{EventStores, EventUseCases};

/// Main application state.
///
/// Passed to HTTP handlers via Axum state.
pub struct App {
    pub use_cases: UseCases,
}

/// Container for all use cases.
pub struct UseCases {
    pub events: EventUseCases,
}

/// Store ports for the three collections plus reference checks.
pub struct StorePorts {
    pub event: Arc<dyn EventRepo>,
    pub task: Arc<dyn TaskRepo>,
    pub facility_history: Arc<dyn FacilityHistoryRepo>,
    pub references: Arc<dyn ReferenceRepo>,
}

impl From<Neo4jRepositories> for StorePorts {
    fn from(repos: Neo4jRepositories) -> Self {
        Self {
            event: repos.event,
            task: repos.task,
            facility_history: repos.facility_history,
            references: repos.references,
        }
    }
}

impl From<Arc<InMemoryStore>> for StorePorts {
    fn from(store: Arc<InMemoryStore>) -> Self {
        Self {
            event: store.clone(),
            task: store.clone(),
            facility_history: store.clone(),
            references: store,
        }
    }
}

impl App {
    /// Create a new App with all dependencies wired up.
    pub fn new(
        ports: StorePorts,
        saga_log: Arc<dyn SagaLogPort>,
        clock: Arc<dyn ClockPort>,
        operation_deadline: Option<Duration>,
    ) -> Self {
        let stores = EventStores {
            events: Arc::new(EventRepository::new(ports.event)),
            tasks: Arc::new(TaskRepository::new(ports.task)),
            facility_histories: Arc::new(FacilityHistoryRepository::new(ports.facility_history)),
            references: Arc::new(ReferenceLookup::new(ports.references)),
            clock,
        };

        Self {
            use_cases: UseCases {
                events: EventUseCases::new(stores, saga_log, operation_deadline),
            },
        }
    }
}
