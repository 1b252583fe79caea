//! Neo4j document-store implementations.

use std::sync::Arc;

use crate::infrastructure::ports::ClockPort;

mod event_repo;
mod facility_history_repo;
mod graph;
mod helpers;
mod reference_repo;
mod schema;
mod task_repo;

#[cfg(test)]
mod test_harness;

pub use event_repo::Neo4jEventRepo;
pub use facility_history_repo::Neo4jFacilityHistoryRepo;
pub use graph::{Neo4jGraph, DEFAULT_STORE_TIMEOUT};
pub use reference_repo::Neo4jReferenceRepo;
pub use schema::ensure_schema;
pub use task_repo::Neo4jTaskRepo;

/// Create all Neo4j repositories from a graph connection.
pub struct Neo4jRepositories {
    pub event: Arc<Neo4jEventRepo>,
    pub task: Arc<Neo4jTaskRepo>,
    pub facility_history: Arc<Neo4jFacilityHistoryRepo>,
    pub references: Arc<Neo4jReferenceRepo>,
}

impl Neo4jRepositories {
    pub fn new(graph: Neo4jGraph, clock: Arc<dyn ClockPort>) -> Self {
        Self {
            event: Arc::new(Neo4jEventRepo::new(graph.clone(), clock.clone())),
            task: Arc::new(Neo4jTaskRepo::new(graph.clone(), clock.clone())),
            facility_history: Arc::new(Neo4jFacilityHistoryRepo::new(graph.clone(), clock)),
            references: Arc::new(Neo4jReferenceRepo::new(graph)),
        }
    }
}
