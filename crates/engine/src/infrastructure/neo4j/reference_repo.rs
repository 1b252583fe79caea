//! Existence checks for users, facilities and event types.
//!
//! These collections are owned by other services; the engine only asks
//! whether an id is present.

use async_trait::async_trait;
use netevent_domain::{EventTypeId, FacilityId, UserId};
use neo4rs::query;

use super::Neo4jGraph;
use crate::infrastructure::ports::{ReferenceRepo, RepoError};

pub struct Neo4jReferenceRepo {
    graph: Neo4jGraph,
}

impl Neo4jReferenceRepo {
    pub fn new(graph: Neo4jGraph) -> Self {
        Self { graph }
    }

    async fn exists(&self, cypher: &str, id: String) -> Result<bool, RepoError> {
        let row = self
            .graph
            .fetch_first("exists", query(cypher).param("id", id))
            .await?;
        let count = row
            .map(|r| r.get::<i64>("n"))
            .transpose()
            .map_err(|e| RepoError::database("exists", e))?
            .unwrap_or(0);
        Ok(count > 0)
    }
}

#[async_trait]
impl ReferenceRepo for Neo4jReferenceRepo {
    async fn user_exists(&self, id: UserId) -> Result<bool, RepoError> {
        self.exists("MATCH (u:User {id: $id}) RETURN count(u) AS n", id.to_string())
            .await
    }

    async fn facility_exists(&self, id: FacilityId) -> Result<bool, RepoError> {
        self.exists(
            "MATCH (f:Facility {id: $id}) RETURN count(f) AS n",
            id.to_string(),
        )
        .await
    }

    async fn event_type_exists(&self, id: EventTypeId) -> Result<bool, RepoError> {
        self.exists(
            "MATCH (t:EventType {id: $id}) RETURN count(t) AS n",
            id.to_string(),
        )
        .await
    }
}
