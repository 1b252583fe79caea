//! Neo4j facility-history repository implementation.

use std::sync::Arc;

use async_trait::async_trait;
use netevent_domain::{FacilityHistory, FacilityHistoryId};
use neo4rs::{Node, Row};

use super::helpers::{
    decode_error, ids_to_strings, optional_id, parse_optional_typed_id, parse_typed_id,
    CypherParts, NodeExt,
};
use super::Neo4jGraph;
use crate::infrastructure::ports::{
    ClockPort, FacilityHistoryDraft, FacilityHistoryFilter, FacilityHistoryRepo,
    FacilityHistoryUpdate, RepoError,
};

pub struct Neo4jFacilityHistoryRepo {
    graph: Neo4jGraph,
    clock: Arc<dyn ClockPort>,
}

impl Neo4jFacilityHistoryRepo {
    pub fn new(graph: Neo4jGraph, clock: Arc<dyn ClockPort>) -> Self {
        Self { graph, clock }
    }

    fn filter_parts(filter: &FacilityHistoryFilter) -> CypherParts {
        let mut parts = CypherParts::new();
        if let Some(id) = filter.id {
            parts.condition("h", "id", "=", "id", id.to_string());
        }
        if let Some(ids) = &filter.ids {
            parts.condition("h", "id", "IN", "ids", ids_to_strings(ids));
        }
        if let Some(event) = filter.event {
            parts.condition("h", "event_id", "=", "event_id", event.to_string());
        }
        parts
    }

    fn row_to_history(row: Row) -> Result<FacilityHistory, RepoError> {
        let node: Node = row.get("h").map_err(|e| RepoError::database("query", e))?;

        let id: FacilityHistoryId =
            parse_typed_id(&node, "id").map_err(|e| decode_error("FacilityHistory", e))?;
        Ok(FacilityHistory {
            id,
            created_at: node.get_datetime_strict("created_at")?,
            updated_at: node.get_datetime_strict("updated_at")?,
            facility: parse_typed_id(&node, "facility_id")
                .map_err(|e| decode_error("FacilityHistory", e))?,
            borrow_date: node.get_datetime_strict("borrow_date")?,
            return_date: node.get_datetime_strict("return_date")?,
            event: parse_optional_typed_id(&node, "event_id")
                .map_err(|e| decode_error("FacilityHistory", e))?,
        })
    }
}

#[async_trait]
impl FacilityHistoryRepo for Neo4jFacilityHistoryRepo {
    async fn find_all(
        &self,
        filter: &FacilityHistoryFilter,
    ) -> Result<Vec<FacilityHistory>, RepoError> {
        let parts = Self::filter_parts(filter);
        let cypher = format!(
            "MATCH (h:FacilityHistory) {} RETURN h ORDER BY h.created_at, h.id",
            parts.where_clause()
        );
        let rows = self.graph.fetch("find_all", parts.into_query(cypher)).await?;
        rows.into_iter().map(Self::row_to_history).collect()
    }

    async fn find_one(&self, filter: &FacilityHistoryFilter) -> Result<FacilityHistory, RepoError> {
        let parts = Self::filter_parts(filter);
        let cypher = format!(
            "MATCH (h:FacilityHistory) {} RETURN h ORDER BY h.created_at, h.id LIMIT 1",
            parts.where_clause()
        );
        match self.graph.fetch_first("find_one", parts.into_query(cypher)).await? {
            Some(row) => Self::row_to_history(row),
            None => Err(RepoError::not_found("FacilityHistory", filter.describe())),
        }
    }

    async fn create(&self, draft: &FacilityHistoryDraft) -> Result<FacilityHistory, RepoError> {
        let history = draft
            .clone()
            .into_facility_history(FacilityHistoryId::new(), self.clock.now());

        let q = neo4rs::query(
            "CREATE (h:FacilityHistory {
                id: $id,
                created_at: $created_at,
                updated_at: $updated_at,
                facility_id: $facility_id,
                borrow_date: $borrow_date,
                return_date: $return_date,
                event_id: $event_id
            })",
        )
        .param("id", history.id.to_string())
        .param("created_at", history.created_at.to_rfc3339())
        .param("updated_at", history.updated_at.to_rfc3339())
        .param("facility_id", history.facility.to_string())
        .param("borrow_date", history.borrow_date.to_rfc3339())
        .param("return_date", history.return_date.to_rfc3339())
        .param("event_id", optional_id(history.event));

        self.graph.run("create", q).await?;
        Ok(history)
    }

    async fn update_one(
        &self,
        filter: &FacilityHistoryFilter,
        update: &FacilityHistoryUpdate,
    ) -> Result<FacilityHistory, RepoError> {
        let mut parts = Self::filter_parts(filter);
        if let Some(v) = update.facility {
            parts.assign("h", "facility_id", v.to_string());
        }
        if let Some(v) = update.borrow_date {
            parts.assign("h", "borrow_date", v.to_rfc3339());
        }
        if let Some(v) = update.return_date {
            parts.assign("h", "return_date", v.to_rfc3339());
        }
        if let Some(v) = update.event {
            parts.assign("h", "event_id", v.to_string());
        }
        if let Some(v) = update.updated_at {
            parts.assign("h", "updated_at", v.to_rfc3339());
        }

        let cypher = format!(
            "MATCH (h:FacilityHistory) {}
             WITH h ORDER BY h.created_at, h.id LIMIT 1
             {}
             RETURN h",
            parts.where_clause(),
            parts.set_clause()
        );
        match self
            .graph
            .fetch_first("update_one", parts.into_query(cypher))
            .await?
        {
            Some(row) => Self::row_to_history(row),
            None => Err(RepoError::not_found("FacilityHistory", filter.describe())),
        }
    }

    async fn delete_one(
        &self,
        filter: &FacilityHistoryFilter,
    ) -> Result<FacilityHistory, RepoError> {
        let history = self.find_one(filter).await?;
        let q = neo4rs::query(
            "MATCH (h:FacilityHistory {id: $id})
             DETACH DELETE h
             RETURN count(*) AS deleted",
        )
        .param("id", history.id.to_string());

        let deleted = self
            .graph
            .fetch_first("delete_one", q)
            .await?
            .and_then(|row| row.get::<i64>("deleted").ok())
            .unwrap_or(0);
        if deleted == 0 {
            return Err(RepoError::not_found("FacilityHistory", filter.describe()));
        }
        Ok(history)
    }
}
