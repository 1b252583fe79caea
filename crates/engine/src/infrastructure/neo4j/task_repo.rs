//! Neo4j task repository implementation.

use std::sync::Arc;

use async_trait::async_trait;
use netevent_domain::{Task, TaskId};
use neo4rs::{Node, Row};

use super::helpers::{
    decode_error, ids_to_strings, optional_id, parse_optional_typed_id, parse_typed_id,
    CypherParts, NodeExt,
};
use super::Neo4jGraph;
use crate::infrastructure::ports::{
    ClockPort, RepoError, TaskDraft, TaskFilter, TaskRepo, TaskUpdate,
};

pub struct Neo4jTaskRepo {
    graph: Neo4jGraph,
    clock: Arc<dyn ClockPort>,
}

impl Neo4jTaskRepo {
    pub fn new(graph: Neo4jGraph, clock: Arc<dyn ClockPort>) -> Self {
        Self { graph, clock }
    }

    fn filter_parts(filter: &TaskFilter) -> CypherParts {
        let mut parts = CypherParts::new();
        if let Some(id) = filter.id {
            parts.condition("t", "id", "=", "id", id.to_string());
        }
        if let Some(ids) = &filter.ids {
            parts.condition("t", "id", "IN", "ids", ids_to_strings(ids));
        }
        if let Some(event) = filter.event {
            parts.condition("t", "event_id", "=", "event_id", event.to_string());
        }
        parts
    }

    fn row_to_task(row: Row) -> Result<Task, RepoError> {
        let node: Node = row.get("t").map_err(|e| RepoError::database("query", e))?;

        let id: TaskId = parse_typed_id(&node, "id").map_err(|e| decode_error("Task", e))?;
        Ok(Task {
            id,
            created_at: node.get_datetime_strict("created_at")?,
            updated_at: node.get_datetime_strict("updated_at")?,
            event: parse_optional_typed_id(&node, "event_id")
                .map_err(|e| decode_error("Task", e))?,
            name: node.get_string_strict("name")?,
            user: parse_typed_id(&node, "user_id").map_err(|e| decode_error("Task", e))?,
            task_type: node.get_string_or("type", ""),
            start_date: node.get_datetime_strict("start_date")?,
            end_date: node.get_datetime_strict("end_date")?,
        })
    }
}

#[async_trait]
impl TaskRepo for Neo4jTaskRepo {
    async fn find_all(&self, filter: &TaskFilter) -> Result<Vec<Task>, RepoError> {
        let parts = Self::filter_parts(filter);
        let cypher = format!(
            "MATCH (t:Task) {} RETURN t ORDER BY t.created_at, t.id",
            parts.where_clause()
        );
        let rows = self.graph.fetch("find_all", parts.into_query(cypher)).await?;
        rows.into_iter().map(Self::row_to_task).collect()
    }

    async fn find_one(&self, filter: &TaskFilter) -> Result<Task, RepoError> {
        let parts = Self::filter_parts(filter);
        let cypher = format!(
            "MATCH (t:Task) {} RETURN t ORDER BY t.created_at, t.id LIMIT 1",
            parts.where_clause()
        );
        match self.graph.fetch_first("find_one", parts.into_query(cypher)).await? {
            Some(row) => Self::row_to_task(row),
            None => Err(RepoError::not_found("Task", filter.describe())),
        }
    }

    async fn create(&self, draft: &TaskDraft) -> Result<Task, RepoError> {
        let task = draft.clone().into_task(TaskId::new(), self.clock.now());

        let q = neo4rs::query(
            "CREATE (t:Task {
                id: $id,
                created_at: $created_at,
                updated_at: $updated_at,
                event_id: $event_id,
                name: $name,
                user_id: $user_id,
                type: $type,
                start_date: $start_date,
                end_date: $end_date
            })",
        )
        .param("id", task.id.to_string())
        .param("created_at", task.created_at.to_rfc3339())
        .param("updated_at", task.updated_at.to_rfc3339())
        .param("event_id", optional_id(task.event))
        .param("name", task.name.clone())
        .param("user_id", task.user.to_string())
        .param("type", task.task_type.clone())
        .param("start_date", task.start_date.to_rfc3339())
        .param("end_date", task.end_date.to_rfc3339());

        self.graph.run("create", q).await?;
        Ok(task)
    }

    async fn update_one(&self, filter: &TaskFilter, update: &TaskUpdate) -> Result<Task, RepoError> {
        let mut parts = Self::filter_parts(filter);
        if let Some(v) = update.event {
            parts.assign("t", "event_id", v.to_string());
        }
        if let Some(v) = &update.name {
            parts.assign("t", "name", v.clone());
        }
        if let Some(v) = update.user {
            parts.assign("t", "user_id", v.to_string());
        }
        if let Some(v) = &update.task_type {
            parts.assign("t", "type", v.clone());
        }
        if let Some(v) = update.start_date {
            parts.assign("t", "start_date", v.to_rfc3339());
        }
        if let Some(v) = update.end_date {
            parts.assign("t", "end_date", v.to_rfc3339());
        }
        if let Some(v) = update.updated_at {
            parts.assign("t", "updated_at", v.to_rfc3339());
        }

        let cypher = format!(
            "MATCH (t:Task) {}
             WITH t ORDER BY t.created_at, t.id LIMIT 1
             {}
             RETURN t",
            parts.where_clause(),
            parts.set_clause()
        );
        match self
            .graph
            .fetch_first("update_one", parts.into_query(cypher))
            .await?
        {
            Some(row) => Self::row_to_task(row),
            None => Err(RepoError::not_found("Task", filter.describe())),
        }
    }

    async fn delete_one(&self, filter: &TaskFilter) -> Result<Task, RepoError> {
        let task = self.find_one(filter).await?;
        let q = neo4rs::query(
            "MATCH (t:Task {id: $id})
             DETACH DELETE t
             RETURN count(*) AS deleted",
        )
        .param("id", task.id.to_string());

        let deleted = self
            .graph
            .fetch_first("delete_one", q)
            .await?
            .and_then(|row| row.get::<i64>("deleted").ok())
            .unwrap_or(0);
        if deleted == 0 {
            return Err(RepoError::not_found("Task", filter.describe()));
        }
        Ok(task)
    }
}
