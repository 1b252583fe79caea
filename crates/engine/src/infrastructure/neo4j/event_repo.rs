//! Neo4j event repository implementation.
//!
//! Events are standalone `:Event` nodes. Task and facility-history references
//! are id-string lists (`task_ids`, `facility_history_ids`); no relationships
//! are created.

use std::sync::Arc;

use async_trait::async_trait;
use netevent_domain::{CustomField, Event, EventId};
use neo4rs::{Node, Row};

use super::helpers::{
    decode_error, ids_to_strings, optional_id, parse_optional_typed_id, parse_typed_id,
    parse_typed_id_list, CypherParts, NodeExt,
};
use super::Neo4jGraph;
use crate::infrastructure::ports::{
    ClockPort, EventDraft, EventFilter, EventRepo, EventUpdate, RepoError,
};

pub struct Neo4jEventRepo {
    graph: Neo4jGraph,
    clock: Arc<dyn ClockPort>,
}

impl Neo4jEventRepo {
    pub fn new(graph: Neo4jGraph, clock: Arc<dyn ClockPort>) -> Self {
        Self { graph, clock }
    }

    fn filter_parts(filter: &EventFilter) -> CypherParts {
        let mut parts = CypherParts::new();
        if let Some(id) = filter.id {
            parts.condition("e", "id", "=", "id", id.to_string());
        }
        if let Some(name) = &filter.name {
            parts.condition("e", "name", "=", "name", name.clone());
        }
        if let Some(id) = filter.exclude_id {
            parts.condition("e", "id", "<>", "exclude_id", id.to_string());
        }
        if let Some(flag) = filter.is_deleted {
            parts.condition("e", "is_deleted", "=", "is_deleted", flag);
        }
        parts
    }

    fn row_to_event(row: Row) -> Result<Event, RepoError> {
        let node: Node = row.get("e").map_err(|e| RepoError::database("query", e))?;
        Self::node_to_event(&node)
    }

    fn node_to_event(node: &Node) -> Result<Event, RepoError> {
        let id: EventId = parse_typed_id(node, "id").map_err(|e| decode_error("Event", e))?;
        let custom_fields: Vec<CustomField> = node.get_json_strict("custom_fields")?;
        let max_participants = node.get_i64_or("max_participants", 0);

        Ok(Event {
            id,
            created_at: node.get_datetime_strict("created_at")?,
            updated_at: node.get_datetime_strict("updated_at")?,
            tags: node.get_string_list("tags"),
            is_approved: node.get_bool_or("is_approved", false),
            reviewer: parse_optional_typed_id(node, "reviewer_id")
                .map_err(|e| decode_error("Event", e))?,
            is_finished: node.get_bool_or("is_finished", false),
            tasks: parse_typed_id_list(node, "task_ids").map_err(|e| decode_error("Event", e))?,
            facility_histories: parse_typed_id_list(node, "facility_history_ids")
                .map_err(|e| decode_error("Event", e))?,
            name: node.get_string_strict("name")?,
            language: node.get_string_or("language", ""),
            event_type: parse_typed_id(node, "event_type_id")
                .map_err(|e| decode_error("Event", e))?,
            mode: node.get_string_or("mode", ""),
            location: node.get_string_or("location", ""),
            accommodation: node.get_string_or("accommodation", ""),
            registration_close_date: node.get_datetime_strict("registration_close_date")?,
            start_date: node.get_datetime_strict("start_date")?,
            end_date: node.get_datetime_strict("end_date")?,
            max_participants: u32::try_from(max_participants).unwrap_or(0),
            description: node.get_string_or("description", ""),
            owner: parse_typed_id(node, "owner_id").map_err(|e| decode_error("Event", e))?,
            budget: node.get_f64_or("budget", 0.0),
            image: node.get_string_or("image", ""),
            is_deleted: node.get_bool_or("is_deleted", false),
            custom_fields,
        })
    }

    fn custom_fields_json(fields: &[CustomField]) -> Result<String, RepoError> {
        serde_json::to_string(fields).map_err(RepoError::serialization)
    }

    fn update_parts(parts: &mut CypherParts, update: &EventUpdate) -> Result<(), RepoError> {
        if let Some(v) = &update.tags {
            parts.assign("e", "tags", v.clone());
        }
        if let Some(v) = update.is_approved {
            parts.assign("e", "is_approved", v);
        }
        if let Some(v) = update.reviewer {
            parts.assign("e", "reviewer_id", optional_id(v));
        }
        if let Some(v) = update.is_finished {
            parts.assign("e", "is_finished", v);
        }
        if let Some(v) = &update.tasks {
            parts.assign("e", "task_ids", ids_to_strings(v));
        }
        if let Some(v) = &update.facility_histories {
            parts.assign("e", "facility_history_ids", ids_to_strings(v));
        }
        if let Some(v) = &update.name {
            parts.assign("e", "name", v.clone());
        }
        if let Some(v) = &update.language {
            parts.assign("e", "language", v.clone());
        }
        if let Some(v) = update.event_type {
            parts.assign("e", "event_type_id", v.to_string());
        }
        if let Some(v) = &update.mode {
            parts.assign("e", "mode", v.clone());
        }
        if let Some(v) = &update.location {
            parts.assign("e", "location", v.clone());
        }
        if let Some(v) = &update.accommodation {
            parts.assign("e", "accommodation", v.clone());
        }
        if let Some(v) = update.registration_close_date {
            parts.assign("e", "registration_close_date", v.to_rfc3339());
        }
        if let Some(v) = update.start_date {
            parts.assign("e", "start_date", v.to_rfc3339());
        }
        if let Some(v) = update.end_date {
            parts.assign("e", "end_date", v.to_rfc3339());
        }
        if let Some(v) = update.max_participants {
            parts.assign("e", "max_participants", i64::from(v));
        }
        if let Some(v) = &update.description {
            parts.assign("e", "description", v.clone());
        }
        if let Some(v) = update.owner {
            parts.assign("e", "owner_id", v.to_string());
        }
        if let Some(v) = update.budget {
            parts.assign("e", "budget", v);
        }
        if let Some(v) = &update.image {
            parts.assign("e", "image", v.clone());
        }
        if let Some(v) = update.is_deleted {
            parts.assign("e", "is_deleted", v);
        }
        if let Some(v) = &update.custom_fields {
            parts.assign("e", "custom_fields", Self::custom_fields_json(v)?);
        }
        if let Some(v) = update.updated_at {
            parts.assign("e", "updated_at", v.to_rfc3339());
        }
        Ok(())
    }
}

#[async_trait]
impl EventRepo for Neo4jEventRepo {
    async fn find_all(&self, filter: &EventFilter) -> Result<Vec<Event>, RepoError> {
        let parts = Self::filter_parts(filter);
        let cypher = format!(
            "MATCH (e:Event) {} RETURN e ORDER BY e.created_at, e.id",
            parts.where_clause()
        );
        let rows = self.graph.fetch("find_all", parts.into_query(cypher)).await?;
        rows.into_iter().map(Self::row_to_event).collect()
    }

    async fn find_one(&self, filter: &EventFilter) -> Result<Event, RepoError> {
        let parts = Self::filter_parts(filter);
        let cypher = format!(
            "MATCH (e:Event) {} RETURN e ORDER BY e.created_at, e.id LIMIT 1",
            parts.where_clause()
        );
        match self.graph.fetch_first("find_one", parts.into_query(cypher)).await? {
            Some(row) => Self::row_to_event(row),
            None => Err(RepoError::not_found("Event", filter.describe())),
        }
    }

    async fn create(&self, draft: &EventDraft) -> Result<Event, RepoError> {
        let event = draft.clone().into_event(EventId::new(), self.clock.now());

        let q = neo4rs::query(
            "CREATE (e:Event {
                id: $id,
                created_at: $created_at,
                updated_at: $updated_at,
                tags: $tags,
                is_approved: $is_approved,
                reviewer_id: $reviewer_id,
                is_finished: $is_finished,
                task_ids: $task_ids,
                facility_history_ids: $facility_history_ids,
                name: $name,
                language: $language,
                event_type_id: $event_type_id,
                mode: $mode,
                location: $location,
                accommodation: $accommodation,
                registration_close_date: $registration_close_date,
                start_date: $start_date,
                end_date: $end_date,
                max_participants: $max_participants,
                description: $description,
                owner_id: $owner_id,
                budget: $budget,
                image: $image,
                is_deleted: $is_deleted,
                custom_fields: $custom_fields
            })",
        )
        .param("id", event.id.to_string())
        .param("created_at", event.created_at.to_rfc3339())
        .param("updated_at", event.updated_at.to_rfc3339())
        .param("tags", event.tags.clone())
        .param("is_approved", event.is_approved)
        .param("reviewer_id", optional_id(event.reviewer))
        .param("is_finished", event.is_finished)
        .param("task_ids", ids_to_strings(&event.tasks))
        .param("facility_history_ids", ids_to_strings(&event.facility_histories))
        .param("name", event.name.clone())
        .param("language", event.language.clone())
        .param("event_type_id", event.event_type.to_string())
        .param("mode", event.mode.clone())
        .param("location", event.location.clone())
        .param("accommodation", event.accommodation.clone())
        .param(
            "registration_close_date",
            event.registration_close_date.to_rfc3339(),
        )
        .param("start_date", event.start_date.to_rfc3339())
        .param("end_date", event.end_date.to_rfc3339())
        .param("max_participants", i64::from(event.max_participants))
        .param("description", event.description.clone())
        .param("owner_id", event.owner.to_string())
        .param("budget", event.budget)
        .param("image", event.image.clone())
        .param("is_deleted", event.is_deleted)
        .param("custom_fields", Self::custom_fields_json(&event.custom_fields)?);

        self.graph.run("create", q).await?;
        tracing::debug!(event_id = %event.id, name = %event.name, "Created event node");
        Ok(event)
    }

    async fn update_one(
        &self,
        filter: &EventFilter,
        update: &EventUpdate,
    ) -> Result<Event, RepoError> {
        let mut parts = Self::filter_parts(filter);
        Self::update_parts(&mut parts, update)?;
        let cypher = format!(
            "MATCH (e:Event) {}
             WITH e ORDER BY e.created_at, e.id LIMIT 1
             {}
             RETURN e",
            parts.where_clause(),
            parts.set_clause()
        );
        match self
            .graph
            .fetch_first("update_one", parts.into_query(cypher))
            .await?
        {
            Some(row) => Self::row_to_event(row),
            None => Err(RepoError::not_found("Event", filter.describe())),
        }
    }

    async fn delete_one(&self, filter: &EventFilter) -> Result<Event, RepoError> {
        let event = self.find_one(filter).await?;
        let q = neo4rs::query(
            "MATCH (e:Event {id: $id})
             DETACH DELETE e
             RETURN count(*) AS deleted",
        )
        .param("id", event.id.to_string());

        let deleted = self
            .graph
            .fetch_first("delete_one", q)
            .await?
            .and_then(|row| row.get::<i64>("deleted").ok())
            .unwrap_or(0);
        if deleted == 0 {
            return Err(RepoError::not_found("Event", filter.describe()));
        }
        Ok(event)
    }
}
