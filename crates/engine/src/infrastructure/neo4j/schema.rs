//! Neo4j schema initialization - constraints and indexes.

use neo4rs::query;

use crate::infrastructure::neo4j::Neo4jGraph;
use crate::infrastructure::ports::RepoError;

/// Initialize Neo4j schema with required constraints and indexes.
///
/// This should be called once on startup. Constraints are created with
/// IF NOT EXISTS to be idempotent.
pub async fn ensure_schema(graph: &Neo4jGraph) -> Result<(), RepoError> {
    // Store-assigned identifiers are unique per collection.
    for (name, label) in [
        ("event_id_unique", "Event"),
        ("task_id_unique", "Task"),
        ("facility_history_id_unique", "FacilityHistory"),
    ] {
        graph
            .run(
                "schema",
                query(&format!(
                    "CREATE CONSTRAINT {name} IF NOT EXISTS FOR (n:{label}) REQUIRE n.id IS UNIQUE"
                )),
            )
            .await?;
    }

    // Back-link lookups (find_all by event) during update and details reads.
    graph
        .run(
            "schema",
            query("CREATE INDEX task_event_id IF NOT EXISTS FOR (t:Task) ON (t.event_id)"),
        )
        .await?;
    graph
        .run(
            "schema",
            query(
                "CREATE INDEX facility_history_event_id IF NOT EXISTS
                 FOR (h:FacilityHistory) ON (h.event_id)",
            ),
        )
        .await?;

    // Name-uniqueness checks during validation.
    graph
        .run(
            "schema",
            query("CREATE INDEX event_name IF NOT EXISTS FOR (e:Event) ON (e.name)"),
        )
        .await?;

    tracing::info!("Neo4j schema initialized (constraints and indexes ensured)");
    Ok(())
}
