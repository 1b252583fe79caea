//! Neo4j deserialization and query-building helpers.
//!
//! Documents are stored as flat nodes: references are bare id strings,
//! timestamps are RFC 3339 strings, and an absent optional reference is the
//! empty string.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use neo4rs::{BoltType, Node, Query};
use uuid::Uuid;

use crate::infrastructure::ports::RepoError;

/// Extension trait for Neo4j Node to simplify common deserialization patterns.
pub trait NodeExt {
    /// Get a required UUID field and parse it.
    fn get_uuid(&self, field: &str) -> Result<Uuid>;

    /// Get a string field with a default value if missing.
    fn get_string_or(&self, field: &str, default: &str) -> String;

    /// Get a list-of-strings field, empty if missing.
    fn get_string_list(&self, field: &str) -> Vec<String>;

    fn get_bool_or(&self, field: &str, default: bool) -> bool;

    fn get_i64_or(&self, field: &str, default: i64) -> i64;

    fn get_f64_or(&self, field: &str, default: f64) -> f64;

    /// Get a required JSON field with strict error handling (fail-fast).
    fn get_json_strict<T: serde::de::DeserializeOwned>(&self, field: &str) -> Result<T, RepoError>;

    /// Get a required string field with strict error handling (fail-fast).
    fn get_string_strict(&self, field: &str) -> Result<String, RepoError>;

    /// Get a required datetime field with strict error handling (fail-fast).
    fn get_datetime_strict(&self, field: &str) -> Result<DateTime<Utc>, RepoError>;
}

impl NodeExt for Node {
    fn get_uuid(&self, field: &str) -> Result<Uuid> {
        let s: String = self
            .get(field)
            .with_context(|| format!("Missing field: {}", field))?;
        Uuid::parse_str(&s).with_context(|| format!("Invalid UUID in field '{}': {}", field, s))
    }

    fn get_string_or(&self, field: &str, default: &str) -> String {
        self.get(field).unwrap_or_else(|_| default.to_string())
    }

    fn get_string_list(&self, field: &str) -> Vec<String> {
        self.get::<Vec<String>>(field).unwrap_or_default()
    }

    fn get_bool_or(&self, field: &str, default: bool) -> bool {
        self.get(field).unwrap_or(default)
    }

    fn get_i64_or(&self, field: &str, default: i64) -> i64 {
        self.get(field).unwrap_or(default)
    }

    fn get_f64_or(&self, field: &str, default: f64) -> f64 {
        self.get(field).unwrap_or(default)
    }

    fn get_json_strict<T: serde::de::DeserializeOwned>(&self, field: &str) -> Result<T, RepoError> {
        let s: String = self.get(field).map_err(|e| {
            RepoError::database(
                "query",
                format!("Missing required field '{}': {}", field, e),
            )
        })?;
        serde_json::from_str(&s).map_err(|e| {
            RepoError::serialization(format!(
                "Invalid JSON in field '{}': {} (value: '{}')",
                field, e, s
            ))
        })
    }

    fn get_string_strict(&self, field: &str) -> Result<String, RepoError> {
        self.get(field).map_err(|e| {
            RepoError::database(
                "query",
                format!("Missing required field '{}': {}", field, e),
            )
        })
    }

    fn get_datetime_strict(&self, field: &str) -> Result<DateTime<Utc>, RepoError> {
        let s = self.get_string_strict(field)?;
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| {
                RepoError::serialization(format!(
                    "Invalid datetime in field '{}': {} (value: '{}')",
                    field, e, s
                ))
            })
    }
}

/// Parse a typed ID from a Neo4j node field.
pub fn parse_typed_id<T>(node: &Node, field: &str) -> Result<T>
where
    T: From<Uuid>,
{
    let uuid = node.get_uuid(field)?;
    Ok(T::from(uuid))
}

/// Parse an optional typed ID; missing or empty means `None`.
pub fn parse_optional_typed_id<T>(node: &Node, field: &str) -> Result<Option<T>>
where
    T: From<Uuid>,
{
    let s: String = match node.get(field) {
        Ok(s) => s,
        Err(_) => return Ok(None),
    };

    if s.is_empty() {
        return Ok(None);
    }

    let uuid = Uuid::parse_str(&s)
        .with_context(|| format!("Invalid UUID in optional field '{}': {}", field, s))?;
    Ok(Some(T::from(uuid)))
}

/// Parse a list of typed IDs stored as a string list.
pub fn parse_typed_id_list<T>(node: &Node, field: &str) -> Result<Vec<T>>
where
    T: From<Uuid>,
{
    node.get_string_list(field)
        .iter()
        .map(|s| {
            Uuid::parse_str(s)
                .map(T::from)
                .with_context(|| format!("Invalid UUID in list field '{}': {}", field, s))
        })
        .collect()
}

/// Decode failure on a stored document.
pub fn decode_error(entity_type: &'static str, e: anyhow::Error) -> RepoError {
    RepoError::serialization(format!("Failed to decode {}: {:#}", entity_type, e))
}

pub fn ids_to_strings<T: ToString>(ids: &[T]) -> Vec<String> {
    ids.iter().map(ToString::to_string).collect()
}

pub fn optional_id<T: ToString>(id: Option<T>) -> String {
    id.map(|id| id.to_string()).unwrap_or_default()
}

// =============================================================================
// Query building
// =============================================================================

/// Accumulates WHERE conditions and SET assignments with their parameters.
///
/// Parameter names are prefixed (`w_`, `s_`) so the same property can appear
/// in both the filter and the update.
#[derive(Default)]
pub struct CypherParts {
    conditions: Vec<String>,
    assignments: Vec<String>,
    params: Vec<(String, BoltType)>,
}

impl CypherParts {
    pub fn new() -> Self {
        Self::default()
    }

    /// `<alias>.<property> <op> $w_<key>`
    pub fn condition(
        &mut self,
        alias: &str,
        property: &str,
        op: &str,
        key: &str,
        value: impl Into<BoltType>,
    ) {
        let param = format!("w_{}", key);
        self.conditions
            .push(format!("{}.{} {} ${}", alias, property, op, param));
        self.params.push((param, value.into()));
    }

    /// `<alias>.<property> = $s_<property>`
    pub fn assign(&mut self, alias: &str, property: &str, value: impl Into<BoltType>) {
        let param = format!("s_{}", property);
        self.assignments
            .push(format!("{}.{} = ${}", alias, property, param));
        self.params.push((param, value.into()));
    }

    pub fn has_assignments(&self) -> bool {
        !self.assignments.is_empty()
    }

    pub fn where_clause(&self) -> String {
        if self.conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", self.conditions.join(" AND "))
        }
    }

    pub fn set_clause(&self) -> String {
        if self.assignments.is_empty() {
            String::new()
        } else {
            format!("SET {}", self.assignments.join(", "))
        }
    }

    /// Build the final query with every collected parameter bound.
    pub fn into_query(self, cypher: String) -> Query {
        self.params
            .into_iter()
            .fold(neo4rs::query(&cypher), |q, (key, value)| q.param(&key, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clauses_are_empty_without_parts() {
        let parts = CypherParts::new();
        assert_eq!(parts.where_clause(), "");
        assert_eq!(parts.set_clause(), "");
        assert!(!parts.has_assignments());
    }

    #[test]
    fn conditions_and_assignments_use_distinct_parameters() {
        let mut parts = CypherParts::new();
        parts.condition("t", "id", "=", "id", "abc".to_string());
        parts.condition("t", "event_id", "=", "event_id", "evt".to_string());
        parts.assign("t", "name", "Renamed".to_string());

        assert_eq!(parts.where_clause(), "WHERE t.id = $w_id AND t.event_id = $w_event_id");
        assert_eq!(parts.set_clause(), "SET t.name = $s_name");
        assert!(parts.has_assignments());
    }
}
