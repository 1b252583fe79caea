//! Common validation helpers for use cases.
//!
//! Field names are paths into the request payload (`name`,
//! `tasks[1].userId`), so a client can attach each message to its input.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

/// Validation error type.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} cannot be empty")]
    Empty { field: String },

    #[error("{field} is invalid: {reason}")]
    Invalid { field: String, reason: String },

    #[error("{field} '{value}' is already in use")]
    Duplicate { field: String, value: String },

    #[error("{field} refers to a {entity} that does not exist: {id}")]
    UnknownReference {
        field: String,
        entity: &'static str,
        id: String,
    },
}

impl ValidationError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn field(&self) -> &str {
        match self {
            Self::Empty { field }
            | Self::Invalid { field, .. }
            | Self::Duplicate { field, .. }
            | Self::UnknownReference { field, .. } => field,
        }
    }
}

/// Every problem found in one payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: ValidationError) {
        self.0.push(error);
    }

    /// Keep the value of a passed check; record a failed one.
    pub fn check<T>(&mut self, result: Result<T, ValidationError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                self.0.push(e);
                None
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.0.iter()
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field() == field)
    }

    pub fn into_result(self) -> Result<(), Self> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl From<ValidationError> for ValidationErrors {
    fn from(error: ValidationError) -> Self {
        Self(vec![error])
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        f.write_str(&messages.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Validate a string is non-empty after trimming.
pub fn require_non_empty(value: &str, field: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Empty {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Parse a canonical identifier string. Empty input reports as `Empty`.
pub fn parse_id<T: FromStr>(value: &str, field: &str) -> Result<T, ValidationError>
where
    T::Err: fmt::Display,
{
    require_non_empty(value, field)?;
    value
        .trim()
        .parse::<T>()
        .map_err(|e| ValidationError::invalid(field, e.to_string()))
}

/// Validate `start` does not come after `end`.
pub fn require_ordered(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    field: &str,
    reason: &str,
) -> Result<(), ValidationError> {
    if start > end {
        return Err(ValidationError::invalid(field, reason));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use netevent_domain::UserId;

    #[test]
    fn whitespace_only_is_empty() {
        assert_eq!(
            require_non_empty("  ", "name"),
            Err(ValidationError::Empty {
                field: "name".to_string()
            })
        );
    }

    #[test]
    fn parse_id_never_panics_on_garbage() {
        for raw in ["", "x", "123", "zzzzzzzz-zzzz-zzzz-zzzz-zzzzzzzzzzzz"] {
            let parsed = parse_id::<UserId>(raw, "ownerId");
            assert!(parsed.is_err(), "{raw:?} should be rejected");
            assert_eq!(parsed.unwrap_err().field(), "ownerId");
        }
    }

    #[test]
    fn parse_id_round_trips_canonical_form() {
        let id = UserId::new();
        let parsed: UserId = parse_id(&id.to_string(), "ownerId").unwrap();
        assert_eq!(parsed.to_string(), id.to_string());
    }

    #[test]
    fn checks_collect_every_failure() {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let t1 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        let mut errors = ValidationErrors::new();
        errors.check(require_non_empty("", "name"));
        errors.check(require_ordered(t0, t1, "endDate", "must not precede startDate"));
        assert_eq!(errors.check(Ok::<_, ValidationError>(7)), Some(7));

        assert_eq!(errors.len(), 2);
        assert!(errors.has_field("endDate"));
        assert!(errors.clone().into_result().is_err());
        assert_eq!(
            errors.to_string(),
            "name cannot be empty; endDate is invalid: must not precede startDate"
        );
    }
}
