use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

macro_rules! define_id {
    ($name:ident, $label:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            pub fn to_uuid(self) -> Uuid {
                self.0
            }

            /// Parse the canonical string form (hyphenated UUID).
            ///
            /// Malformed input is reported as [`DomainError::InvalidId`], never a panic.
            pub fn parse(value: &str) -> Result<Self, DomainError> {
                Uuid::parse_str(value).map(Self).map_err(|e| {
                    DomainError::invalid_id(format!(
                        "{} '{}' is not a valid identifier: {}",
                        $label, value, e
                    ))
                })
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl From<Uuid> for $name {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl From<$name> for Uuid {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

// Composite-operation entities
define_id!(EventId, "event id");
define_id!(TaskId, "task id");
define_id!(FacilityHistoryId, "facility history id");

// Referenced entities (resolved for existence only)
define_id!(UserId, "user id");
define_id!(FacilityId, "facility id");
define_id!(EventTypeId, "event type id");

// Saga journal
define_id!(SagaId, "saga id");
