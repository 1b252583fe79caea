//! Core domain types for event scheduling: identifiers, the Event / Task /
//! FacilityHistory documents, and the saga record used to journal composite
//! writes across them.

pub mod entities;
pub mod error;
pub mod ids;
pub mod saga;

pub use entities::{CustomField, Event, FacilityHistory, Task};
pub use error::DomainError;
pub use ids::{EventId, EventTypeId, FacilityHistoryId, FacilityId, SagaId, TaskId, UserId};
pub use saga::{SagaKind, SagaRecord, SagaState};
