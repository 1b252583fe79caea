//! NetEvent Shared - Wire types for the event API
//!
//! # Design Principles
//!
//! 1. **Minimal dependencies** - Only serde and chrono
//! 2. **No business logic** - Pure data types and serialization
//! 3. **No domain IDs** - identifiers are canonical strings on the wire

pub mod requests;
pub mod responses;

pub use requests::{CustomFieldInput, FacilityHistoryInput, NewEvent, TaskInput, UpdateEvent};
pub use responses::{
    CustomFieldData, ErrorResponse, EventData, EventDetailsData, FacilityHistoryData,
    FieldErrorData, TaskData,
};
