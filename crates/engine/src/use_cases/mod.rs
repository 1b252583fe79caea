//! Use cases - User story orchestration.
//!
//! Use cases orchestrate the repository wrappers to fulfill user stories.

pub mod events;
pub mod validation;

pub use events::{EventError, EventStores, EventUseCases};
