//! Repository modules - Data access wrappers around port traits.
//!
//! Each repository wraps a port trait, normalizes identifiers and gives the
//! use cases the lookups they need.

pub mod event;
pub mod facility_history;
pub mod references;
pub mod task;

pub use event::EventRepository;
pub use facility_history::FacilityHistoryRepository;
pub use references::ReferenceLookup;
pub use task::TaskRepository;
