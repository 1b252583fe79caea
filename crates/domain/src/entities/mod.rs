//! Domain entities

mod event;
mod facility_history;
mod task;

pub use event::{CustomField, Event};
pub use facility_history::FacilityHistory;
pub use task::Task;
