//! Port traits for infrastructure boundaries.
//!
//! These are the ONLY abstractions in the engine. Everything else is concrete types.
//! Ports exist for:
//! - Record stores (Neo4j document adapter or the in-memory store)
//! - Existence checks on referenced users, facilities and event types
//! - The saga journal (SQLite or in-memory)
//! - Clock (for testing)

mod error;
mod repos;
mod testing;
pub mod types;

// =============================================================================
// Repository Ports
// =============================================================================
pub use repos::{EventRepo, FacilityHistoryRepo, ReferenceRepo, SagaLogPort, TaskRepo};

pub use types::{
    EventDraft, EventFilter, EventUpdate, FacilityHistoryDraft, FacilityHistoryFilter,
    FacilityHistoryUpdate, IdRef, TaskDraft, TaskFilter, TaskUpdate,
};

// =============================================================================
// Test-Only Mock Repositories (only available during test builds)
// =============================================================================
#[cfg(test)]
pub use repos::{
    MockEventRepo, MockFacilityHistoryRepo, MockReferenceRepo, MockSagaLogPort, MockTaskRepo,
};

#[cfg(test)]
pub use testing::MockClockPort;

// =============================================================================
// Testing Ports
// =============================================================================
pub use testing::ClockPort;

// =============================================================================
// Error Types
// =============================================================================
pub use error::RepoError;
