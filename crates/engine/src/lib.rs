//! NetEvent Engine library.
//!
//! Keeps an Event and the Tasks / FacilityHistories it references consistent
//! across three independently stored collections.
//!
//! ## Structure
//!
//! - `repositories/` - Typed wrappers over the store ports
//! - `use_cases/` - Composite writes, validation and the read side
//! - `infrastructure/` - Ports plus the Neo4j, in-memory and SQLite adapters
//! - `api/` - HTTP entry points
//! - `app` - Application composition

pub mod api;
pub mod app;
pub mod infrastructure;
pub mod repositories;
pub mod use_cases;

pub use app::App;
