//! API layer - HTTP entry points.

mod convert;
pub mod http;

pub use http::{routes, ApiError};
