//! service-core: Shared infrastructure for the boarding house services.
pub mod error;
pub mod middleware;
pub mod observability;
