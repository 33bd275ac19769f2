//! service-core: Shared infrastructure for the back-office services.
pub mod config;
pub mod error;
pub mod observability;
