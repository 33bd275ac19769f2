//! Services module for commercial-service.

pub mod database;
pub mod metrics;
pub mod pricing;

pub use database::Database;
pub use metrics::{get_metrics, init_metrics};
pub use pricing::{price, Pricing, PricingInputs};
