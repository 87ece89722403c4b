//! HTTP request handlers for the Room service.

pub mod connect;
pub mod contract;
pub mod health;
pub mod metrics;
pub mod rooms;

pub use connect::connect;
pub use contract::{create_contract, get_contract};
pub use health::{health_check, readiness_check};
pub use metrics::metrics_handler;
pub use rooms::{create_room, get_room};
