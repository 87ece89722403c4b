//! Observability module for the Room service.
//!
//! Provides metrics definitions used by handlers, actors and tasks.

pub mod metrics;
