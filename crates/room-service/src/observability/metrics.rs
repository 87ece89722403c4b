//! Metrics definitions for the Room service.
//!
//! All metrics follow Prometheus naming conventions:
//! - `rooms_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded to prevent cardinality explosion:
//! - `method`: 7 values max (GET, POST, PATCH, DELETE, PUT, HEAD, OPTIONS)
//! - `endpoint`: parameterized paths only (room addresses are never labels)
//! - `status`: 3 values (success, error, timeout)
//! - `outcome`: allow, unauthorized, forbidden
//! - `operation`: load, save

use metrics::{counter, gauge, histogram};
use std::time::Duration;

// ============================================================================
// HTTP Request Metrics
// ============================================================================

/// Record HTTP request completion
///
/// Metric: `rooms_http_request_duration_seconds`
/// Labels: `method`, `endpoint`, `status` (success, error, timeout)
///
/// Metric: `rooms_http_requests_total`
/// Labels: `method`, `endpoint`, `status_code` (numeric)
pub fn record_http_request(method: &str, endpoint: &str, status_code: u16, duration: Duration) {
    let normalized_endpoint = normalize_endpoint(endpoint);
    let status = categorize_status_code(status_code);

    histogram!("rooms_http_request_duration_seconds",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint.clone(),
        "status" => status.to_string()
    )
    .record(duration.as_secs_f64());

    counter!("rooms_http_requests_total",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint,
        "status_code" => status_code.to_string()
    )
    .increment(1);
}

/// Categorize HTTP status code into success/error/timeout
fn categorize_status_code(status_code: u16) -> &'static str {
    match status_code {
        // 101 Switching Protocols is a successful WebSocket upgrade
        101 | 200..=299 => "success",
        408 | 504 => "timeout",
        _ => "error",
    }
}

/// Normalize endpoint path, replacing room addresses with placeholders.
fn normalize_endpoint(path: &str) -> String {
    match path {
        "/health" | "/ready" | "/metrics" | "/api/v1/rooms" | "/api/contract/create" => {
            path.to_string()
        }
        _ => normalize_dynamic_endpoint(path),
    }
}

fn normalize_dynamic_endpoint(path: &str) -> String {
    let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();

    match segments.as_slice() {
        ["api", "v1", "rooms", address] if !address.is_empty() => {
            "/api/v1/rooms/{address}".to_string()
        }
        ["api", "contract", address] if !address.is_empty() => {
            "/api/contract/{address}".to_string()
        }
        ["ws", address] if !address.is_empty() => "/ws/{address}".to_string(),
        // Unknown paths normalized to "/other" to bound cardinality
        _ => "/other".to_string(),
    }
}

// ============================================================================
// Room Metrics
// ============================================================================

/// Record a room creation
///
/// Metric: `rooms_created_total`
pub fn record_room_created() {
    counter!("rooms_created_total").increment(1);
}

/// Record the outcome of a connect attempt
///
/// Metric: `rooms_connect_attempts_total`
/// Labels: `outcome` (allow, unauthorized, forbidden)
pub fn record_connect_attempt(outcome: &'static str) {
    counter!("rooms_connect_attempts_total", "outcome" => outcome).increment(1);
}

// ============================================================================
// Router Metrics
// ============================================================================

/// Set the number of live sessions
///
/// Metric: `rooms_sessions_active`
pub fn set_sessions_active(count: usize) {
    gauge!("rooms_sessions_active").set(count as f64);
}

/// Record a dispatched inbound message and its fan-out
///
/// Metric: `rooms_messages_dispatched_total`, `rooms_deliveries_dropped_total`
pub fn record_dispatch(dropped: usize) {
    counter!("rooms_messages_dispatched_total").increment(1);
    if dropped > 0 {
        counter!("rooms_deliveries_dropped_total").increment(dropped as u64);
    }
}

// ============================================================================
// Snapshot Metrics
// ============================================================================

/// Record a snapshot load or save
///
/// Metric: `rooms_snapshot_operations_total`
/// Labels: `operation` (load, save), `status` (success, error, dropped)
pub fn record_snapshot_operation(operation: &'static str, status: &'static str) {
    counter!("rooms_snapshot_operations_total",
        "operation" => operation,
        "status" => status
    )
    .increment(1);
}
