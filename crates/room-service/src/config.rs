//! Room service configuration.
//!
//! Configuration is loaded from environment variables. `main` loads a `.env`
//! file first when one is present.

use std::collections::HashMap;
use std::env;
use thiserror::Error;

/// Default listen port when neither `BIND_ADDRESS` nor `PORT` is set.
pub const DEFAULT_PORT: &str = "3000";

/// Default snapshot file for the room registry.
pub const DEFAULT_ROOMS_SNAPSHOT_PATH: &str = "rooms.json";

/// Default maximum size of a single WebSocket message (1 MiB).
pub const DEFAULT_MAX_MESSAGE_BYTES: usize = 1024 * 1024;

/// Default per-session outbound queue depth.
pub const DEFAULT_SESSION_OUTBOUND_BUFFER: usize = 64;

/// Default graceful shutdown drain period in seconds.
pub const DEFAULT_DRAIN_SECONDS: u64 = 0;

/// Room service configuration.
///
/// Loaded from environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address (default: "0.0.0.0:3000").
    pub bind_address: String,

    /// Path of the JSON snapshot the registry is loaded from and saved to.
    pub rooms_snapshot_path: String,

    /// Maximum accepted WebSocket message size in bytes.
    pub max_message_bytes: usize,

    /// Outbound queue depth per session. Deliveries to a full queue are dropped.
    pub session_outbound_buffer: usize,

    /// Seconds to keep serving after a shutdown signal before stopping.
    pub drain_seconds: u64,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid snapshot path configuration: {0}")]
    InvalidSnapshotPath(String),

    #[error("Invalid message size configuration: {0}")]
    InvalidMaxMessageBytes(String),

    #[error("Invalid session buffer configuration: {0}")]
    InvalidSessionBuffer(String),

    #[error("Invalid drain period configuration: {0}")]
    InvalidDrainSeconds(String),
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let bind_address = vars.get("BIND_ADDRESS").cloned().unwrap_or_else(|| {
            let port = vars.get("PORT").map_or(DEFAULT_PORT, String::as_str);
            format!("0.0.0.0:{}", port)
        });

        let rooms_snapshot_path = vars
            .get("ROOMS_SNAPSHOT_PATH")
            .cloned()
            .unwrap_or_else(|| DEFAULT_ROOMS_SNAPSHOT_PATH.to_string());

        if rooms_snapshot_path.trim().is_empty() {
            return Err(ConfigError::InvalidSnapshotPath(
                "ROOMS_SNAPSHOT_PATH must not be empty".to_string(),
            ));
        }

        let max_message_bytes = parse_positive(
            vars,
            "MAX_MESSAGE_BYTES",
            DEFAULT_MAX_MESSAGE_BYTES,
            ConfigError::InvalidMaxMessageBytes,
        )?;

        let session_outbound_buffer = parse_positive(
            vars,
            "SESSION_OUTBOUND_BUFFER",
            DEFAULT_SESSION_OUTBOUND_BUFFER,
            ConfigError::InvalidSessionBuffer,
        )?;

        let drain_seconds = if let Some(value_str) = vars.get("DRAIN_SECONDS") {
            value_str.parse::<u64>().map_err(|e| {
                ConfigError::InvalidDrainSeconds(format!(
                    "DRAIN_SECONDS must be a valid non-negative integer, got '{}': {}",
                    value_str, e
                ))
            })?
        } else {
            DEFAULT_DRAIN_SECONDS
        };

        Ok(Config {
            bind_address,
            rooms_snapshot_path,
            max_message_bytes,
            session_outbound_buffer,
            drain_seconds,
        })
    }
}

/// Parse an optional variable that must be an integer greater than zero.
fn parse_positive(
    vars: &HashMap<String, String>,
    name: &str,
    default: usize,
    make_err: fn(String) -> ConfigError,
) -> Result<usize, ConfigError> {
    let Some(value_str) = vars.get(name) else {
        return Ok(default);
    };

    let value: usize = value_str.parse().map_err(|e| {
        make_err(format!(
            "{} must be a valid positive integer, got '{}': {}",
            name, value_str, e
        ))
    })?;

    if value == 0 {
        return Err(make_err(format!("{} must be greater than 0", name)));
    }

    Ok(value)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_vars_success_with_defaults() {
        let vars = HashMap::new();

        let config = Config::from_vars(&vars).expect("Config should load successfully");

        assert_eq!(config.bind_address, "0.0.0.0:3000");
        assert_eq!(config.rooms_snapshot_path, DEFAULT_ROOMS_SNAPSHOT_PATH);
        assert_eq!(config.max_message_bytes, DEFAULT_MAX_MESSAGE_BYTES);
        assert_eq!(
            config.session_outbound_buffer,
            DEFAULT_SESSION_OUTBOUND_BUFFER
        );
        assert_eq!(config.drain_seconds, DEFAULT_DRAIN_SECONDS);
    }

    #[test]
    fn test_from_vars_success_with_custom_values() {
        let vars = HashMap::from([
            ("BIND_ADDRESS".to_string(), "127.0.0.1:9000".to_string()),
            (
                "ROOMS_SNAPSHOT_PATH".to_string(),
                "/var/lib/rooms/rooms.json".to_string(),
            ),
            ("MAX_MESSAGE_BYTES".to_string(), "4096".to_string()),
            ("SESSION_OUTBOUND_BUFFER".to_string(), "8".to_string()),
            ("DRAIN_SECONDS".to_string(), "15".to_string()),
        ]);

        let config = Config::from_vars(&vars).expect("Config should load successfully");

        assert_eq!(config.bind_address, "127.0.0.1:9000");
        assert_eq!(config.rooms_snapshot_path, "/var/lib/rooms/rooms.json");
        assert_eq!(config.max_message_bytes, 4096);
        assert_eq!(config.session_outbound_buffer, 8);
        assert_eq!(config.drain_seconds, 15);
    }

    #[test]
    fn test_port_used_when_bind_address_missing() {
        let vars = HashMap::from([("PORT".to_string(), "8088".to_string())]);

        let config = Config::from_vars(&vars).expect("Config should load successfully");
        assert_eq!(config.bind_address, "0.0.0.0:8088");
    }

    #[test]
    fn test_bind_address_wins_over_port() {
        let vars = HashMap::from([
            ("PORT".to_string(), "8088".to_string()),
            ("BIND_ADDRESS".to_string(), "127.0.0.1:7000".to_string()),
        ]);

        let config = Config::from_vars(&vars).expect("Config should load successfully");
        assert_eq!(config.bind_address, "127.0.0.1:7000");
    }

    #[test]
    fn test_snapshot_path_rejects_empty() {
        let vars = HashMap::from([("ROOMS_SNAPSHOT_PATH".to_string(), "  ".to_string())]);

        let result = Config::from_vars(&vars);
        assert!(
            matches!(result, Err(ConfigError::InvalidSnapshotPath(msg)) if msg.contains("must not be empty"))
        );
    }

    #[test]
    fn test_max_message_bytes_rejects_zero() {
        let vars = HashMap::from([("MAX_MESSAGE_BYTES".to_string(), "0".to_string())]);

        let result = Config::from_vars(&vars);
        assert!(
            matches!(result, Err(ConfigError::InvalidMaxMessageBytes(msg)) if msg.contains("must be greater than 0"))
        );
    }

    #[test]
    fn test_max_message_bytes_rejects_non_numeric() {
        let vars = HashMap::from([("MAX_MESSAGE_BYTES".to_string(), "1MB".to_string())]);

        let result = Config::from_vars(&vars);
        assert!(
            matches!(result, Err(ConfigError::InvalidMaxMessageBytes(msg)) if msg.contains("must be a valid positive integer"))
        );
    }

    #[test]
    fn test_session_buffer_rejects_negative() {
        let vars = HashMap::from([("SESSION_OUTBOUND_BUFFER".to_string(), "-4".to_string())]);

        let result = Config::from_vars(&vars);
        assert!(
            matches!(result, Err(ConfigError::InvalidSessionBuffer(msg)) if msg.contains("must be a valid positive integer"))
        );
    }

    #[test]
    fn test_drain_seconds_accepts_zero() {
        let vars = HashMap::from([("DRAIN_SECONDS".to_string(), "0".to_string())]);

        let config = Config::from_vars(&vars).expect("Config should load successfully");
        assert_eq!(config.drain_seconds, 0);
    }

    #[test]
    fn test_drain_seconds_rejects_non_numeric() {
        let vars = HashMap::from([("DRAIN_SECONDS".to_string(), "soon".to_string())]);

        let result = Config::from_vars(&vars);
        assert!(
            matches!(result, Err(ConfigError::InvalidDrainSeconds(msg)) if msg.contains("non-negative integer"))
        );
    }
}
