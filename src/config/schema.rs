//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gate.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the authorization gate.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GateConfig {
    /// RADIUS responder configuration (bind address, shared secret).
    pub radius: RadiusConfig,

    /// Permission store configuration.
    pub database: DatabaseConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// RADIUS responder configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RadiusConfig {
    /// UDP bind address (e.g., "0.0.0.0:1812").
    pub bind_address: String,

    /// Shared secret used to authenticate responses.
    ///
    /// There is no default; an empty secret fails validation.
    pub secret: String,

    /// Maximum concurrently handled requests (backpressure).
    pub max_in_flight: usize,
}

impl Default for RadiusConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:1812".to_string(),
            secret: String::new(),
            max_in_flight: 256,
        }
    }
}

/// Permission store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite connection URL (e.g., "sqlite://macgate.db").
    pub url: String,

    /// Maximum pooled connections.
    pub max_connections: u32,

    /// How long a lookup may wait for a pooled connection, in milliseconds.
    pub acquire_timeout_ms: u64,

    /// SQLite busy handler timeout in milliseconds (bounds waiting on a
    /// writer's lock).
    pub busy_timeout_ms: u64,

    /// Upper bound on one full decision lookup, in milliseconds. A store
    /// that stalls past this degrades to a reject instead of hanging the
    /// responder.
    pub lookup_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://macgate.db".to_string(),
            max_connections: 5,
            acquire_timeout_ms: 500,
            busy_timeout_ms: 250,
            lookup_timeout_ms: 800,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_parses_with_defaults() {
        let config: GateConfig = toml::from_str(
            r#"
            [radius]
            secret = "s3cret"
            "#,
        )
        .unwrap();

        assert_eq!(config.radius.secret, "s3cret");
        assert_eq!(config.radius.bind_address, "0.0.0.0:1812");
        assert_eq!(config.database.url, "sqlite://macgate.db");
        assert_eq!(config.observability.log_level, "info");
        assert!(!config.observability.metrics_enabled);
    }

    #[test]
    fn secret_has_no_default() {
        let config = GateConfig::default();
        assert!(config.radius.secret.is_empty());
    }
}
