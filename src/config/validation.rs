//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check the shared secret is present
//! - Validate addresses parse and value ranges are usable
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function: GateConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::GateConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The RADIUS shared secret is empty.
    EmptySecret,
    /// A bind address does not parse as `host:port`.
    InvalidAddress { field: &'static str, value: String },
    /// A duration or count field is zero where zero cannot work.
    ZeroValue { field: &'static str },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::EmptySecret => {
                write!(f, "radius.secret must be set (responses cannot be authenticated without it)")
            }
            ValidationError::InvalidAddress { field, value } => {
                write!(f, "{} is not a valid socket address: {:?}", field, value)
            }
            ValidationError::ZeroValue { field } => write!(f, "{} must be greater than zero", field),
        }
    }
}

/// Check a configuration for semantic problems, reporting all of them.
pub fn validate_config(config: &GateConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.radius.secret.is_empty() {
        errors.push(ValidationError::EmptySecret);
    }
    if config.radius.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "radius.bind_address",
            value: config.radius.bind_address.clone(),
        });
    }
    if config.radius.max_in_flight == 0 {
        errors.push(ValidationError::ZeroValue {
            field: "radius.max_in_flight",
        });
    }
    if config.database.max_connections == 0 {
        errors.push(ValidationError::ZeroValue {
            field: "database.max_connections",
        });
    }
    if config.database.acquire_timeout_ms == 0 {
        errors.push(ValidationError::ZeroValue {
            field: "database.acquire_timeout_ms",
        });
    }
    if config.database.lookup_timeout_ms == 0 {
        errors.push(ValidationError::ZeroValue {
            field: "database.lookup_timeout_ms",
        });
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
