//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GateConfig (validated, immutable)
//!     → shared via Arc to all subsystems
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields except the shared secret have defaults, so a minimal config
//!   is just `[radius] secret = "..."`
//! - The shared secret is deliberately config-only: there is no compiled-in
//!   fallback, and validation rejects an empty value
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::load_config;
pub use schema::DatabaseConfig;
pub use schema::GateConfig;
pub use schema::ObservabilityConfig;
pub use schema::RadiusConfig;
