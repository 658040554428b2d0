//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured tracing events)
//!     → metrics.rs (request/decision counters)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - One audit line per decision; wire responses stay detail-free
//! - Counters are cheap atomic increments on the request path
//! - The metrics endpoint is off by default and separate from the RADIUS
//!   socket

pub mod logging;
pub mod metrics;
