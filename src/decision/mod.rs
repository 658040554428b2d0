//! Access-decision subsystem.
//!
//! # Data Flow
//! ```text
//! (identity, requested SSID, wireless?) from the responder
//!     → engine.rs (port gate → normalize/validate → store lookup → union check)
//!     → Decision::Accept | Decision::Reject(reason)
//!     → audit log line + decision counter
//! ```
//!
//! # Design Decisions
//! - Terminal in one step: no retries, no multi-round exchange
//! - Fail closed: unknown devices, empty unions, and storage faults all
//!   reject; there is no default-allow group for unregistered devices
//! - Malformed identities are rejected before any store traffic
//! - Store lookups are bounded by a timeout so a stalled store degrades to
//!   a reject instead of hanging the responder

pub mod engine;

pub use engine::Decision;
pub use engine::DecisionEngine;
pub use engine::RejectReason;
