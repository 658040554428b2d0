//! macgate: MAC-address allow-list RADIUS responder.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌────────────────────────────────────────────────┐
//!                    │                    MACGATE                     │
//!                    │                                                │
//!   Access-Request   │  ┌────────┐   ┌──────────┐   ┌─────────────┐  │
//!   ─────────────────┼─▶│ radius │──▶│ decision │──▶│    store    │  │
//!    (UDP)           │  │ server │   │  engine  │   │  (SQLite)   │  │
//!                    │  └───┬────┘   └──────────┘   └──────▲──────┘  │
//!                    │      │                              │         │
//!   Accept / Reject  │      ▼                              │ writes  │
//!   ◀────────────────┼── signed reply           macgate-admin CLI    │
//!                    │                                                │
//!                    │  cross-cutting: config · lifecycle · mac ·     │
//!                    │                 observability                  │
//!                    └────────────────────────────────────────────────┘
//! ```
//!
//! A request is authorized when its User-Name normalizes to a registered
//! device address and at least one of the device's groups authorizes the
//! SSID carried in Called-Station-Id. Everything else (malformed
//! identities, unknown devices, wrong port types, storage faults) rejects.

// Core subsystems
pub mod config;
pub mod decision;
pub mod mac;
pub mod radius;
pub mod store;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::GateConfig;
pub use decision::{Decision, DecisionEngine, RejectReason};
pub use lifecycle::Shutdown;
pub use radius::RadiusServer;
pub use store::DeviceStore;
