//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Connect store → Bind responder → Serve
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drain in-flight → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then store, then the listener
//! - Ordered shutdown: stop accepting, drain, release the socket
//! - Draining has a deadline; a wedged handler cannot hold the process

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
