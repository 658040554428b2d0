//! OS signal handling.
//!
//! # Responsibilities
//! - Register signal handlers (SIGTERM, SIGINT)
//! - Translate the first signal into the internal shutdown trigger
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - Signal registration failure is fatal at startup, not silently ignored

use std::sync::Arc;

use super::shutdown::Shutdown;

/// Wait for SIGINT or SIGTERM, then trigger shutdown.
///
/// Intended to be spawned once from the bootstrap path.
pub async fn trigger_on_signal(shutdown: Arc<Shutdown>) {
    let signal_name = wait_for_signal().await;
    tracing::info!(signal = signal_name, "termination signal received");
    shutdown.trigger();
}

#[cfg(unix)]
async fn wait_for_signal() -> &'static str {
    use tokio::signal::unix::{signal, SignalKind};

    let mut term = signal(SignalKind::terminate()).expect("failed to register SIGTERM handler");

    tokio::select! {
        _ = tokio::signal::ctrl_c() => "SIGINT",
        _ = term.recv() => "SIGTERM",
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> &'static str {
    let _ = tokio::signal::ctrl_c().await;
    "ctrl-c"
}
