//! Decision engine: one authentication request in, accept or reject out.

use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use tokio::time::timeout;

use crate::mac;
use crate::store::DeviceStore;

/// The outcome of one authentication request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accept,
    Reject(RejectReason),
}

impl Decision {
    pub fn is_accept(&self) -> bool {
        matches!(self, Decision::Accept)
    }

    /// Stable label for metrics and logs.
    pub fn label(&self) -> &'static str {
        match self {
            Decision::Accept => "accept",
            Decision::Reject(reason) => reason.label(),
        }
    }
}

/// Why a request was rejected. Never sent over the wire; the protocol
/// carries only the bare reject code, and this detail goes to the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The NAS port is not a wireless port.
    NotWireless,
    /// The identity does not normalize to a MAC address.
    MalformedAddress,
    /// No device record for this address.
    UnknownDevice,
    /// The device exists but none of its groups authorize the SSID.
    NetworkNotAuthorized,
    /// The store lookup failed or timed out; fail closed.
    StoreUnavailable,
}

impl RejectReason {
    pub fn label(&self) -> &'static str {
        match self {
            RejectReason::NotWireless => "not_wireless",
            RejectReason::MalformedAddress => "malformed_address",
            RejectReason::UnknownDevice => "unknown_device",
            RejectReason::NetworkNotAuthorized => "network_not_authorized",
            RejectReason::StoreUnavailable => "store_unavailable",
        }
    }
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Renders accept/reject decisions from validated requests and store state.
pub struct DecisionEngine {
    store: Arc<dyn DeviceStore>,
    lookup_timeout: Duration,
}

impl DecisionEngine {
    pub fn new(store: Arc<dyn DeviceStore>, lookup_timeout: Duration) -> Self {
        Self {
            store,
            lookup_timeout,
        }
    }

    /// Decide one request. Always returns; every path is terminal.
    ///
    /// Gate order: port type, then identity format, then registration, then
    /// the union of the device's group-authorized networks. A malformed
    /// identity never reaches the store.
    pub async fn decide(&self, identity: &str, requested_ssid: &str, wireless: bool) -> Decision {
        let decision = self.evaluate(identity, requested_ssid, wireless).await;
        self.audit(identity, requested_ssid, decision);
        decision
    }

    async fn evaluate(&self, identity: &str, requested_ssid: &str, wireless: bool) -> Decision {
        if !wireless {
            return Decision::Reject(RejectReason::NotWireless);
        }

        let mac = mac::normalize(identity);
        if !mac::is_valid_format(&mac) {
            return Decision::Reject(RejectReason::MalformedAddress);
        }

        let record = match timeout(self.lookup_timeout, self.store.find_device(&mac)).await {
            Err(_) => {
                tracing::error!(
                    mac = %mac,
                    timeout_ms = self.lookup_timeout.as_millis() as u64,
                    "store lookup timed out"
                );
                return Decision::Reject(RejectReason::StoreUnavailable);
            }
            Ok(Err(e)) => {
                tracing::error!(mac = %mac, error = %e, "store lookup failed");
                return Decision::Reject(RejectReason::StoreUnavailable);
            }
            Ok(Ok(None)) => return Decision::Reject(RejectReason::UnknownDevice),
            Ok(Ok(Some(record))) => record,
        };

        // Union across all of the device's groups; a device with no groups,
        // or groups with no networks, falls through to reject here.
        if record.authorizes(requested_ssid) {
            Decision::Accept
        } else {
            Decision::Reject(RejectReason::NetworkNotAuthorized)
        }
    }

    /// One audit line and one counter per decision, at the level the
    /// outcome warrants.
    fn audit(&self, identity: &str, requested_ssid: &str, decision: Decision) {
        counter!("macgate_decisions_total", "outcome" => decision.label()).increment(1);

        match decision {
            Decision::Accept => {
                tracing::info!(identity, ssid = requested_ssid, "access accepted");
            }
            Decision::Reject(reason @ (RejectReason::NotWireless | RejectReason::MalformedAddress)) => {
                tracing::warn!(identity, ssid = requested_ssid, reason = %reason, "access rejected");
            }
            Decision::Reject(reason @ RejectReason::StoreUnavailable) => {
                tracing::error!(identity, ssid = requested_ssid, reason = %reason, "access rejected");
            }
            Decision::Reject(reason) => {
                tracing::info!(identity, ssid = requested_ssid, reason = %reason, "access rejected");
            }
        }
    }
}
