//! UDP responder with bounded concurrency.
//!
//! # Responsibilities
//! - Bind the configured UDP address
//! - Spawn one task per inbound request, capped by `max_in_flight`
//! - Drive the decision engine and send the authenticated reply
//! - Drain in-flight requests on shutdown before releasing the socket

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use tokio::net::UdpSocket;
use tokio::sync::{broadcast, Semaphore};

use crate::config::RadiusConfig;
use crate::decision::{Decision, DecisionEngine};
use crate::radius::packet::{self, Code, Packet};

/// How long shutdown waits for in-flight requests before giving up.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Error type for responder operations.
#[derive(Debug)]
pub enum ServerError {
    /// Failed to bind or inspect the socket.
    Bind(std::io::Error),
}

impl std::fmt::Display for ServerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServerError::Bind(e) => write!(f, "Failed to bind: {}", e),
        }
    }
}

impl std::error::Error for ServerError {}

/// The RADIUS access responder.
///
/// Requests are independent: each datagram is handled on its own task with
/// no shared per-request state. The semaphore is the only throttle; a
/// saturated responder drops datagrams (the NAS retransmits) rather than
/// queueing without bound.
pub struct RadiusServer {
    socket: Arc<UdpSocket>,
    engine: Arc<DecisionEngine>,
    secret: Arc<Vec<u8>>,
    in_flight: Arc<Semaphore>,
    max_in_flight: usize,
}

impl RadiusServer {
    /// Bind the configured address.
    pub async fn bind(
        config: &RadiusConfig,
        engine: Arc<DecisionEngine>,
    ) -> Result<Self, ServerError> {
        let socket = UdpSocket::bind(&config.bind_address)
            .await
            .map_err(ServerError::Bind)?;

        tracing::info!(
            address = %socket.local_addr().map_err(ServerError::Bind)?,
            max_in_flight = config.max_in_flight,
            "RADIUS responder bound"
        );

        Ok(Self {
            socket: Arc::new(socket),
            engine,
            secret: Arc::new(config.secret.clone().into_bytes()),
            in_flight: Arc::new(Semaphore::new(config.max_in_flight)),
            max_in_flight: config.max_in_flight,
        })
    }

    /// The bound local address (useful when binding port 0).
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Serve until the shutdown signal fires, then drain and return.
    ///
    /// Receive errors are logged and never fatal; the loop only exits via
    /// shutdown.
    pub async fn run(&self, mut shutdown: broadcast::Receiver<()>) -> Result<(), ServerError> {
        let mut buf = vec![0u8; packet::MAX_PACKET_LEN];

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    tracing::info!("shutdown requested, no longer accepting requests");
                    break;
                }
                received = self.socket.recv_from(&mut buf) => {
                    let (len, peer) = match received {
                        Ok(pair) => pair,
                        Err(e) => {
                            tracing::warn!(error = %e, "receive failed");
                            continue;
                        }
                    };
                    counter!("macgate_requests_total").increment(1);

                    let permit = match self.in_flight.clone().try_acquire_owned() {
                        Ok(permit) => permit,
                        Err(_) => {
                            counter!("macgate_requests_dropped_total").increment(1);
                            tracing::warn!(peer = %peer, "in-flight limit reached, dropping request");
                            continue;
                        }
                    };

                    let datagram = buf[..len].to_vec();
                    let socket = self.socket.clone();
                    let engine = self.engine.clone();
                    let secret = self.secret.clone();
                    tokio::spawn(async move {
                        handle_datagram(socket, engine, &secret, datagram, peer).await;
                        drop(permit);
                    });
                }
            }
        }

        self.drain().await;
        Ok(())
    }

    /// Wait for every outstanding handler by re-acquiring all permits.
    async fn drain(&self) {
        let all = self.max_in_flight as u32;
        match tokio::time::timeout(SHUTDOWN_GRACE, self.in_flight.acquire_many(all)).await {
            Ok(_) => tracing::info!("in-flight requests drained"),
            Err(_) => tracing::warn!(
                grace_secs = SHUTDOWN_GRACE.as_secs(),
                "grace period elapsed with requests still in flight"
            ),
        }
    }
}

async fn handle_datagram(
    socket: Arc<UdpSocket>,
    engine: Arc<DecisionEngine>,
    secret: &[u8],
    datagram: Vec<u8>,
    peer: SocketAddr,
) {
    let request = match Packet::parse(&datagram) {
        Ok(request) => request,
        Err(e) => {
            counter!("macgate_requests_malformed_total").increment(1);
            tracing::warn!(peer = %peer, error = %e, "discarding unparseable datagram");
            return;
        }
    };

    if request.code != Code::AccessRequest {
        tracing::debug!(peer = %peer, code = ?request.code, "ignoring non-request packet");
        return;
    }

    // User-Password is deliberately not consulted.
    let code = match required_attributes(&request) {
        Some((identity, port_type, called_station)) => {
            let ssid = requested_ssid(called_station);
            let wireless = packet::is_wireless_port(port_type);
            match engine.decide(identity, ssid, wireless).await {
                Decision::Accept => Code::AccessAccept,
                Decision::Reject(_) => Code::AccessReject,
            }
        }
        None => {
            counter!("macgate_requests_malformed_total").increment(1);
            tracing::warn!(peer = %peer, "request missing required attributes");
            Code::AccessReject
        }
    };

    let response = request.reply(code, secret);
    if let Err(e) = socket.send_to(&response, peer).await {
        tracing::warn!(peer = %peer, error = %e, "failed to send response");
    }
}

fn required_attributes(request: &Packet) -> Option<(&str, u32, &str)> {
    Some((
        request.user_name()?,
        request.nas_port_type()?,
        request.called_station_id()?,
    ))
}

/// The target network rides in the last colon-delimited segment of the
/// Called-Station-Id (shaped like `AA-BB-CC-DD-EE-FF:ssid`); a value with
/// no delimiter is used whole.
fn requested_ssid(called_station: &str) -> &str {
    called_station.rsplit(':').next().unwrap_or(called_station)
}
