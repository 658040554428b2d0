//! RADIUS responder subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound UDP datagram
//!     → packet.rs (RFC 2865 parse, attribute extraction)
//!     → server.rs (task per request, bounded by max_in_flight)
//!     → decision engine (accept/reject)
//!     → packet.rs (reply encoding + Response Authenticator)
//!     → sent back to the requester's source address
//! ```
//!
//! # Design Decisions
//! - Access-Request is the only code served; everything else is logged and
//!   dropped without a reply
//! - A datagram that cannot be parsed never crashes the responder and never
//!   earns a reply (there is no request authenticator to answer under)
//! - A parseable request missing a required attribute is answered with
//!   Access-Reject
//! - Responses carry no attributes: the wire result is the bare code, and
//!   diagnostic detail stays in the operator log

pub mod packet;
pub mod server;

pub use packet::{Code, Packet, PacketError};
pub use server::{RadiusServer, ServerError};
