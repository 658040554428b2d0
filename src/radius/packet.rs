//! RADIUS packet codec.
//!
//! Implements the RFC 2865 subset this responder speaks: the fixed 20-byte
//! header, type-length-value attributes, and the MD5 Response
//! Authenticator. Multi-octet integers are network byte order.

use md5::{Digest, Md5};
use thiserror::Error;

/// Largest datagram the responder will consider (RFC 2865 §3).
pub const MAX_PACKET_LEN: usize = 4096;

/// Fixed header size: code, identifier, length, authenticator.
pub const HEADER_LEN: usize = 20;

/// User-Name attribute type.
pub const ATTR_USER_NAME: u8 = 1;
/// User-Password attribute type. Parsed like any other attribute but never
/// consulted; the registered address is the whole credential in this model.
pub const ATTR_USER_PASSWORD: u8 = 2;
/// Called-Station-Id attribute type.
pub const ATTR_CALLED_STATION_ID: u8 = 30;
/// NAS-Port-Type attribute type.
pub const ATTR_NAS_PORT_TYPE: u8 = 61;

/// NAS-Port-Type value: Wireless - Other.
pub const NAS_PORT_TYPE_WIRELESS_OTHER: u32 = 18;
/// NAS-Port-Type value: Wireless - IEEE 802.11.
pub const NAS_PORT_TYPE_WIRELESS_802_11: u32 = 19;

/// Whether a NAS-Port-Type value names one of the wireless enumerations.
pub fn is_wireless_port(port_type: u32) -> bool {
    port_type == NAS_PORT_TYPE_WIRELESS_802_11 || port_type == NAS_PORT_TYPE_WIRELESS_OTHER
}

/// RADIUS packet codes this responder understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Code {
    AccessRequest = 1,
    AccessAccept = 2,
    AccessReject = 3,
}

impl Code {
    fn from_u8(byte: u8) -> Option<Code> {
        match byte {
            1 => Some(Code::AccessRequest),
            2 => Some(Code::AccessAccept),
            3 => Some(Code::AccessReject),
            _ => None,
        }
    }
}

/// Error type for packet decoding.
#[derive(Debug, Error)]
pub enum PacketError {
    #[error("datagram too short for a RADIUS header: {0} bytes")]
    TooShort(usize),
    #[error("unsupported RADIUS code {0}")]
    UnsupportedCode(u8),
    #[error("declared length {declared} does not fit a {actual}-byte datagram")]
    BadLength { declared: u16, actual: usize },
    #[error("malformed attribute at offset {0}")]
    BadAttribute(usize),
}

/// One type-length-value attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub kind: u8,
    pub value: Vec<u8>,
}

/// A decoded RADIUS packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub code: Code,
    pub identifier: u8,
    pub authenticator: [u8; 16],
    pub attributes: Vec<Attribute>,
}

impl Packet {
    pub fn new(code: Code, identifier: u8, authenticator: [u8; 16]) -> Self {
        Self {
            code,
            identifier,
            authenticator,
            attributes: Vec::new(),
        }
    }

    /// Decode a datagram.
    ///
    /// Octets beyond the declared length are padding and are ignored; a
    /// declared length larger than the datagram (or smaller than the
    /// header) rejects the packet, as does any attribute whose length
    /// field walks outside the packet.
    pub fn parse(buf: &[u8]) -> Result<Packet, PacketError> {
        if buf.len() < HEADER_LEN {
            return Err(PacketError::TooShort(buf.len()));
        }

        let code = Code::from_u8(buf[0]).ok_or(PacketError::UnsupportedCode(buf[0]))?;
        let identifier = buf[1];
        let declared = u16::from_be_bytes([buf[2], buf[3]]);
        let length = declared as usize;
        if length < HEADER_LEN || length > buf.len() {
            return Err(PacketError::BadLength {
                declared,
                actual: buf.len(),
            });
        }

        let mut authenticator = [0u8; 16];
        authenticator.copy_from_slice(&buf[4..20]);

        let mut attributes = Vec::new();
        let mut offset = HEADER_LEN;
        while offset < length {
            if offset + 2 > length {
                return Err(PacketError::BadAttribute(offset));
            }
            let kind = buf[offset];
            let attr_len = buf[offset + 1] as usize;
            if attr_len < 2 || offset + attr_len > length {
                return Err(PacketError::BadAttribute(offset));
            }
            attributes.push(Attribute {
                kind,
                value: buf[offset + 2..offset + attr_len].to_vec(),
            });
            offset += attr_len;
        }

        Ok(Packet {
            code,
            identifier,
            authenticator,
            attributes,
        })
    }

    /// Append a text attribute (used by request builders and tests).
    pub fn push_string(&mut self, kind: u8, value: &str) {
        debug_assert!(value.len() <= 253, "attribute value too long");
        self.attributes.push(Attribute {
            kind,
            value: value.as_bytes().to_vec(),
        });
    }

    /// Append a 32-bit integer attribute.
    pub fn push_u32(&mut self, kind: u8, value: u32) {
        self.attributes.push(Attribute {
            kind,
            value: value.to_be_bytes().to_vec(),
        });
    }

    /// First attribute of the given type, if any.
    pub fn attribute(&self, kind: u8) -> Option<&[u8]> {
        self.attributes
            .iter()
            .find(|a| a.kind == kind)
            .map(|a| a.value.as_slice())
    }

    /// User-Name as text. Non-UTF-8 values yield `None` and are treated the
    /// same as a missing attribute.
    pub fn user_name(&self) -> Option<&str> {
        std::str::from_utf8(self.attribute(ATTR_USER_NAME)?).ok()
    }

    /// Called-Station-Id as text.
    pub fn called_station_id(&self) -> Option<&str> {
        std::str::from_utf8(self.attribute(ATTR_CALLED_STATION_ID)?).ok()
    }

    /// NAS-Port-Type as an integer. Values of any other width are malformed
    /// and yield `None`.
    pub fn nas_port_type(&self) -> Option<u32> {
        let value = self.attribute(ATTR_NAS_PORT_TYPE)?;
        let bytes: [u8; 4] = value.try_into().ok()?;
        Some(u32::from_be_bytes(bytes))
    }

    /// Encode this packet, writing the authenticator field verbatim.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN + 16);
        out.push(self.code as u8);
        out.push(self.identifier);
        out.extend_from_slice(&0u16.to_be_bytes());
        out.extend_from_slice(&self.authenticator);
        for attr in &self.attributes {
            out.push(attr.kind);
            out.push((attr.value.len() + 2) as u8);
            out.extend_from_slice(&attr.value);
        }
        let length = out.len() as u16;
        out[2..4].copy_from_slice(&length.to_be_bytes());
        out
    }

    /// Build the attribute-free reply to this request, authenticated with
    /// the shared secret.
    ///
    /// Per RFC 2865 §3 the Response Authenticator is
    /// `MD5(code ‖ identifier ‖ length ‖ request authenticator ‖ attributes ‖ secret)`,
    /// computed here over the reply with the request's authenticator in
    /// place, then written into the authenticator field.
    pub fn reply(&self, code: Code, secret: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN);
        out.push(code as u8);
        out.push(self.identifier);
        out.extend_from_slice(&(HEADER_LEN as u16).to_be_bytes());
        out.extend_from_slice(&self.authenticator);

        let mut hasher = Md5::new();
        hasher.update(&out);
        hasher.update(secret);
        let digest = hasher.finalize();

        out[4..20].copy_from_slice(&digest);
        out
    }
}

/// Check a reply's Response Authenticator against the request authenticator
/// it must have been computed from. This is the check a NAS performs; the
/// integration tests use it to hold the responder to the RFC.
pub fn verify_response_authenticator(
    response: &[u8],
    request_authenticator: &[u8; 16],
    secret: &[u8],
) -> bool {
    if response.len() < HEADER_LEN {
        return false;
    }
    let mut hasher = Md5::new();
    hasher.update(&response[0..4]);
    hasher.update(request_authenticator);
    hasher.update(&response[HEADER_LEN..]);
    hasher.update(secret);
    let digest = hasher.finalize();
    digest.as_slice() == &response[4..20]
}
