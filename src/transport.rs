//! Transport-level request and response views.
//!
//! # Responsibilities
//! - Carry the decoded request head handed in by the transport layer
//! - Expose the socket facts derivations depend on (peer address, TLS)
//! - Provide the read-only response view the freshness check consumes
//!
//! # Design Decisions
//! - Plain data with public fields; the surrounding framework fills these
//!   in and the context takes ownership
//! - The HTTP/2 `:authority` pseudo-header travels as its own field since
//!   pseudo-header names are not valid header-map keys

use http::{HeaderMap, Method, StatusCode, Version};
use std::net::IpAddr;

/// Decoded inbound request head.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    /// Request method.
    pub method: Method,

    /// Raw request-target as received (origin-form or absolute-form).
    pub target: String,

    /// Decoded header mapping.
    pub headers: HeaderMap,

    /// Negotiated protocol version.
    pub version: Version,

    /// HTTP/2 `:authority` pseudo-header, when the connection carries one.
    pub authority: Option<String>,

    /// Facts about the underlying socket.
    pub socket: SocketInfo,
}

impl TransportRequest {
    /// A minimal head for the given method and target: no headers,
    /// HTTP/1.1, plaintext, unknown peer.
    pub fn new(method: Method, target: impl Into<String>) -> Self {
        Self {
            method,
            target: target.into(),
            headers: HeaderMap::new(),
            version: Version::HTTP_11,
            authority: None,
            socket: SocketInfo::default(),
        }
    }

    /// Major version of the negotiated protocol.
    pub fn version_major(&self) -> u8 {
        if self.version == Version::HTTP_2 {
            2
        } else if self.version == Version::HTTP_3 {
            3
        } else if self.version == Version::HTTP_09 {
            0
        } else {
            1
        }
    }
}

/// Socket-level facts the context derives from.
#[derive(Debug, Clone, Default)]
pub struct SocketInfo {
    /// Peer address, when the transport knows it.
    pub remote_addr: Option<IpAddr>,

    /// Whether the connection is TLS-terminated locally.
    pub encrypted: bool,
}

/// Read-only view of the paired response, consumed by the freshness check.
#[derive(Debug, Clone)]
pub struct ResponseHead {
    pub status: StatusCode,
    pub headers: HeaderMap,
}

impl ResponseHead {
    /// A response view with the given status and no headers.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_major() {
        let mut request = TransportRequest::new(Method::GET, "/");
        assert_eq!(request.version_major(), 1);

        request.version = Version::HTTP_2;
        assert_eq!(request.version_major(), 2);

        request.version = Version::HTTP_3;
        assert_eq!(request.version_major(), 3);

        request.version = Version::HTTP_09;
        assert_eq!(request.version_major(), 0);
    }
}
