//! Transport collaborator: owns the socket, the byte framing and the
//! request/reply pairing. The core only sees the `Transport` trait and the
//! `TransportEvent` stream.
use std::fmt;
use std::net::{SocketAddr, ToSocketAddrs};

use mtapi_common::net::LOCALHOST;
use mtapi_common::{Command, MtApiError, MtQuote, ResponseEnvelope, Result};

mod tcp;

pub use tcp::TcpTransport;

/// Identifies one opened channel. Every successful `Transport::open` yields a
/// new value, so health notices from an earlier channel can be told apart.
pub type SessionId = u64;

/// Where to connect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// Explicit host and port.
    Remote {
        /// Host name or IP address.
        host: String,
        /// TCP port.
        port: u16,
    },
    /// Port on the local machine.
    Local {
        /// TCP port.
        port: u16,
    },
}

impl Endpoint {
    /// Host to resolve.
    pub fn host(&self) -> &str {
        match self {
            Endpoint::Remote { host, .. } => host,
            Endpoint::Local { .. } => LOCALHOST,
        }
    }

    /// TCP port.
    pub fn port(&self) -> u16 {
        match self {
            Endpoint::Remote { port, .. } | Endpoint::Local { port } => *port,
        }
    }

    /// Resolves the endpoint to socket addresses, in resolver order.
    pub fn socket_addrs(&self) -> Result<Vec<SocketAddr>> {
        let addrs: Vec<SocketAddr> = (self.host(), self.port()).to_socket_addrs()?.collect();
        if addrs.is_empty() {
            return Err(MtApiError::ConnectFailure(format!("{} did not resolve", self)));
        }
        Ok(addrs)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Remote { host, port } => write!(f, "{}:{}", host, port),
            Endpoint::Local { port } => write!(f, "'localhost':{}", port),
        }
    }
}

/// Notifications raised by the transport independently of any command.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// An instrument joined the quote registry.
    QuoteAdded(Option<MtQuote>),
    /// An instrument's prices changed.
    QuoteUpdated(Option<MtQuote>),
    /// An instrument left the quote registry.
    QuoteRemoved(Option<MtQuote>),
    /// The terminal closed the channel gracefully.
    ServerDisconnected {
        /// Channel the notice belongs to.
        session: SessionId,
    },
    /// The channel broke at the transport level.
    ServerFailed {
        /// Channel the notice belongs to.
        session: SessionId,
        /// Transport error text.
        reason: String,
    },
}

/// Channel to the terminal.
///
/// Implementations must be safe to call from many threads at once: a reply
/// is delivered only to the caller that sent the matching request, and whole
/// frames are never interleaved on the socket.
pub trait Transport: Send + Sync {
    /// Opens the channel and completes the handshake. Health events raised
    /// for this channel carry the returned id.
    fn open(&self, endpoint: &Endpoint) -> Result<SessionId>;

    /// Closes the channel. Health events are not raised for a local close.
    fn close(&self);

    /// Sends one command and waits for its reply.
    fn send_request(&self, command: &Command) -> Result<Option<ResponseEnvelope>>;

    /// Fetches the quotes currently subscribed on the terminal.
    fn get_quotes(&self) -> Result<Vec<MtQuote>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_endpoint_targets_loopback() {
        let endpoint = Endpoint::Local { port: 8222 };
        assert_eq!(endpoint.host(), "127.0.0.1");
        assert_eq!(endpoint.to_string(), "'localhost':8222");
        let addrs = endpoint.socket_addrs().unwrap();
        assert!(addrs.iter().all(|a| a.ip().is_loopback() && a.port() == 8222));
    }

    #[test]
    fn remote_endpoint_display() {
        let endpoint = Endpoint::Remote {
            host: "192.168.1.2".to_string(),
            port: 8222,
        };
        assert_eq!(endpoint.to_string(), "192.168.1.2:8222");
    }
}
