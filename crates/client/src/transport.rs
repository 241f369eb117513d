//! The transport capability.
//!
//! The client core never owns sockets directly: it asks a [`Transport`] for
//! a duplex byte stream to the resolved authority and runs the protocol on
//! top of whatever comes back. The default [`TcpTransport`] opens plain TCP
//! connections; TLS (or any in-memory stand-in for tests) is just another
//! implementation of the same trait, supplied through
//! [`send_via`](crate::send_via).

use std::io;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tracing::debug;

use crate::builder::TransportRequest;

/// Capability to open a duplex byte stream to a request's authority.
///
/// One connection is opened per hop; the client never pools or reuses them.
#[async_trait]
pub trait Transport: Send + Sync {
    type IO: AsyncRead + AsyncWrite + Send + Unpin + 'static;

    async fn connect(&self, request: &TransportRequest) -> io::Result<Self::IO>;
}

/// Plain TCP transport, the default for `send`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpTransport;

impl TcpTransport {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Transport for TcpTransport {
    type IO = TcpStream;

    async fn connect(&self, request: &TransportRequest) -> io::Result<TcpStream> {
        debug!(host = %request.host, port = request.port, "connecting");
        TcpStream::connect((request.host.as_str(), request.port)).await
    }
}
