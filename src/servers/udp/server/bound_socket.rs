use std::fmt::Debug;
use std::net::SocketAddr;
use std::ops::Deref;

use url::Url;

use crate::servers::udp::UDP_TRACKER_LOG_TARGET;

/// Wrapper for Tokio [`UdpSocket`][`tokio::net::UdpSocket`] that is bound to a particular socket.
pub struct BoundSocket {
    socket: tokio::net::UdpSocket,
    local_addr: SocketAddr,
}

impl BoundSocket {
    /// # Errors
    ///
    /// Will return an error if the socket can't be bound to the provided
    /// address or its local address cannot be read.
    pub async fn new(addr: SocketAddr) -> Result<Self, std::io::Error> {
        tracing::debug!(target: UDP_TRACKER_LOG_TARGET, bind_addr = %addr, "binding");

        let socket = tokio::net::UdpSocket::bind(addr).await?;
        let local_addr = socket.local_addr()?;

        tracing::debug!(target: UDP_TRACKER_LOG_TARGET, %local_addr, "bound");

        Ok(Self { socket, local_addr })
    }

    #[must_use]
    pub fn address(&self) -> SocketAddr {
        self.local_addr
    }

    /// The resource name of the socket, `udp://<host>:<port>`.
    ///
    /// # Errors
    ///
    /// Will return an error if the address cannot be used in a URL.
    pub fn url(&self) -> Result<Url, url::ParseError> {
        Url::parse(&format!("udp://{}", self.local_addr))
    }
}

impl Deref for BoundSocket {
    type Target = tokio::net::UdpSocket;

    fn deref(&self) -> &Self::Target {
        &self.socket
    }
}

impl Debug for BoundSocket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundSocket").field("local_addr", &self.local_addr).finish_non_exhaustive()
    }
}
