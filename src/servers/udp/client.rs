//! A UDP tracker client, used by the console client and the tests.
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use swarm_tracker_primitives::protocol_version::ProtocolVersion;
use tokio::net::UdpSocket;
use tokio::time;

use super::protocol::request::{ConnectRequest, Request};
use super::protocol::response::{AddressFamily, Response};
use super::protocol::{ConnectionId, TransactionId};
use super::MAX_PACKET_SIZE;
use crate::core::auth::{Credential, Secret};

/// Default timeout for sending and receiving packets. And waiting for sockets
/// to be readable and writable.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

const UDP_CLIENT_LOG_TARGET: &str = "UDP CLIENT";

#[allow(clippy::module_name_repetitions)]
#[derive(Debug)]
pub struct UdpClient {
    /// The socket to connect to
    pub socket: Arc<UdpSocket>,

    /// Timeout for sending and receiving packets
    pub timeout: Duration,
}

impl UdpClient {
    /// # Errors
    ///
    /// Will return error if the local address can't be bound.
    pub async fn bind(local_address: SocketAddr) -> Result<Self> {
        let socket = UdpSocket::bind(local_address)
            .await
            .with_context(|| format!("could not bind to {local_address}"))?;

        Ok(Self {
            socket: Arc::new(socket),
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// # Errors
    ///
    /// Will return error if can't connect to the socket.
    pub async fn connect(&self, remote_address: SocketAddr) -> Result<()> {
        self.socket
            .connect(remote_address)
            .await
            .map_err(|e| anyhow!("Failed to connect: {e:?}"))?;

        tracing::debug!(target: UDP_CLIENT_LOG_TARGET, %remote_address, "connected");
        Ok(())
    }

    /// # Errors
    ///
    /// Will return error if the datagram can't be sent before the timeout.
    pub async fn send(&self, bytes: &[u8]) -> Result<usize> {
        tracing::trace!(target: UDP_CLIENT_LOG_TARGET, ?bytes, "sending");

        match time::timeout(self.timeout, self.socket.send(bytes)).await {
            Ok(send_result) => send_result.map_err(|e| anyhow!("IO error during send: {e:?}")),
            Err(_) => bail!("timed out sending the datagram"),
        }
    }

    /// # Errors
    ///
    /// Will return error if no datagram arrives before the timeout.
    pub async fn receive(&self, bytes: &mut [u8]) -> Result<usize> {
        let size = match time::timeout(self.timeout, self.socket.recv(bytes)).await {
            Ok(recv_result) => recv_result.map_err(|e| anyhow!("IO error during receive: {e:?}"))?,
            Err(_) => bail!("timed out waiting for a datagram"),
        };

        tracing::trace!(target: UDP_CLIENT_LOG_TARGET, size, "received");
        Ok(size)
    }
}

/// Creates a new `UdpClient` connected to a Udp server
///
/// # Errors
///
/// Will return any errors present in the call stack
pub async fn new_udp_client_connected(remote_address: SocketAddr) -> Result<UdpClient> {
    let local_address = match remote_address {
        SocketAddr::V4(_) => SocketAddr::from(([0, 0, 0, 0], 0)),
        SocketAddr::V6(_) => SocketAddr::from(([0u16; 8], 0)),
    };

    let client = UdpClient::bind(local_address).await?;
    client.connect(remote_address).await?;
    Ok(client)
}

/// A client speaking the tracker protocol.
///
/// When it has a credential, every datagram it sends is signed.
#[allow(clippy::module_name_repetitions)]
#[derive(Debug)]
pub struct UdpTrackerClient {
    pub udp_client: UdpClient,
    pub protocol_version: ProtocolVersion,
    credential: Option<(String, Secret)>,
}

impl UdpTrackerClient {
    #[must_use]
    pub fn new(udp_client: UdpClient, protocol_version: ProtocolVersion) -> Self {
        Self {
            udp_client,
            protocol_version,
            credential: None,
        }
    }

    /// Signs the datagrams sent from now on as `username`.
    #[must_use]
    pub fn with_credential(mut self, username: &str, password: &str) -> Self {
        self.credential = Some((username.to_string(), Secret::from_password(password)));
        self
    }

    /// # Errors
    ///
    /// Will return error if can't write request to bytes or send them.
    pub async fn send(&self, request: &Request) -> Result<usize> {
        tracing::debug!(target: UDP_CLIENT_LOG_TARGET, ?request, "send request");

        let mut bytes = Vec::with_capacity(MAX_PACKET_SIZE);
        request
            .write_bytes(self.protocol_version, &mut bytes)
            .map_err(|e| anyhow!("could not write request to bytes: {e}."))?;

        if let Some((username, secret)) = &self.credential {
            let credential = Credential::sign(&bytes, username, secret);
            bytes.extend_from_slice(&credential.to_bytes());
        }

        self.udp_client.send(&bytes).await
    }

    /// # Errors
    ///
    /// Will return error if can't create response from the received payload (bytes buffer).
    pub async fn receive(&self) -> Result<Response> {
        let mut response_buffer = [0u8; MAX_PACKET_SIZE];

        let payload_size = self.udp_client.receive(&mut response_buffer).await?;

        let remote_address = self.udp_client.socket.peer_addr()?;

        let response = Response::parse(
            &response_buffer[..payload_size],
            self.protocol_version,
            AddressFamily::of(&remote_address),
        )?;

        tracing::debug!(target: UDP_CLIENT_LOG_TARGET, ?response, "received response");

        Ok(response)
    }

    /// Sends a connect request and returns the issued connection id.
    ///
    /// # Errors
    ///
    /// Will return error if the tracker does not answer with a connect reply.
    pub async fn connect(&self, transaction_id: TransactionId) -> Result<ConnectionId> {
        self.send(&Request::Connect(ConnectRequest { transaction_id })).await?;

        match self.receive().await? {
            Response::Connect(response) => Ok(response.connection_id),
            response => bail!("unexpected response to a connect request: {response:?}"),
        }
    }
}

/// Creates a new `UdpTrackerClient` connected to a Udp Tracker server
///
/// # Errors
///
/// Will return any errors present in the call stack
pub async fn new_udp_tracker_client_connected(
    remote_address: SocketAddr,
    protocol_version: ProtocolVersion,
) -> Result<UdpTrackerClient> {
    let udp_client = new_udp_client_connected(remote_address).await?;
    Ok(UdpTrackerClient::new(udp_client, protocol_version))
}
