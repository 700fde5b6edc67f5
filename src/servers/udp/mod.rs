//! UDP Tracker.
//!
//! This module contains the UDP tracker: the socket server, the request
//! dispatcher and the wire codec of the two protocol versions it speaks.
//!
//! ```text
//!                  +-----------------+      +------------+      +----------------+
//! datagram ------> | Authenticator   | ---> | Dispatcher | ---> | core::Tracker  |
//!                  | (optional)      |      |            |      | (PeerRegistry) |
//!                  +-----------------+      +------------+      +----------------+
//!                                                |
//!                                   ConnectionTokenTable
//! ```
//!
//! # Connect
//!
//! A client first sends a `connect` request carrying the protocol id
//! `0x41727101980`. The tracker answers with a random connection id that is
//! valid for a single `announce` or `scrape` from the same IP address, during
//! [`CONNECTION_TOKEN_LIFETIME`](swarm_tracker_configuration::CONNECTION_TOKEN_LIFETIME)
//! unless configured otherwise.
//!
//! # Announce and scrape
//!
//! Both consume the connection id. Requests with an unknown, expired, reused
//! or foreign connection id get no reply at all, so the tracker cannot be
//! used to bounce traffic to a spoofed address.
//!
//! # Authentication
//!
//! When enabled, every datagram ends with a 16 byte trailer, see
//! [`core::auth`](crate::core::auth). Datagrams without it are dropped and
//! datagrams with a bad one get an `Access Denied` error reply.
//!
//! # Errors
//!
//! Requests that cannot be answered meaningfully are dropped. Requests with an
//! unknown action or that the peer registry fails to serve get an error reply.
//! See [`error::Disposition`].
use std::net::SocketAddr;

pub mod client;
pub mod connection_token;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod peer_builder;
pub mod protocol;
pub mod server;

pub const UDP_TRACKER_LOG_TARGET: &str = "UDP TRACKER";

/// Maximum size of a datagram the tracker reads. Longer datagrams are cut.
pub const MAX_PACKET_SIZE: usize = 1496;

/// A datagram as received from the socket.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawRequest {
    payload: Vec<u8>,
    from: SocketAddr,
}

impl RawRequest {
    #[must_use]
    pub fn new(payload: Vec<u8>, from: SocketAddr) -> Self {
        Self { payload, from }
    }

    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    #[must_use]
    pub fn from(&self) -> SocketAddr {
        self.from
    }
}
