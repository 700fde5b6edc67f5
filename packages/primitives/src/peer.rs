//! Peer struct used by the peer registry.
//!
//! A sample peer:
//!
//! ```rust,no_run
//! use swarm_tracker_primitives::announce_event::AnnounceEvent;
//! use swarm_tracker_primitives::peer::{self, PeerId};
//! use swarm_tracker_primitives::{DurationSinceUnixEpoch, NumberOfBytes};
//! use std::net::{IpAddr, Ipv4Addr, SocketAddr};
//!
//! peer::Peer {
//!     peer_id: PeerId(*b"-qB00000000000000000"),
//!     peer_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::new(126, 0, 0, 1)), 8080),
//!     updated: DurationSinceUnixEpoch::new(1_669_397_478_934, 0),
//!     uploaded: NumberOfBytes::new(0),
//!     downloaded: NumberOfBytes::new(0),
//!     left: NumberOfBytes::new(0),
//!     event: AnnounceEvent::Started,
//! };
//! ```
use std::net::SocketAddr;

use crate::announce_event::AnnounceEvent;
use crate::{DurationSinceUnixEpoch, NumberOfBytes};

/// Peer ID. A 20-byte array chosen by the client.
#[derive(PartialEq, Eq, Hash, Clone, Copy, Default, Debug, PartialOrd, Ord)]
pub struct PeerId(pub [u8; 20]);

pub const PEER_ID_BYTES_LEN: usize = 20;

impl PeerId {
    /// The peer id as a hex string, prefixed with `0x`.
    #[must_use]
    pub fn to_hex_string(&self) -> String {
        let mut chars = [0u8; 40];
        match binascii::bin2hex(&self.0, &mut chars) {
            Ok(hex) => format!("0x{}", String::from_utf8_lossy(hex)),
            Err(_) => String::new(),
        }
    }
}

impl std::fmt::Display for PeerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex_string())
    }
}

/// A peer participating in a swarm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Peer {
    /// ID used by the downloader peer
    pub peer_id: PeerId,
    /// The IP and port this peer is listening on
    pub peer_addr: SocketAddr,
    /// The last time the the tracker receive an announce request from this peer (timestamp)
    pub updated: DurationSinceUnixEpoch,
    /// The total amount of bytes uploaded by this peer so far
    pub uploaded: NumberOfBytes,
    /// The total amount of bytes downloaded by this peer so far
    pub downloaded: NumberOfBytes,
    /// The number of bytes this peer still has to download
    pub left: NumberOfBytes,
    /// This is an optional key which maps to started, completed, or stopped (or empty, which is the same as not being present).
    pub event: AnnounceEvent,
}

impl Peer {
    #[must_use]
    pub fn is_seeder(&self) -> bool {
        self.left.0 <= 0 && self.event != AnnounceEvent::Stopped
    }
}
