//! Long running jobs of the application.
//!
//! - [`udp_tracker`]: one per `[[udp_trackers]]` entry, each serving its own
//!   socket.
//! - [`swarm_cleanup`]: removes the peers that stopped announcing.
pub mod swarm_cleanup;
pub mod udp_tracker;

use std::net::SocketAddr;

/// Sent by a server launcher once its socket is bound.
#[derive(Debug)]
pub struct Started {
    /// The bound address. Its port is the one the OS picked when the
    /// configuration asked for port `0`.
    pub address: SocketAddr,
}
