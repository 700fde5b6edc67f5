//! Logic to extract the peer info from the announce request.
use std::net::{IpAddr, SocketAddr};

use swarm_tracker_clock::clock::Time;
use swarm_tracker_primitives::peer;

use super::protocol::request::AnnounceRequest;
use crate::CurrentClock;

/// Extracts the [`peer::Peer`] info from the announce request.
///
/// The IP address the client put in the request, when the protocol version
/// honours it, replaces the address the datagram came from.
#[must_use]
pub fn from_request(announce_request: &AnnounceRequest, peer_ip: &IpAddr) -> peer::Peer {
    let ip = announce_request.ip_address.map_or(*peer_ip, IpAddr::V4);

    peer::Peer {
        peer_id: announce_request.peer_id,
        peer_addr: SocketAddr::new(ip, announce_request.port),
        updated: CurrentClock::now(),
        uploaded: announce_request.bytes_uploaded,
        downloaded: announce_request.bytes_downloaded,
        left: announce_request.bytes_left,
        event: announce_request.event,
    }
}
