use rand::{thread_rng, Rng};
use swarm_tracker_primitives::info_hash::InfoHash;
use swarm_tracker_primitives::peer::PeerId;

/// Returns a random info hash.
#[must_use]
pub fn info_hash() -> InfoHash {
    InfoHash(thread_rng().gen())
}

/// Returns a random peer id.
#[must_use]
pub fn peer_id() -> PeerId {
    PeerId(thread_rng().gen())
}
