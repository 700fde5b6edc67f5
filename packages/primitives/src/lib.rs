//! Primitive types for the swarm tracker.
//!
//! These are the basic data structures shared by the tracker server crate and
//! the other packages in the workspace: identifiers taken from the wire
//! (`InfoHash`, `PeerId`), announce events, swarm statistics and the UDP
//! protocol version a tracker instance speaks.
use std::time::Duration;

pub mod announce_event;
pub mod info_hash;
pub mod peer;
pub mod protocol_version;
pub mod swarm_metadata;

/// Duration since the Unix Epoch.
pub type DurationSinceUnixEpoch = Duration;

/// A number of bytes as reported by a peer (uploaded, downloaded or left).
///
/// The UDP wire format uses a signed 64-bit integer, so does this type.
#[derive(PartialEq, Eq, Hash, Clone, Copy, Default, Debug, PartialOrd, Ord, derive_more::Display, derive_more::From)]
pub struct NumberOfBytes(pub i64);

impl NumberOfBytes {
    #[must_use]
    pub fn new(bytes: i64) -> Self {
        Self(bytes)
    }
}
