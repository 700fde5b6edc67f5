//! The UDP tracker wire format versions.
use derive_more::Display;
use serde_repr::{Deserialize_repr, Serialize_repr};

/// Wire format version spoken by a UDP tracker instance.
///
/// Both versions share the same request kinds. They differ in the announce
/// layout and in the announce and scrape replies:
///
/// - `V1`: legacy layout. No peer key, no seeders/leechers in the announce
///   reply, scrape reply entries repeat the info hash.
/// - `V2`: extended layout ([BEP 15](https://www.bittorrent.org/beps/bep_0015.html)).
///   Carries the peer key and an IP override, and the announce reply includes
///   seeders and leechers.
#[derive(Serialize_repr, Deserialize_repr, PartialEq, Eq, Debug, Clone, Copy, Display, Hash, Default)]
#[repr(u8)]
pub enum ProtocolVersion {
    #[display("1")]
    V1 = 1,
    #[default]
    #[display("2")]
    V2 = 2,
}

impl ProtocolVersion {
    #[must_use]
    pub fn is_extended(&self) -> bool {
        matches!(self, Self::V2)
    }
}
