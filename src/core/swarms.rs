//! The bundled in-memory [`PeerRegistry`].
//!
//! It keeps one swarm per info hash. A swarm is the set of peers announcing
//! the torrent, keyed by peer id, plus the number of peers that ever reported
//! a completed download.
use std::collections::{BTreeMap, HashMap};
use std::net::IpAddr;

use async_trait::async_trait;
use parking_lot::RwLock;
use swarm_tracker_configuration::{AnnouncePolicy, TORRENT_PEERS_LIMIT};
use swarm_tracker_located_error::DynError;
use swarm_tracker_primitives::announce_event::AnnounceEvent;
use swarm_tracker_primitives::info_hash::InfoHash;
use swarm_tracker_primitives::peer::{Peer, PeerId};
use swarm_tracker_primitives::swarm_metadata::SwarmMetadata;
use swarm_tracker_primitives::DurationSinceUnixEpoch;

use super::{AnnounceData, PeerRegistry, ScrapeData};

#[derive(Debug, Default, Clone)]
struct Swarm {
    peers: BTreeMap<PeerId, Peer>,
    downloaded: u32,
}

impl Swarm {
    fn upsert(&mut self, peer: &Peer) {
        match peer.event {
            AnnounceEvent::Stopped => {
                self.peers.remove(&peer.peer_id);
            }
            AnnounceEvent::Completed => {
                let previous = self.peers.insert(peer.peer_id, *peer);
                if previous.map_or(true, |previous| previous.event != AnnounceEvent::Completed) {
                    self.downloaded = self.downloaded.saturating_add(1);
                }
            }
            AnnounceEvent::Started | AnnounceEvent::None => {
                self.peers.insert(peer.peer_id, *peer);
            }
        }
    }

    fn metadata(&self) -> SwarmMetadata {
        let seeders = self.peers.values().filter(|peer| peer.is_seeder()).count();
        let leechers = self.peers.len() - seeders;

        SwarmMetadata {
            downloaded: self.downloaded,
            complete: u32::try_from(seeders).unwrap_or(u32::MAX),
            incomplete: u32::try_from(leechers).unwrap_or(u32::MAX),
        }
    }

    /// Up to `limit` peers other than `requester`, only those in the same
    /// address family as `client_ip`.
    fn peers_for(&self, requester: &PeerId, client_ip: IpAddr, limit: usize) -> Vec<Peer> {
        self.peers
            .values()
            .filter(|peer| peer.peer_id != *requester && peer.peer_addr.is_ipv4() == client_ip.is_ipv4())
            .take(limit)
            .copied()
            .collect()
    }
}

/// A peer registry that lives in the tracker process.
#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    policy: AnnouncePolicy,
    swarms: RwLock<HashMap<InfoHash, Swarm>>,
}

impl InMemoryRegistry {
    #[must_use]
    pub fn new(policy: AnnouncePolicy) -> Self {
        Self {
            policy,
            swarms: RwLock::default(),
        }
    }

    /// Stats of one swarm, zeros when the tracker does not know the torrent.
    #[must_use]
    pub fn swarm_metadata(&self, info_hash: &InfoHash) -> SwarmMetadata {
        self.swarms
            .read()
            .get(info_hash)
            .map_or_else(SwarmMetadata::zeroed, Swarm::metadata)
    }

    /// Removes the peers that did not announce after `cutoff`.
    pub fn remove_inactive_peers(&self, cutoff: DurationSinceUnixEpoch) {
        for swarm in self.swarms.write().values_mut() {
            swarm.peers.retain(|_, peer| peer.updated > cutoff);
        }
    }

    /// Removes the swarms without peers.
    pub fn remove_peerless_swarms(&self) {
        self.swarms.write().retain(|_, swarm| !swarm.peers.is_empty());
    }

    #[must_use]
    pub fn number_of_swarms(&self) -> usize {
        self.swarms.read().len()
    }
}

/// How many peers an announce reply lists.
///
/// A negative `peers_wanted` asks for the default amount.
fn peers_limit(peers_wanted: i32) -> usize {
    usize::try_from(peers_wanted).map_or(TORRENT_PEERS_LIMIT, |wanted| wanted.min(TORRENT_PEERS_LIMIT))
}

#[async_trait]
impl PeerRegistry for InMemoryRegistry {
    async fn announce(
        &self,
        info_hash: &InfoHash,
        peer: &Peer,
        peers_wanted: i32,
        client_ip: IpAddr,
    ) -> Result<AnnounceData, DynError> {
        let mut swarms = self.swarms.write();
        let swarm = swarms.entry(*info_hash).or_default();

        swarm.upsert(peer);

        Ok(AnnounceData {
            interval: self.policy.interval,
            peers: swarm.peers_for(&peer.peer_id, client_ip, peers_limit(peers_wanted)),
            stats: swarm.metadata(),
        })
    }

    async fn scrape(&self, info_hashes: &[InfoHash]) -> Result<ScrapeData, DynError> {
        let swarms = self.swarms.read();

        Ok(ScrapeData {
            files: info_hashes
                .iter()
                .map(|info_hash| {
                    let stats = swarms.get(info_hash).map_or_else(SwarmMetadata::zeroed, Swarm::metadata);
                    (*info_hash, stats)
                })
                .collect(),
        })
    }
}
