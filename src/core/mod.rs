//! The core `tracker` module contains the tracker logic which is independent of the delivery layer.
//!
//! ```text
//! Delivery layer     Domain layer
//!
//!      UDP tracker |> Core tracker |> Peer registry
//! ```
//!
//! The [`Tracker`] does not keep swarms itself. It forwards announce and
//! scrape requests to a [`PeerRegistry`] and keeps the usage statistics of
//! the UDP trackers that use it. The repository ships an in-memory registry,
//! [`swarms::InMemoryRegistry`], but any implementation of the trait can be
//! plugged in.
//!
//! ## Announce request
//!
//! A peer announces itself to the swarm of a torrent and gets back the
//! addresses of other peers in the same swarm:
//!
//! ```rust,no_run
//! use std::net::{IpAddr, Ipv4Addr, SocketAddr};
//! use std::sync::Arc;
//!
//! use swarm_tracker::core::swarms::InMemoryRegistry;
//! use swarm_tracker::core::{statistics, Tracker};
//! use swarm_tracker_primitives::announce_event::AnnounceEvent;
//! use swarm_tracker_primitives::info_hash::InfoHash;
//! use swarm_tracker_primitives::peer::{Peer, PeerId};
//! use swarm_tracker_primitives::{DurationSinceUnixEpoch, NumberOfBytes};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let (stats_event_sender, stats_repository) = statistics::setup(false);
//! let tracker = Tracker::new(Arc::new(InMemoryRegistry::default()), stats_event_sender, stats_repository);
//!
//! let peer = Peer {
//!     peer_id: PeerId(*b"-qB00000000000000001"),
//!     peer_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::new(126, 0, 0, 1)), 8081),
//!     updated: DurationSinceUnixEpoch::new(1_669_397_478_934, 0),
//!     uploaded: NumberOfBytes(0),
//!     downloaded: NumberOfBytes(0),
//!     left: NumberOfBytes(0),
//!     event: AnnounceEvent::Completed,
//! };
//!
//! let announce_data = tracker.announce(&InfoHash([0x3b; 20]), &peer, 50, peer.peer_addr.ip()).await.unwrap();
//! # }
//! ```
//!
//! The registry decides the announce interval, which peers to list and the
//! swarm statistics included in the reply. It only lists peers in the address
//! family of the client that sent the announce, the only ones its reply can
//! carry.
//!
//! ## Scrape request
//!
//! A scrape asks for the statistics of several swarms at once, without
//! registering the client in any of them. The registry answers in the order
//! of the requested info hashes.
//!
//! ## Statistics
//!
//! See [`statistics`].
pub mod auth;
pub mod statistics;
pub mod swarms;

use std::net::IpAddr;
use std::sync::Arc;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use swarm_tracker_located_error::DynError;
use swarm_tracker_primitives::info_hash::InfoHash;
use swarm_tracker_primitives::peer::Peer;
use swarm_tracker_primitives::swarm_metadata::SwarmMetadata;
use tokio::sync::mpsc::error::SendError;
use tokio::sync::RwLockReadGuard;

/// What the registry answers to an announce.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct AnnounceData {
    /// Seconds the client should wait before announcing again.
    pub interval: u32,
    /// Other peers of the swarm.
    pub peers: Vec<Peer>,
    pub stats: SwarmMetadata,
}

/// What the registry answers to a scrape.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct ScrapeData {
    /// Stats per requested info hash, in request order.
    pub files: Vec<(InfoHash, SwarmMetadata)>,
}

/// Keeps the swarms the tracker reports on.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait PeerRegistry: Send + Sync {
    /// Records `peer` in the swarm of `info_hash` and returns up to
    /// `peers_wanted` other peers of the swarm in the address family of
    /// `client_ip`.
    async fn announce(
        &self,
        info_hash: &InfoHash,
        peer: &Peer,
        peers_wanted: i32,
        client_ip: IpAddr,
    ) -> Result<AnnounceData, DynError>;

    async fn scrape(&self, info_hashes: &[InfoHash]) -> Result<ScrapeData, DynError>;
}

/// The domain layer tracker service.
///
/// It is shared by all the UDP trackers started by the application.
pub struct Tracker {
    registry: Arc<dyn PeerRegistry>,
    stats_event_sender: Option<Box<dyn statistics::EventSender>>,
    stats_repository: statistics::Repo,
}

impl Tracker {
    #[must_use]
    pub fn new(
        registry: Arc<dyn PeerRegistry>,
        stats_event_sender: Option<Box<dyn statistics::EventSender>>,
        stats_repository: statistics::Repo,
    ) -> Tracker {
        Tracker {
            registry,
            stats_event_sender,
            stats_repository,
        }
    }

    /// # Errors
    ///
    /// Will return the registry error.
    pub async fn announce(
        &self,
        info_hash: &InfoHash,
        peer: &Peer,
        peers_wanted: i32,
        client_ip: IpAddr,
    ) -> Result<AnnounceData, DynError> {
        self.registry.announce(info_hash, peer, peers_wanted, client_ip).await
    }

    /// # Errors
    ///
    /// Will return the registry error.
    pub async fn scrape(&self, info_hashes: &[InfoHash]) -> Result<ScrapeData, DynError> {
        self.registry.scrape(info_hashes).await
    }

    /// It return the `Tracker` [`statistics::Metrics`].
    pub async fn get_stats(&self) -> RwLockReadGuard<'_, statistics::Metrics> {
        self.stats_repository.get_stats().await
    }

    /// It allows to send a statistic events which eventually will be used to update [`statistics::Metrics`].
    pub async fn send_stats_event(&self, event: statistics::Event) -> Option<Result<(), SendError<statistics::Event>>> {
        match &self.stats_event_sender {
            None => None,
            Some(stats_event_sender) => stats_event_sender.send_event(event).await,
        }
    }
}
