//! Job that runs a task on intervals to clean up the swarms.
//!
//! It removes inactive peers and (optionally) peerless swarms.
//!
//! **Inactive peers** are peers that have not announced for more than
//! `max_peer_timeout` seconds.
//!
//! If the core tracker configuration option `remove_peerless_torrents` is true,
//! the cleanup job will also remove the swarms with an empty peer list.
use std::sync::Arc;
use std::time::{Duration, Instant};

use swarm_tracker_clock::clock::Time;
use swarm_tracker_configuration::Core;
use tokio::task::JoinHandle;

use crate::core::swarms::InMemoryRegistry;
use crate::CurrentClock;

/// It starts a job for cleaning up the swarms of the registry.
///
/// The cleaning task is executed every `inactive_peer_cleanup_interval`
/// seconds. The job ends with the registry or on ctrl-c.
#[must_use]
pub fn start_job(config: &Core, registry: &Arc<InMemoryRegistry>) -> JoinHandle<()> {
    let weak_registry = Arc::downgrade(registry);
    let interval = Duration::from_secs(config.inactive_peer_cleanup_interval);
    let max_peer_timeout = Duration::from_secs(u64::from(config.max_peer_timeout));
    let remove_peerless_swarms = config.remove_peerless_torrents;

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(interval);
        interval.tick().await;

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Stopping swarm cleanup job..");
                    break;
                }
                _ = interval.tick() => {
                    let Some(registry) = weak_registry.upgrade() else {
                        break;
                    };

                    let start_time = Instant::now();
                    tracing::info!("Cleaning up swarms..");
                    cleanup(&registry, max_peer_timeout, remove_peerless_swarms);
                    tracing::info!("Cleaned up swarms in: {}ms", start_time.elapsed().as_millis());
                }
            }
        }
    })
}

/// It removes the peers that did not announce during the last
/// `max_peer_timeout`, and then the emptied swarms if requested.
pub fn cleanup(registry: &InMemoryRegistry, max_peer_timeout: Duration, remove_peerless_swarms: bool) {
    let cutoff = CurrentClock::now_sub(&max_peer_timeout).unwrap_or_default();

    registry.remove_inactive_peers(cutoff);

    if remove_peerless_swarms {
        registry.remove_peerless_swarms();
    }
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr, SocketAddr};
    use std::time::Duration;

    use swarm_tracker_clock::clock::stopped::Stopped as _;
    use swarm_tracker_clock::clock::Stopped;
    use swarm_tracker_primitives::announce_event::AnnounceEvent;
    use swarm_tracker_primitives::info_hash::InfoHash;
    use swarm_tracker_primitives::peer::{Peer, PeerId};
    use swarm_tracker_primitives::NumberOfBytes;

    use super::cleanup;
    use crate::core::swarms::InMemoryRegistry;
    use crate::core::PeerRegistry;

    fn peer_updated_at(updated: Duration) -> Peer {
        Peer {
            peer_id: PeerId([1; 20]),
            peer_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::new(126, 0, 0, 1)), 8080),
            updated,
            uploaded: NumberOfBytes(0),
            downloaded: NumberOfBytes(0),
            left: NumberOfBytes(10),
            event: AnnounceEvent::Started,
        }
    }

    #[tokio::test]
    async fn it_should_remove_the_peers_that_did_not_announce_in_time_and_then_their_swarm() {
        let registry = InMemoryRegistry::default();
        registry
            .announce(&InfoHash([1; 20]), &peer_updated_at(Duration::from_secs(100)), 10, IpAddr::V4(Ipv4Addr::LOCALHOST))
            .await
            .unwrap();

        Stopped::local_set(&Duration::from_secs(2000));
        cleanup(&registry, Duration::from_secs(900), true);
        Stopped::local_reset();

        assert_eq!(registry.number_of_swarms(), 0);
    }

    #[tokio::test]
    async fn it_should_keep_the_peers_that_announced_recently() {
        let registry = InMemoryRegistry::default();
        registry
            .announce(&InfoHash([1; 20]), &peer_updated_at(Duration::from_secs(1500)), 10, IpAddr::V4(Ipv4Addr::LOCALHOST))
            .await
            .unwrap();

        Stopped::local_set(&Duration::from_secs(2000));
        cleanup(&registry, Duration::from_secs(900), true);
        Stopped::local_reset();

        assert_eq!(registry.swarm_metadata(&InfoHash([1; 20])).incomplete, 1);
    }

    #[tokio::test]
    async fn it_should_keep_the_emptied_swarms_when_asked_to() {
        let registry = InMemoryRegistry::default();
        registry
            .announce(&InfoHash([1; 20]), &peer_updated_at(Duration::from_secs(100)), 10, IpAddr::V4(Ipv4Addr::LOCALHOST))
            .await
            .unwrap();

        Stopped::local_set(&Duration::from_secs(2000));
        cleanup(&registry, Duration::from_secs(900), false);
        Stopped::local_reset();

        assert_eq!(registry.number_of_swarms(), 1);
    }
}
