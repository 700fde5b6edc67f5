use derive_more::Constructor;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, PartialEq, Eq, Debug, Clone)]
pub struct Core {
    /// Announce intervals handed to clients.
    #[serde(default = "Core::default_announce_policy")]
    pub announce_policy: AnnouncePolicy,

    /// Seconds a peer may stay silent before the cleanup job removes it
    /// from its swarm.
    #[serde(default = "Core::default_max_peer_timeout")]
    pub max_peer_timeout: u32,

    /// Seconds between two runs of the cleanup job.
    #[serde(default = "Core::default_inactive_peer_cleanup_interval")]
    pub inactive_peer_cleanup_interval: u64,

    /// If enabled, the cleanup job also drops swarms that ended up with no
    /// peers.
    #[serde(default = "Core::default_remove_peerless_torrents")]
    pub remove_peerless_torrents: bool,

    /// Whether the tracker keeps request counters.
    #[serde(default = "Core::default_tracker_usage_statistics")]
    pub tracker_usage_statistics: bool,
}

impl Default for Core {
    fn default() -> Self {
        Self {
            announce_policy: Self::default_announce_policy(),
            max_peer_timeout: Self::default_max_peer_timeout(),
            inactive_peer_cleanup_interval: Self::default_inactive_peer_cleanup_interval(),
            remove_peerless_torrents: Self::default_remove_peerless_torrents(),
            tracker_usage_statistics: Self::default_tracker_usage_statistics(),
        }
    }
}

impl Core {
    fn default_announce_policy() -> AnnouncePolicy {
        AnnouncePolicy::default()
    }

    fn default_max_peer_timeout() -> u32 {
        900
    }

    fn default_inactive_peer_cleanup_interval() -> u64 {
        600
    }

    fn default_remove_peerless_torrents() -> bool {
        true
    }

    fn default_tracker_usage_statistics() -> bool {
        true
    }
}

/// Announce policy
#[derive(Serialize, Deserialize, PartialEq, Eq, Debug, Clone, Copy, Constructor)]
pub struct AnnouncePolicy {
    /// Interval in seconds that the client should wait between sending regular
    /// announce requests to the tracker.
    ///
    /// It's a **recommended** wait time between announcements.
    #[serde(default = "AnnouncePolicy::default_interval")]
    pub interval: u32,

    /// Minimum announce interval. Clients must not reannounce more frequently
    /// than this.
    #[serde(default = "AnnouncePolicy::default_interval_min")]
    pub interval_min: u32,
}

impl Default for AnnouncePolicy {
    fn default() -> Self {
        Self {
            interval: Self::default_interval(),
            interval_min: Self::default_interval_min(),
        }
    }
}

impl AnnouncePolicy {
    fn default_interval() -> u32 {
        120
    }

    fn default_interval_min() -> u32 {
        120
    }
}
