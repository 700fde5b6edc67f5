//! Swarm tracker application.
//!
//! The tracker application has a global configuration for multiple jobs.
//! It's basically a container for other services.
//!
//! Jobs started depending on the configuration:
//!
//! - UDP trackers: one per `[[udp_trackers]]` entry, each on its own socket.
//! - Swarm cleaner: it removes inactive peers and (optionally) peerless swarms.
use std::sync::Arc;

use swarm_tracker_configuration::Configuration;
use tokio::task::JoinHandle;

use crate::bootstrap::jobs::{swarm_cleanup, udp_tracker};
use crate::core::swarms::InMemoryRegistry;
use crate::core::Tracker;
use crate::servers::udp::UDP_TRACKER_LOG_TARGET;

/// It starts the jobs enabled by the configuration.
///
/// A UDP tracker that cannot be started is logged and skipped, the other
/// jobs still run.
pub async fn start(config: &Configuration, tracker: Arc<Tracker>, registry: &Arc<InMemoryRegistry>) -> Vec<JoinHandle<()>> {
    let mut jobs: Vec<JoinHandle<()>> = Vec::new();

    for udp_tracker_config in &config.udp_trackers {
        match udp_tracker::start_job(udp_tracker_config, tracker.clone()).await {
            Ok(job) => jobs.push(job),
            Err(err) => {
                tracing::error!(target: UDP_TRACKER_LOG_TARGET, bind_address = %udp_tracker_config.bind_address, %err, "could not start the UDP tracker");
            }
        }
    }

    if config.core.inactive_peer_cleanup_interval > 0 {
        jobs.push(swarm_cleanup::start_job(&config.core, registry));
    }

    jobs
}
