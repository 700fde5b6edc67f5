use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use swarm_tracker::bootstrap::app::initialize_with_configuration;
use swarm_tracker::bootstrap::jobs::udp_tracker::dispatcher_for;
use swarm_tracker::core::swarms::InMemoryRegistry;
use swarm_tracker::core::Tracker;
use swarm_tracker::servers::udp::server::spawner::Spawner;
use swarm_tracker::servers::udp::server::states::{Running, Stopped};
use swarm_tracker::servers::udp::server::Server;
use swarm_tracker_configuration::{Configuration, UdpTracker};

const TIMEOUT: Duration = Duration::from_secs(5);

pub struct Environment<S> {
    pub config: Arc<UdpTracker>,
    pub tracker: Arc<Tracker>,
    pub registry: Arc<InMemoryRegistry>,
    pub server: Server<S>,
}

impl Environment<Stopped> {
    #[allow(dead_code)]
    pub fn new(configuration: &Configuration) -> Self {
        let (tracker, registry) = initialize_with_configuration(configuration);

        let config = Arc::new(configuration.udp_trackers[0].clone());

        let server = Server::new(Spawner::new(config.bind_address, config.max_concurrent_requests));

        Self {
            config,
            tracker,
            registry,
            server,
        }
    }

    #[allow(dead_code)]
    pub async fn start(self) -> Environment<Running> {
        let dispatcher = dispatcher_for(&self.config, self.tracker.clone());

        Environment {
            config: self.config,
            tracker: self.tracker,
            registry: self.registry,
            server: self.server.start(dispatcher).await.expect("it should start the udp tracker"),
        }
    }
}

impl Environment<Running> {
    pub async fn new(configuration: &Configuration) -> Self {
        tokio::time::timeout(TIMEOUT, Environment::<Stopped>::new(configuration).start())
            .await
            .expect("it should create an environment within the timeout")
    }

    #[allow(dead_code)]
    pub async fn stop(self) -> Environment<Stopped> {
        let stopped = tokio::time::timeout(TIMEOUT, self.server.stop())
            .await
            .expect("it should stop the environment within the timeout");

        Environment {
            config: self.config,
            tracker: self.tracker,
            registry: self.registry,
            server: stopped.expect("it should stop the udp tracker service"),
        }
    }

    pub fn bind_address(&self) -> SocketAddr {
        self.server.state.binding
    }
}

#[cfg(test)]
mod tests {
    use swarm_tracker_test_helpers::configuration;
    use tracing::level_filters::LevelFilter;

    use crate::common::logging;
    use crate::servers::udp::Started;

    #[tokio::test]
    async fn it_should_make_and_stop_udp_server() {
        logging::setup(LevelFilter::ERROR);

        let env = Started::new(&configuration::ephemeral()).await;

        let stopped = env.stop().await;

        assert_eq!(stopped.server.state.spawner.bind_to, stopped.config.bind_address);
    }
}
