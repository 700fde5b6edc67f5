//! UDP tracker job starter.
//!
//! The [`udp_tracker::start_job`](crate::bootstrap::jobs::udp_tracker::start_job)
//! function starts a new UDP tracker server.
//!
//! > **NOTICE**: that the application can launch more than one UDP tracker
//! > on different ports. Each one gets its own dispatcher, so connection ids
//! > issued by one tracker are not valid on another.
use std::sync::Arc;

use swarm_tracker_configuration::UdpTracker;
use tokio::task::JoinHandle;

use crate::core::auth::UserTable;
use crate::core::Tracker;
use crate::servers::udp::handlers::Dispatcher;
use crate::servers::udp::server::spawner::Spawner;
use crate::servers::udp::server::{Server, UdpError};
use crate::servers::udp::UDP_TRACKER_LOG_TARGET;

/// It builds the dispatcher of a UDP tracker.
///
/// External authorization is answered from the `users` table of the tracker
/// configuration.
#[must_use]
pub fn dispatcher_for(config: &UdpTracker, tracker: Arc<Tracker>) -> Arc<Dispatcher> {
    let authorizer = Arc::new(UserTable::new(&config.authentication.users));

    Arc::new(Dispatcher::new(config, tracker, authorizer))
}

/// It starts a new UDP server with the provided configuration.
///
/// It spawns a new asynchronous task for the new UDP server.
///
/// # Errors
///
/// Will return an error if the server cannot be started.
pub async fn start_job(config: &UdpTracker, tracker: Arc<Tracker>) -> Result<JoinHandle<()>, UdpError> {
    let server = Server::new(Spawner::new(config.bind_address, config.max_concurrent_requests))
        .start(dispatcher_for(config, tracker))
        .await?;

    Ok(tokio::spawn(async move {
        let binding = server.state.binding;
        // the launcher treats a dropped halt sender as a halt
        let halt_task = server.state.halt_task;

        if let Err(err) = server.state.task.await {
            tracing::error!(target: UDP_TRACKER_LOG_TARGET, %binding, %err, "the UDP tracker task failed");
        }

        drop(halt_task);
    }))
}
