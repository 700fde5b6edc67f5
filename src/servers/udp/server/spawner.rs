//! A thin wrapper for tokio spawn to launch the UDP server launcher as a new task.
use std::net::SocketAddr;
use std::sync::Arc;

use derive_more::Constructor;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use super::launcher::Launcher;
use super::UdpError;
use crate::bootstrap::jobs::Started;
use crate::servers::signals::Halted;
use crate::servers::udp::handlers::Dispatcher;

#[derive(Constructor, Copy, Clone, Debug)]
pub struct Spawner {
    pub bind_to: SocketAddr,
    pub max_concurrent_requests: usize,
}

impl Spawner {
    /// It spawns a new task to run the UDP server instance.
    ///
    /// The task gives the spawner back when the server stops.
    pub fn spawn_launcher(
        &self,
        dispatcher: Arc<Dispatcher>,
        tx_start: oneshot::Sender<Result<Started, UdpError>>,
        rx_halt: oneshot::Receiver<Halted>,
    ) -> JoinHandle<Spawner> {
        let spawner = *self;

        tokio::spawn(async move {
            Launcher::run_with_graceful_shutdown(
                dispatcher,
                spawner.bind_to,
                spawner.max_concurrent_requests,
                tx_start,
                rx_halt,
            )
            .await;
            spawner
        })
    }
}
