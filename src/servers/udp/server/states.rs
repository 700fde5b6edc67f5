use std::fmt::Debug;
use std::net::SocketAddr;
use std::sync::Arc;

use derive_more::Constructor;
use tokio::task::JoinHandle;

use super::spawner::Spawner;
use super::{Server, UdpError};
use crate::bootstrap::jobs::Started;
use crate::servers::signals::Halted;
use crate::servers::udp::handlers::Dispatcher;
use crate::servers::udp::UDP_TRACKER_LOG_TARGET;

/// A UDP server instance controller with no UDP instance running.
#[allow(clippy::module_name_repetitions)]
pub type StoppedUdpServer = Server<Stopped>;

/// A UDP server instance controller with a running UDP instance.
#[allow(clippy::module_name_repetitions)]
pub type RunningUdpServer = Server<Running>;

/// A stopped UDP server state.
#[derive(Debug)]
pub struct Stopped {
    pub spawner: Spawner,
}

/// A running UDP server state.
#[derive(Debug, Constructor)]
pub struct Running {
    /// The address where the server is bound.
    pub binding: SocketAddr,
    pub halt_task: tokio::sync::oneshot::Sender<Halted>,
    pub task: JoinHandle<Spawner>,
}

impl Server<Stopped> {
    /// Creates a new `UdpServer` instance in `stopped`state.
    #[must_use]
    pub fn new(spawner: Spawner) -> Self {
        Self {
            state: Stopped { spawner },
        }
    }

    /// It starts the server and returns a `UdpServer` controller in `running`
    /// state.
    ///
    /// # Errors
    ///
    /// Will return `Err` if UDP can't bind to given bind address.
    pub async fn start(self, dispatcher: Arc<Dispatcher>) -> Result<Server<Running>, UdpError> {
        let bind_to = self.state.spawner.bind_to;

        let (tx_start, rx_start) = tokio::sync::oneshot::channel::<Result<Started, UdpError>>();
        let (tx_halt, rx_halt) = tokio::sync::oneshot::channel::<Halted>();

        let task = self.state.spawner.spawn_launcher(dispatcher, tx_start, rx_halt);

        let binding = rx_start.await.map_err(|_| UdpError::NotStarted { bind_to })??.address;

        tracing::trace!(target: UDP_TRACKER_LOG_TARGET, local_addr = %binding, "running");

        Ok(Server {
            state: Running::new(binding, tx_halt, task),
        })
    }
}

impl Server<Running> {
    /// It stops the server and returns a `UdpServer` controller in `stopped`
    /// state.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the service no longer listens for the halt signal
    /// or its task failed.
    pub async fn stop(self) -> Result<Server<Stopped>, UdpError> {
        let binding = self.state.binding;

        self.state
            .halt_task
            .send(Halted::Normal)
            .map_err(|_| UdpError::Halt { binding })?;

        let spawner = self.state.task.await.map_err(|source| UdpError::Task { source })?;

        Ok(Server {
            state: Stopped { spawner },
        })
    }
}
