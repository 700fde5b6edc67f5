use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::select;
use tokio::sync::{oneshot, Semaphore};
use tracing::instrument;

use super::bound_socket::BoundSocket;
use super::processor::Processor;
use super::receiver::Receiver;
use super::UdpError;
use crate::bootstrap::jobs::Started;
use crate::servers::signals::{shutdown_signal_with_message, Halted};
use crate::servers::udp::handlers::Dispatcher;
use crate::servers::udp::UDP_TRACKER_LOG_TARGET;

/// How long the launcher waits for the socket to be bound.
const BIND_TIMEOUT: Duration = Duration::from_secs(5);

/// A UDP server instance launcher.
pub struct Launcher;

impl Launcher {
    /// It starts the UDP server instance and runs it until it is halted.
    ///
    /// The outcome of binding the socket is reported through `tx_start`.
    #[instrument(skip(dispatcher, tx_start, rx_halt))]
    pub async fn run_with_graceful_shutdown(
        dispatcher: Arc<Dispatcher>,
        bind_to: SocketAddr,
        max_concurrent_requests: usize,
        tx_start: oneshot::Sender<Result<Started, UdpError>>,
        rx_halt: oneshot::Receiver<Halted>,
    ) {
        tracing::info!(target: UDP_TRACKER_LOG_TARGET, "Starting on: {bind_to}");

        let bound_socket = match tokio::time::timeout(BIND_TIMEOUT, BoundSocket::new(bind_to)).await {
            Ok(Ok(socket)) => socket,
            Ok(Err(source)) => {
                tracing::error!(target: UDP_TRACKER_LOG_TARGET, %bind_to, err = %source, "could not bind the socket");
                let _ = tx_start.send(Err(UdpError::Bind { bind_to, source }));
                return;
            }
            Err(_elapsed) => {
                tracing::error!(target: UDP_TRACKER_LOG_TARGET, %bind_to, "timed out binding the socket");
                let _ = tx_start.send(Err(UdpError::BindTimeout { bind_to }));
                return;
            }
        };

        let address = bound_socket.address();
        let local_udp_url = bound_socket
            .url()
            .map_or_else(|_| format!("udp://{address}"), |url| url.to_string());

        tracing::info!(target: UDP_TRACKER_LOG_TARGET, "Started on: {local_udp_url}");

        let receiver = Receiver::new(bound_socket.into());

        let running = {
            let local_addr = local_udp_url.clone();
            tokio::task::spawn(async move {
                tracing::debug!(target: UDP_TRACKER_LOG_TARGET, local_addr, "listening");
                Self::run_udp_server_main(receiver, dispatcher, max_concurrent_requests).await;
            })
        };

        if tx_start.send(Ok(Started { address })).is_err() {
            tracing::warn!(target: UDP_TRACKER_LOG_TARGET, local_udp_url, "nobody is waiting for the start notification");
        }

        let stop = running.abort_handle();

        let halt_task = tokio::task::spawn(shutdown_signal_with_message(
            rx_halt,
            format!("Halting UDP Service Bound to Socket: {address}"),
        ));

        select! {
            _ = running => { tracing::debug!(target: UDP_TRACKER_LOG_TARGET, local_udp_url, "stopped"); },
            _ = halt_task => { tracing::debug!(target: UDP_TRACKER_LOG_TARGET, local_udp_url, "halting"); }
        }
        stop.abort();

        tokio::task::yield_now().await;
    }

    #[instrument(skip(receiver, dispatcher))]
    async fn run_udp_server_main(mut receiver: Receiver, dispatcher: Arc<Dispatcher>, max_concurrent_requests: usize) {
        let permits = Arc::new(Semaphore::new(max_concurrent_requests.max(1)));

        let local_addr = format!("udp://{}", receiver.bound_socket_address());

        loop {
            // Waiting for a permit leaves pending datagrams in the socket buffer.
            let Ok(permit) = permits.clone().acquire_owned().await else {
                break;
            };

            let Some(req) = receiver.next().await else {
                tracing::error!(target: UDP_TRACKER_LOG_TARGET, local_addr, "the socket stream ended");
                break;
            };

            let req = match req {
                Ok(req) => req,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {
                    tracing::warn!(target: UDP_TRACKER_LOG_TARGET, local_addr, err = %e, "interrupted");
                    return;
                }
                Err(e) => {
                    tracing::error!(target: UDP_TRACKER_LOG_TARGET, local_addr, err = %e, "could not receive");
                    break;
                }
            };

            let processor = Processor::new(receiver.socket.clone(), dispatcher.clone());

            tokio::task::spawn(async move {
                processor.process_request(req).await;
                drop(permit);
            });
        }
    }
}
