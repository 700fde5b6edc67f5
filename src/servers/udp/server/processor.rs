use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{instrument, Level};

use super::bound_socket::BoundSocket;
use crate::core::statistics;
use crate::servers::udp::handlers::Dispatcher;
use crate::servers::udp::{RawRequest, UDP_TRACKER_LOG_TARGET};

/// Handles one datagram and sends the reply, if any.
pub struct Processor {
    socket: Arc<BoundSocket>,
    dispatcher: Arc<Dispatcher>,
}

impl Processor {
    pub fn new(socket: Arc<BoundSocket>, dispatcher: Arc<Dispatcher>) -> Self {
        Self { socket, dispatcher }
    }

    #[instrument(skip(self, request), fields(from = %request.from()))]
    pub async fn process_request(self, request: RawRequest) {
        let Some(reply) = self.dispatcher.handle_packet(&request, self.socket.address()).await else {
            return;
        };

        self.send_reply(request.from(), request.payload().len(), &reply).await;
    }

    async fn send_reply(&self, target: SocketAddr, bytes_received: usize, payload: &[u8]) {
        match self.socket.send_to(payload, target).await {
            Ok(bytes_sent) => {
                if tracing::event_enabled!(Level::TRACE) {
                    tracing::trace!(target: UDP_TRACKER_LOG_TARGET, %target, bytes_sent, ?payload, "sent");
                }

                self.dispatcher
                    .tracker()
                    .send_stats_event(statistics::Event::UdpReplySent {
                        bytes_received: bytes_received as u64,
                        bytes_sent: bytes_sent as u64,
                    })
                    .await;
            }
            // the client retries
            Err(error) => tracing::warn!(target: UDP_TRACKER_LOG_TARGET, %target, %error, "failed to send"),
        }
    }
}
