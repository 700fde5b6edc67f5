use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::Stream;

use super::bound_socket::BoundSocket;
use crate::servers::udp::{RawRequest, MAX_PACKET_SIZE};

/// A stream of the datagrams received by a bound socket.
///
/// Datagrams longer than [`MAX_PACKET_SIZE`] are truncated.
pub struct Receiver {
    pub socket: Arc<BoundSocket>,
    data: Box<[u8; MAX_PACKET_SIZE]>,
}

impl Receiver {
    #[must_use]
    pub fn new(socket: Arc<BoundSocket>) -> Self {
        Receiver {
            socket,
            data: Box::new([0; MAX_PACKET_SIZE]),
        }
    }

    #[must_use]
    pub fn bound_socket_address(&self) -> SocketAddr {
        self.socket.address()
    }
}

impl Stream for Receiver {
    type Item = std::io::Result<RawRequest>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        let mut buf = tokio::io::ReadBuf::new(&mut this.data[..]);

        let Poll::Ready(ready) = this.socket.poll_recv_from(cx, &mut buf) else {
            return Poll::Pending;
        };

        let res = match ready {
            Ok(from) => Some(Ok(RawRequest::new(buf.filled().to_vec(), from))),
            Err(err) => Some(Err(err)),
        };

        Poll::Ready(res)
    }
}
