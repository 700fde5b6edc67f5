//! Structs to collect and keep UDP tracker metrics.
//!
//! The tracker counts, for each IP version used by the clients:
//!
//! - `connect` requests handled
//! - `announce` requests handled
//! - `scrape` requests handled
//! - error replies sent
//!
//! and, for all clients, the datagrams dropped without a reply and the bytes
//! received with and sent in reply to the datagrams that got an answer.
//!
//! The data is collected by using an `event-sender -> event listener` model.
//!
//! The dispatcher uses an [`statistics::EventSender`](crate::core::statistics::EventSender) instance to send an event.
//! The [`statistics::Keeper`](crate::core::statistics::Keeper) listens to new events and uses the [`statistics::Repo`](crate::core::statistics::Repo) to update and store metrics.
use std::sync::Arc;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use tokio::sync::mpsc::error::SendError;
use tokio::sync::{mpsc, RwLock, RwLockReadGuard};
use tracing::debug;

const CHANNEL_BUFFER_SIZE: usize = 65_535;

/// An statistics event.
///
/// - `4` or `6` means the IP version used by the client
/// - the suffix is the type of request handled, or `ErrorReply` when the
///   request was answered with an error
#[derive(Debug, PartialEq, Eq)]
pub enum Event {
    Udp4Connect,
    Udp4Announce,
    Udp4Scrape,
    Udp4ErrorReply,
    Udp6Connect,
    Udp6Announce,
    Udp6Scrape,
    Udp6ErrorReply,
    /// A datagram that got no reply.
    UdpRequestDropped,
    /// A reply was handed to the socket.
    UdpReplySent { bytes_received: u64, bytes_sent: u64 },
}

/// Metrics collected by the tracker.
#[derive(Debug, PartialEq, Eq, Default, Clone, Copy)]
pub struct Metrics {
    /// Total number of `connect` requests from IPv4 clients.
    pub udp4_connections_handled: u64,
    /// Total number of `announce` requests from IPv4 clients.
    pub udp4_announces_handled: u64,
    /// Total number of `scrape` requests from IPv4 clients.
    pub udp4_scrapes_handled: u64,
    /// Total number of error replies sent to IPv4 clients.
    pub udp4_errors_sent: u64,
    /// Total number of `connect` requests from IPv6 clients.
    pub udp6_connections_handled: u64,
    /// Total number of `announce` requests from IPv6 clients.
    pub udp6_announces_handled: u64,
    /// Total number of `scrape` requests from IPv6 clients.
    pub udp6_scrapes_handled: u64,
    /// Total number of error replies sent to IPv6 clients.
    pub udp6_errors_sent: u64,
    /// Datagrams dropped without a reply.
    pub udp_requests_dropped: u64,
    pub udp_bytes_received: u64,
    pub udp_bytes_sent: u64,
}

/// The service responsible for keeping tracker metrics (listening to statistics events and handle them).
pub struct Keeper {
    pub repository: Repo,
}

impl Default for Keeper {
    fn default() -> Self {
        Self::new()
    }
}

impl Keeper {
    #[must_use]
    pub fn new() -> Self {
        Self { repository: Repo::new() }
    }

    #[must_use]
    pub fn new_active_instance() -> (Box<dyn EventSender>, Repo) {
        let mut stats_tracker = Self::new();

        let stats_event_sender = stats_tracker.run_event_listener();

        (stats_event_sender, stats_tracker.repository)
    }

    pub fn run_event_listener(&mut self) -> Box<dyn EventSender> {
        let (sender, receiver) = mpsc::channel::<Event>(CHANNEL_BUFFER_SIZE);

        let stats_repository = self.repository.clone();

        tokio::spawn(async move { event_listener(receiver, stats_repository).await });

        Box::new(Sender { sender })
    }
}

/// It builds the statistics event sender and repository.
///
/// No events are collected when `tracker_usage_statistics` is disabled, the
/// repository then keeps reporting zeros.
#[must_use]
pub fn setup(tracker_usage_statistics: bool) -> (Option<Box<dyn EventSender>>, Repo) {
    if tracker_usage_statistics {
        let (stats_event_sender, stats_repository) = Keeper::new_active_instance();
        (Some(stats_event_sender), stats_repository)
    } else {
        (None, Keeper::new().repository)
    }
}

async fn event_listener(mut receiver: mpsc::Receiver<Event>, stats_repository: Repo) {
    while let Some(event) = receiver.recv().await {
        event_handler(event, &stats_repository).await;
    }
}

async fn event_handler(event: Event, stats_repository: &Repo) {
    stats_repository
        .update(|metrics| match event {
            Event::Udp4Connect => metrics.udp4_connections_handled += 1,
            Event::Udp4Announce => metrics.udp4_announces_handled += 1,
            Event::Udp4Scrape => metrics.udp4_scrapes_handled += 1,
            Event::Udp4ErrorReply => metrics.udp4_errors_sent += 1,
            Event::Udp6Connect => metrics.udp6_connections_handled += 1,
            Event::Udp6Announce => metrics.udp6_announces_handled += 1,
            Event::Udp6Scrape => metrics.udp6_scrapes_handled += 1,
            Event::Udp6ErrorReply => metrics.udp6_errors_sent += 1,
            Event::UdpRequestDropped => metrics.udp_requests_dropped += 1,
            Event::UdpReplySent {
                bytes_received,
                bytes_sent,
            } => {
                metrics.udp_bytes_received += bytes_received;
                metrics.udp_bytes_sent += bytes_sent;
            }
        })
        .await;

    debug!("stats: {:?}", stats_repository.get_stats().await);
}

/// A trait to allow sending statistics events
#[async_trait]
#[cfg_attr(test, automock)]
pub trait EventSender: Sync + Send {
    async fn send_event(&self, event: Event) -> Option<Result<(), SendError<Event>>>;
}

/// An [`statistics::EventSender`](crate::core::statistics::EventSender) implementation.
///
/// It uses a channel sender to send the statistic events. The channel is created by a
/// [`statistics::Keeper`](crate::core::statistics::Keeper)
pub struct Sender {
    sender: mpsc::Sender<Event>,
}

#[async_trait]
impl EventSender for Sender {
    async fn send_event(&self, event: Event) -> Option<Result<(), SendError<Event>>> {
        Some(self.sender.send(event).await)
    }
}

/// A repository for the tracker metrics.
#[derive(Clone)]
pub struct Repo {
    pub stats: Arc<RwLock<Metrics>>,
}

impl Default for Repo {
    fn default() -> Self {
        Self::new()
    }
}

impl Repo {
    #[must_use]
    pub fn new() -> Self {
        Self {
            stats: Arc::new(RwLock::new(Metrics::default())),
        }
    }

    pub async fn get_stats(&self) -> RwLockReadGuard<'_, Metrics> {
        self.stats.read().await
    }

    async fn update(&self, change: impl FnOnce(&mut Metrics)) {
        let mut stats_lock = self.stats.write().await;
        change(&mut stats_lock);
        drop(stats_lock);
    }
}
