//! Handlers for the UDP server.
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::panic::Location;
use std::sync::Arc;
use std::time::Instant;

use swarm_tracker_configuration::UdpTracker;
use swarm_tracker_primitives::protocol_version::ProtocolVersion;
use uuid::Uuid;

use super::connection_token::ConnectionTokenTable;
use super::error::{Disposition, Error};
use super::logging::{log_dropped, log_request, log_response};
use super::protocol::request::{AnnounceRequest, ConnectRequest, Request, RequestHeader, ScrapeRequest};
use super::protocol::response::{AddressFamily, AnnounceResponse, ConnectResponse, ErrorResponse, Response, ScrapeResponse};
use super::protocol::{ConnectionId, DecodeError};
use super::{peer_builder, RawRequest, UDP_TRACKER_LOG_TARGET};
use crate::core::auth::{self, Authenticator, Authorizer, Credential};
use crate::core::{statistics, Tracker};

/// Handles the datagrams received by one UDP tracker socket.
///
/// Each dispatcher owns the connection tokens it issued and its own
/// authentication settings. Several dispatchers can share the same core
/// [`Tracker`].
pub struct Dispatcher {
    protocol_version: ProtocolVersion,
    tokens: ConnectionTokenTable,
    authenticator: Option<Authenticator>,
    tracker: Arc<Tracker>,
}

impl Dispatcher {
    /// `authorizer` resolves user secrets when the tracker is configured with
    /// external authorization, it is ignored otherwise.
    #[must_use]
    pub fn new(config: &UdpTracker, tracker: Arc<Tracker>, authorizer: Arc<dyn Authorizer>) -> Self {
        Self {
            protocol_version: config.protocol_version,
            tokens: ConnectionTokenTable::new(config.connection_token_lifetime),
            authenticator: Authenticator::from_config(&config.authentication, authorizer),
            tracker,
        }
    }

    #[must_use]
    pub fn protocol_version(&self) -> ProtocolVersion {
        self.protocol_version
    }

    #[must_use]
    pub fn tracker(&self) -> &Arc<Tracker> {
        &self.tracker
    }

    #[must_use]
    pub fn tokens(&self) -> &ConnectionTokenTable {
        &self.tokens
    }

    /// It handles one incoming datagram.
    ///
    /// It returns the reply to send back to the client, or `None` when the
    /// datagram must go unanswered.
    pub async fn handle_packet(&self, request: &RawRequest, server_socket_addr: SocketAddr) -> Option<Vec<u8>> {
        let start_time = Instant::now();
        let request_id = RequestId::make();

        let response = match self.dispatch(request, server_socket_addr, &request_id).await {
            Ok(response) => response,
            Err(error) => {
                log_failure(&error, &request_id, request.from());

                match error.disposition() {
                    Disposition::Drop => {
                        self.tracker.send_stats_event(statistics::Event::UdpRequestDropped).await;
                        log_dropped(&request_id, &server_socket_addr, start_time.elapsed());
                        return None;
                    }
                    Disposition::Reply { transaction_id, message } => {
                        let event = match request.from() {
                            SocketAddr::V4(_) => statistics::Event::Udp4ErrorReply,
                            SocketAddr::V6(_) => statistics::Event::Udp6ErrorReply,
                        };
                        self.tracker.send_stats_event(event).await;

                        Response::Error(ErrorResponse { transaction_id, message })
                    }
                }
            }
        };

        log_response(&response, &request_id, &server_socket_addr, start_time.elapsed());

        match response.to_bytes(self.protocol_version) {
            Ok(bytes) => Some(bytes),
            Err(err) => {
                tracing::error!(target: UDP_TRACKER_LOG_TARGET, %request_id, %err, "could not write the response");
                None
            }
        }
    }

    /// It authenticates, decodes and dispatches the request.
    ///
    /// The header is decoded before the credential is checked so that an
    /// `Access Denied` reply can carry the transaction id.
    async fn dispatch(
        &self,
        request: &RawRequest,
        server_socket_addr: SocketAddr,
        request_id: &RequestId,
    ) -> Result<Response, Error> {
        let (body, credential) = match self.authenticator {
            Some(_) => {
                let (body, credential) =
                    Credential::split_from(request.payload()).map_err(|source| Error::MissingCredential { source })?;
                (body, Some(credential))
            }
            None => (request.payload(), None),
        };

        let header = RequestHeader::decode(body).map_err(|source| Error::MalformedInput { source })?;

        if let (Some(authenticator), Some(credential)) = (&self.authenticator, &credential) {
            authenticator
                .authenticate(body, credential, server_socket_addr)
                .await
                .map_err(|source| Error::AccessDenied {
                    transaction_id: header.transaction_id,
                    source,
                })?;

            tracing::trace!(target: UDP_TRACKER_LOG_TARGET, %request_id, username = %credential.username(), "authenticated");
        }

        let decoded = Request::decode(body, self.protocol_version).map_err(|source| match source {
            DecodeError::UnknownAction { action, transaction_id } => Error::UnknownAction { action, transaction_id },
            source => Error::MalformedInput { source },
        })?;

        log_request(&decoded, request_id, &server_socket_addr);

        match decoded {
            Request::Connect(connect_request) => Ok(self.handle_connect(request.from(), &connect_request).await),
            Request::Announce(announce_request) => self.handle_announce(request.from(), &announce_request).await,
            Request::Scrape(scrape_request) => self.handle_scrape(request.from(), &scrape_request).await,
        }
    }

    /// It handles the `Connect` request. Refer to [`Connect`](crate::servers::udp#connect)
    /// request for more information.
    pub async fn handle_connect(&self, remote_addr: SocketAddr, request: &ConnectRequest) -> Response {
        let connection_id = ConnectionId(self.tokens.allocate(remote_addr.ip()));

        let event = match remote_addr {
            SocketAddr::V4(_) => statistics::Event::Udp4Connect,
            SocketAddr::V6(_) => statistics::Event::Udp6Connect,
        };
        self.tracker.send_stats_event(event).await;

        Response::Connect(ConnectResponse {
            transaction_id: request.transaction_id,
            connection_id,
        })
    }

    /// It handles the `Announce` request. Refer to [`Announce`](crate::servers::udp#announce-and-scrape)
    /// request for more information.
    ///
    /// # Errors
    ///
    /// Will return [`Error::TokenRejected`] if the connection id is not valid
    /// for the client and [`Error::HandlerFailure`] if the peer registry fails.
    pub async fn handle_announce(&self, remote_addr: SocketAddr, request: &AnnounceRequest) -> Result<Response, Error> {
        self.consume_token(request.connection_id, remote_addr)?;

        let remote_client_ip = remote_addr.ip();
        let peer = peer_builder::from_request(request, &remote_client_ip);

        let announce_data = self
            .tracker
            .announce(&request.info_hash, &peer, request.peers_wanted, remote_client_ip)
            .await
            .map_err(|source| Error::HandlerFailure {
                transaction_id: request.transaction_id,
                source: source.into(),
            })?;

        let event = match remote_client_ip {
            IpAddr::V4(_) => statistics::Event::Udp4Announce,
            IpAddr::V6(_) => statistics::Event::Udp6Announce,
        };
        self.tracker.send_stats_event(event).await;

        Ok(Response::Announce(AnnounceResponse {
            transaction_id: request.transaction_id,
            announce_interval: saturating_i32(announce_data.interval),
            leechers: saturating_i32(announce_data.stats.incomplete),
            seeders: saturating_i32(announce_data.stats.complete),
            peers: announce_data.peers.iter().map(|peer| peer.peer_addr).collect(),
            family: AddressFamily::of(&remote_addr),
        }))
    }

    /// It handles the `Scrape` request. Refer to [`Scrape`](crate::servers::udp#announce-and-scrape)
    /// request for more information.
    ///
    /// # Errors
    ///
    /// Will return [`Error::TokenRejected`] if the connection id is not valid
    /// for the client and [`Error::HandlerFailure`] if the peer registry fails.
    pub async fn handle_scrape(&self, remote_addr: SocketAddr, request: &ScrapeRequest) -> Result<Response, Error> {
        self.consume_token(request.connection_id, remote_addr)?;

        let scrape_data = self
            .tracker
            .scrape(&request.info_hashes)
            .await
            .map_err(|source| Error::HandlerFailure {
                transaction_id: request.transaction_id,
                source: source.into(),
            })?;

        let event = match remote_addr {
            SocketAddr::V4(_) => statistics::Event::Udp4Scrape,
            SocketAddr::V6(_) => statistics::Event::Udp6Scrape,
        };
        self.tracker.send_stats_event(event).await;

        Ok(Response::Scrape(ScrapeResponse {
            transaction_id: request.transaction_id,
            torrent_stats: scrape_data.files,
        }))
    }

    #[track_caller]
    fn consume_token(&self, connection_id: ConnectionId, remote_addr: SocketAddr) -> Result<(), Error> {
        if self.tokens.consume(connection_id.0, remote_addr.ip()) {
            Ok(())
        } else {
            Err(Error::TokenRejected {
                connection_id,
                client: remote_addr.ip(),
                location: Location::caller(),
            })
        }
    }
}

fn log_failure(error: &Error, request_id: &RequestId, from: SocketAddr) {
    match error {
        Error::MalformedInput { .. } | Error::MissingCredential { .. } => {
            tracing::warn!(target: UDP_TRACKER_LOG_TARGET, %request_id, %from, %error, "malformed request");
        }
        Error::AccessDenied {
            source: auth::Error::AccessDenied { username, reason },
            ..
        } => {
            tracing::error!(target: UDP_TRACKER_LOG_TARGET, %request_id, %from, %username, %reason, "access denied");
        }
        Error::AccessDenied { source, .. } => {
            tracing::error!(target: UDP_TRACKER_LOG_TARGET, %request_id, %from, %source, "access denied");
        }
        Error::UnknownAction { action, .. } => {
            tracing::debug!(target: UDP_TRACKER_LOG_TARGET, %request_id, %from, action, "unsupported action");
        }
        Error::TokenRejected { .. } => {
            tracing::debug!(target: UDP_TRACKER_LOG_TARGET, %request_id, %from, %error, "connection id rejected");
        }
        Error::HandlerFailure { .. } => {
            tracing::warn!(target: UDP_TRACKER_LOG_TARGET, %request_id, %from, %error, "handler failure");
        }
    }
}

fn saturating_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

/// An identifier for a request.
#[derive(Debug, Clone)]
pub struct RequestId(Uuid);

impl RequestId {
    fn make() -> RequestId {
        RequestId(Uuid::new_v4())
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {

    use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
    use std::sync::Arc;

    use swarm_tracker_configuration::Configuration;
    use swarm_tracker_primitives::announce_event::AnnounceEvent;
    use swarm_tracker_primitives::info_hash::InfoHash;
    use swarm_tracker_primitives::peer::PeerId;
    use swarm_tracker_primitives::protocol_version::ProtocolVersion;
    use swarm_tracker_primitives::NumberOfBytes;
    use swarm_tracker_test_helpers::configuration;

    use super::Dispatcher;
    use crate::core::auth::UserTable;
    use crate::core::swarms::InMemoryRegistry;
    use crate::core::{statistics, PeerRegistry, Tracker};
    use crate::servers::udp::protocol::request::{AnnounceRequest, ConnectRequest, Request};
    use crate::servers::udp::protocol::response::{AddressFamily, Response};
    use crate::servers::udp::protocol::{ConnectionId, TransactionId};
    use crate::servers::udp::RawRequest;

    fn tracker_with(
        registry: Arc<dyn PeerRegistry>,
        stats_event_sender: Option<Box<dyn statistics::EventSender>>,
    ) -> Arc<Tracker> {
        Arc::new(Tracker::new(registry, stats_event_sender, statistics::Repo::new()))
    }

    fn dispatcher_with(config: &Configuration, tracker: Arc<Tracker>) -> Dispatcher {
        let udp_tracker_config = &config.udp_trackers[0];
        Dispatcher::new(
            udp_tracker_config,
            tracker,
            Arc::new(UserTable::new(&udp_tracker_config.authentication.users)),
        )
    }

    fn dispatcher_with_config(config: &Configuration) -> Dispatcher {
        dispatcher_with(config, tracker_with(Arc::new(InMemoryRegistry::default()), None))
    }

    fn dispatcher() -> Dispatcher {
        dispatcher_with_config(&configuration::ephemeral())
    }

    fn server_addr() -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 6969)
    }

    fn sample_ipv4_remote_addr() -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::new(126, 0, 0, 1)), 8080)
    }

    fn sample_ipv6_remote_addr() -> SocketAddr {
        SocketAddr::new(IpAddr::V6(Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0, 0, 0, 1)), 8080)
    }

    fn encode(request: &Request, version: ProtocolVersion) -> Vec<u8> {
        let mut bytes = Vec::new();
        request.write_bytes(version, &mut bytes).unwrap();
        bytes
    }

    fn connect_request() -> Request {
        Request::Connect(ConnectRequest {
            transaction_id: TransactionId(100),
        })
    }

    fn announce_request(connection_id: ConnectionId) -> AnnounceRequest {
        AnnounceRequest {
            connection_id,
            transaction_id: TransactionId(101),
            info_hash: InfoHash([0x3b; 20]),
            peer_id: PeerId(*b"-qB00000000000000001"),
            bytes_downloaded: NumberOfBytes(0),
            bytes_left: NumberOfBytes(1000),
            bytes_uploaded: NumberOfBytes(0),
            event: AnnounceEvent::Started,
            ip_address: None,
            key: Some(0),
            peers_wanted: 50,
            port: 6881,
        }
    }

    fn parse(bytes: &[u8], version: ProtocolVersion, family: AddressFamily) -> Response {
        Response::parse(bytes, version, family).unwrap()
    }

    async fn connect(dispatcher: &Dispatcher, remote_addr: SocketAddr) -> ConnectionId {
        let datagram = RawRequest::new(encode(&connect_request(), dispatcher.protocol_version()), remote_addr);

        let reply = dispatcher.handle_packet(&datagram, server_addr()).await.unwrap();

        match parse(&reply, dispatcher.protocol_version(), AddressFamily::of(&remote_addr)) {
            Response::Connect(response) => {
                assert_eq!(response.transaction_id, TransactionId(100));
                response.connection_id
            }
            response => panic!("expected a connect reply, got {response:?}"),
        }
    }

    async fn announce(dispatcher: &Dispatcher, remote_addr: SocketAddr, request: AnnounceRequest) -> Option<Vec<u8>> {
        let datagram = RawRequest::new(
            encode(&Request::Announce(request), dispatcher.protocol_version()),
            remote_addr,
        );
        dispatcher.handle_packet(&datagram, server_addr()).await
    }

    mod connect_request {
        use std::sync::Arc;

        use futures::future;
        use mockall::predicate::eq;
        use swarm_tracker_test_helpers::configuration;

        use super::{connect, dispatcher, dispatcher_with, sample_ipv4_remote_addr, sample_ipv6_remote_addr, tracker_with};
        use crate::core::statistics::{Event, MockEventSender};
        use crate::core::swarms::InMemoryRegistry;

        #[tokio::test]
        async fn it_should_issue_a_token_for_the_client_ip() {
            let dispatcher = dispatcher();

            let connection_id = connect(&dispatcher, sample_ipv4_remote_addr()).await;

            assert!(dispatcher.tokens().consume(connection_id.0, sample_ipv4_remote_addr().ip()));
        }

        #[tokio::test]
        async fn it_should_issue_a_different_token_for_every_connect() {
            let dispatcher = dispatcher();

            let first = connect(&dispatcher, sample_ipv6_remote_addr()).await;
            let second = connect(&dispatcher, sample_ipv6_remote_addr()).await;

            assert_ne!(first, second);
        }

        #[tokio::test]
        async fn it_should_send_the_udp4_connect_event_when_a_client_tries_to_connect_using_a_ip4_socket_address() {
            let mut stats_event_sender_mock = MockEventSender::new();
            stats_event_sender_mock
                .expect_send_event()
                .with(eq(Event::Udp4Connect))
                .times(1)
                .returning(|_| Box::pin(future::ready(Some(Ok(())))));
            let tracker = tracker_with(Arc::new(InMemoryRegistry::default()), Some(Box::new(stats_event_sender_mock)));
            let dispatcher = dispatcher_with(&configuration::ephemeral(), tracker);

            connect(&dispatcher, sample_ipv4_remote_addr()).await;
        }

        #[tokio::test]
        async fn it_should_send_the_udp6_connect_event_when_a_client_tries_to_connect_using_a_ip6_socket_address() {
            let mut stats_event_sender_mock = MockEventSender::new();
            stats_event_sender_mock
                .expect_send_event()
                .with(eq(Event::Udp6Connect))
                .times(1)
                .returning(|_| Box::pin(future::ready(Some(Ok(())))));
            let tracker = tracker_with(Arc::new(InMemoryRegistry::default()), Some(Box::new(stats_event_sender_mock)));
            let dispatcher = dispatcher_with(&configuration::ephemeral(), tracker);

            connect(&dispatcher, sample_ipv6_remote_addr()).await;
        }
    }

    mod announce_request {
        use std::net::{IpAddr, Ipv4Addr, SocketAddr};
        use std::sync::Arc;

        use mockall::predicate::{always, eq};
        use swarm_tracker_located_error::DynError;
        use swarm_tracker_primitives::protocol_version::ProtocolVersion;
        use swarm_tracker_test_helpers::configuration;

        use super::{
            announce, announce_request, connect, dispatcher, dispatcher_with, dispatcher_with_config, parse,
            sample_ipv4_remote_addr, sample_ipv6_remote_addr, tracker_with,
        };
        use crate::core::{AnnounceData, MockPeerRegistry};
        use crate::servers::udp::protocol::response::{AddressFamily, ErrorResponse, Response};
        use crate::servers::udp::protocol::{ConnectionId, TransactionId};

        #[tokio::test]
        async fn it_should_be_answered_once_per_connect() {
            let dispatcher = dispatcher();
            let remote_addr = sample_ipv4_remote_addr();
            let connection_id = connect(&dispatcher, remote_addr).await;

            let first = announce(&dispatcher, remote_addr, announce_request(connection_id)).await;
            let second = announce(&dispatcher, remote_addr, announce_request(connection_id)).await;

            let Response::Announce(response) = parse(&first.unwrap(), ProtocolVersion::V2, AddressFamily::Ipv4) else {
                panic!("expected an announce reply");
            };
            assert_eq!(response.transaction_id, TransactionId(101));
            assert_eq!(response.announce_interval, 120);
            assert_eq!(response.leechers, 1);
            assert!(second.is_none());
        }

        #[tokio::test]
        async fn it_should_be_dropped_when_the_token_was_issued_to_another_ip() {
            let dispatcher = dispatcher();
            let connection_id = connect(&dispatcher, sample_ipv4_remote_addr()).await;
            let spoofed = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(126, 0, 0, 2)), 8080);

            assert!(announce(&dispatcher, spoofed, announce_request(connection_id)).await.is_none());
        }

        #[tokio::test]
        async fn it_should_accept_a_token_presented_from_another_port_of_the_same_ip() {
            let dispatcher = dispatcher();
            let connection_id = connect(&dispatcher, sample_ipv4_remote_addr()).await;
            let other_port = SocketAddr::new(sample_ipv4_remote_addr().ip(), 9090);

            assert!(announce(&dispatcher, other_port, announce_request(connection_id)).await.is_some());
        }

        #[tokio::test]
        async fn it_should_be_dropped_when_the_token_was_never_issued() {
            let dispatcher = dispatcher();

            assert!(announce(&dispatcher, sample_ipv4_remote_addr(), announce_request(ConnectionId(42)))
                .await
                .is_none());
        }

        #[tokio::test]
        async fn it_should_list_the_other_peers_of_the_swarm_in_the_requester_address_family() {
            let dispatcher = dispatcher();

            for (id, remote_addr) in [(1u8, sample_ipv4_remote_addr()), (2u8, sample_ipv6_remote_addr())] {
                let connection_id = connect(&dispatcher, remote_addr).await;
                let mut request = announce_request(connection_id);
                request.peer_id.0[19] = id;
                announce(&dispatcher, remote_addr, request).await.unwrap();
            }

            let requester = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(126, 0, 0, 3)), 8080);
            let connection_id = connect(&dispatcher, requester).await;
            let mut request = announce_request(connection_id);
            request.peer_id.0[19] = 3;

            let reply = announce(&dispatcher, requester, request).await.unwrap();

            let Response::Announce(response) = parse(&reply, ProtocolVersion::V2, AddressFamily::Ipv4) else {
                panic!("expected an announce reply");
            };
            assert_eq!(response.peers, vec![SocketAddr::new(sample_ipv4_remote_addr().ip(), 6881)]);
            assert_eq!(response.leechers, 3);
        }

        #[tokio::test]
        async fn an_extended_announce_should_register_the_ip_sent_by_the_client() {
            let dispatcher = dispatcher();
            let connection_id = connect(&dispatcher, sample_ipv4_remote_addr()).await;
            let mut request = announce_request(connection_id);
            request.ip_address = Some(Ipv4Addr::new(10, 1, 2, 3));
            announce(&dispatcher, sample_ipv4_remote_addr(), request).await.unwrap();

            let requester = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(126, 0, 0, 3)), 8080);
            let connection_id = connect(&dispatcher, requester).await;
            let mut request = announce_request(connection_id);
            request.peer_id.0[19] = 9;
            let reply = announce(&dispatcher, requester, request).await.unwrap();

            let Response::Announce(response) = parse(&reply, ProtocolVersion::V2, AddressFamily::Ipv4) else {
                panic!("expected an announce reply");
            };
            assert_eq!(
                response.peers,
                vec![SocketAddr::new(IpAddr::V4(Ipv4Addr::new(10, 1, 2, 3)), 6881)]
            );
        }

        #[tokio::test]
        async fn a_legacy_tracker_should_reply_without_seeders_and_leechers() {
            let dispatcher = dispatcher_with_config(&configuration::ephemeral_with_protocol_version(ProtocolVersion::V1));
            let connection_id = connect(&dispatcher, sample_ipv4_remote_addr()).await;

            let reply = announce(&dispatcher, sample_ipv4_remote_addr(), announce_request(connection_id))
                .await
                .unwrap();

            // action, transaction id and interval, no peers yet
            assert_eq!(reply.len(), 12);
        }

        #[tokio::test]
        async fn a_registry_failure_should_be_answered_with_its_description() {
            let mut registry = MockPeerRegistry::new();
            registry.expect_announce().returning(|_, _, _, _| {
                Err(Arc::new(std::io::Error::new(std::io::ErrorKind::Other, "swarm store unavailable")) as DynError)
            });
            let dispatcher = dispatcher_with(&configuration::ephemeral(), tracker_with(Arc::new(registry), None));
            let connection_id = connect(&dispatcher, sample_ipv4_remote_addr()).await;

            let reply = announce(&dispatcher, sample_ipv4_remote_addr(), announce_request(connection_id))
                .await
                .unwrap();

            assert_eq!(
                parse(&reply, ProtocolVersion::V2, AddressFamily::Ipv4),
                Response::Error(ErrorResponse {
                    transaction_id: TransactionId(101),
                    message: "swarm store unavailable".to_string()
                })
            );
        }

        #[tokio::test]
        async fn it_should_forward_the_number_of_peers_wanted_to_the_registry() {
            let mut registry = MockPeerRegistry::new();
            registry
                .expect_announce()
                .with(always(), always(), eq(0), always())
                .times(1)
                .returning(|_, _, _, _| Ok(AnnounceData::default()));
            let dispatcher = dispatcher_with(&configuration::ephemeral(), tracker_with(Arc::new(registry), None));
            let connection_id = connect(&dispatcher, sample_ipv4_remote_addr()).await;
            let mut request = announce_request(connection_id);
            request.peers_wanted = 0;

            assert!(announce(&dispatcher, sample_ipv4_remote_addr(), request).await.is_some());
        }
    }

    mod scrape_request {
        use swarm_tracker_primitives::info_hash::InfoHash;
        use swarm_tracker_primitives::protocol_version::ProtocolVersion;
        use swarm_tracker_primitives::swarm_metadata::SwarmMetadata;

        use super::{announce, announce_request, connect, dispatcher, encode, parse, sample_ipv4_remote_addr, server_addr};
        use crate::servers::udp::protocol::request::{Request, ScrapeRequest};
        use crate::servers::udp::protocol::response::{AddressFamily, Response};
        use crate::servers::udp::protocol::TransactionId;
        use crate::servers::udp::RawRequest;

        #[tokio::test]
        async fn it_should_report_the_stats_of_every_requested_torrent_in_request_order() {
            let dispatcher = dispatcher();
            let remote_addr = sample_ipv4_remote_addr();

            let connection_id = connect(&dispatcher, remote_addr).await;
            announce(&dispatcher, remote_addr, announce_request(connection_id)).await.unwrap();

            let connection_id = connect(&dispatcher, remote_addr).await;
            let scrape = RawRequest::new(
                encode(
                    &Request::Scrape(ScrapeRequest {
                        connection_id,
                        transaction_id: TransactionId(7),
                        info_hashes: vec![InfoHash([0; 20]), InfoHash([0x3b; 20])],
                    }),
                    ProtocolVersion::V2,
                ),
                remote_addr,
            );

            let reply = dispatcher.handle_packet(&scrape, server_addr()).await.unwrap();

            let Response::Scrape(response) = parse(&reply, ProtocolVersion::V2, AddressFamily::Ipv4) else {
                panic!("expected a scrape reply");
            };
            let stats: Vec<SwarmMetadata> = response.torrent_stats.iter().map(|(_, stats)| *stats).collect();
            assert_eq!(response.transaction_id, TransactionId(7));
            assert_eq!(stats, vec![SwarmMetadata::zeroed(), SwarmMetadata::new(0, 0, 1)]);
        }
    }

    mod malformed_request {
        use swarm_tracker_primitives::protocol_version::ProtocolVersion;

        use super::{dispatcher, parse, sample_ipv4_remote_addr, server_addr};
        use crate::servers::udp::protocol::response::{AddressFamily, ErrorResponse, Response};
        use crate::servers::udp::protocol::TransactionId;
        use crate::servers::udp::RawRequest;

        fn header(action: i32, transaction_id: i32) -> Vec<u8> {
            let mut bytes = 7u64.to_be_bytes().to_vec();
            bytes.extend_from_slice(&action.to_be_bytes());
            bytes.extend_from_slice(&transaction_id.to_be_bytes());
            bytes
        }

        #[tokio::test]
        async fn a_datagram_shorter_than_the_header_should_be_dropped() {
            let dispatcher = dispatcher();
            let datagram = RawRequest::new(vec![0; 15], sample_ipv4_remote_addr());

            assert!(dispatcher.handle_packet(&datagram, server_addr()).await.is_none());
        }

        #[tokio::test]
        async fn a_truncated_announce_should_be_dropped() {
            let dispatcher = dispatcher();
            let mut bytes = header(1, 1);
            bytes.extend_from_slice(&[0; 30]);

            let datagram = RawRequest::new(bytes, sample_ipv4_remote_addr());

            assert!(dispatcher.handle_packet(&datagram, server_addr()).await.is_none());
        }

        #[tokio::test]
        async fn an_unknown_action_should_be_answered_with_an_error() {
            let dispatcher = dispatcher();

            let reply = dispatcher
                .handle_packet(&RawRequest::new(header(5, 55), sample_ipv4_remote_addr()), server_addr())
                .await
                .unwrap();

            assert_eq!(
                parse(&reply, ProtocolVersion::V2, AddressFamily::Ipv4),
                Response::Error(ErrorResponse {
                    transaction_id: TransactionId(55),
                    message: "unsupported action".to_string()
                })
            );
        }
    }

    mod authentication {
        use swarm_tracker_primitives::protocol_version::ProtocolVersion;
        use swarm_tracker_test_helpers::configuration;

        use super::{connect_request, dispatcher_with_config, encode, parse, sample_ipv4_remote_addr, server_addr};
        use crate::core::auth::{Credential, Secret};
        use crate::servers::udp::protocol::response::{AddressFamily, ErrorResponse, Response};
        use crate::servers::udp::protocol::TransactionId;
        use crate::servers::udp::RawRequest;

        fn signed(body: &[u8], username: &str, password: &str) -> Vec<u8> {
            let mut datagram = body.to_vec();
            datagram.extend_from_slice(&Credential::sign(body, username, &Secret::from_password(password)).to_bytes());
            datagram
        }

        #[tokio::test]
        async fn a_datagram_signed_with_the_shared_password_should_be_answered() {
            let dispatcher = dispatcher_with_config(&configuration::ephemeral_with_shared_password("pw"));
            let body = encode(&connect_request(), ProtocolVersion::V2);

            let reply = dispatcher
                .handle_packet(&RawRequest::new(signed(&body, "alice", "pw"), sample_ipv4_remote_addr()), server_addr())
                .await
                .unwrap();

            assert!(matches!(
                parse(&reply, ProtocolVersion::V2, AddressFamily::Ipv4),
                Response::Connect(_)
            ));
        }

        #[tokio::test]
        async fn a_datagram_without_trailer_should_be_dropped() {
            let dispatcher = dispatcher_with_config(&configuration::ephemeral_with_shared_password("pw"));

            let unsigned = RawRequest::new(vec![0; 16], sample_ipv4_remote_addr());

            assert!(dispatcher.handle_packet(&unsigned, server_addr()).await.is_none());
        }

        #[tokio::test]
        async fn a_datagram_with_a_bad_hash_should_be_denied() {
            let dispatcher = dispatcher_with_config(&configuration::ephemeral_with_shared_password("pw"));
            let body = encode(&connect_request(), ProtocolVersion::V2);

            let reply = dispatcher
                .handle_packet(&RawRequest::new(signed(&body, "alice", "guess"), sample_ipv4_remote_addr()), server_addr())
                .await
                .unwrap();

            assert_eq!(
                parse(&reply, ProtocolVersion::V2, AddressFamily::Ipv4),
                Response::Error(ErrorResponse {
                    transaction_id: TransactionId(100),
                    message: "Access Denied".to_string()
                })
            );
        }

        #[tokio::test]
        async fn a_user_of_the_user_table_should_be_answered_and_a_stranger_denied() {
            let dispatcher = dispatcher_with_config(&configuration::ephemeral_with_users(&[("alice", "secret")]));
            let body = encode(&connect_request(), ProtocolVersion::V2);

            let alice = dispatcher
                .handle_packet(&RawRequest::new(signed(&body, "alice", "secret"), sample_ipv4_remote_addr()), server_addr())
                .await
                .unwrap();
            let mallory = dispatcher
                .handle_packet(&RawRequest::new(signed(&body, "mallory", "secret"), sample_ipv4_remote_addr()), server_addr())
                .await
                .unwrap();

            assert!(matches!(
                parse(&alice, ProtocolVersion::V2, AddressFamily::Ipv4),
                Response::Connect(_)
            ));
            assert!(matches!(
                parse(&mallory, ProtocolVersion::V2, AddressFamily::Ipv4),
                Response::Error(_)
            ));
        }
    }
}
