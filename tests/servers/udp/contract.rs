// UDP tracker documentation:
//
// BEP 15. UDP Tracker Protocol for BitTorrent
// https://www.bittorrent.org/beps/bep_0015.html

use std::time::Duration;

use swarm_tracker::servers::udp::client::{new_udp_tracker_client_connected, UdpTrackerClient};
use swarm_tracker::servers::udp::protocol::request::{AnnounceRequest, Request};
use swarm_tracker::servers::udp::protocol::response::Response;
use swarm_tracker::servers::udp::protocol::{ConnectionId, TransactionId};
use swarm_tracker_primitives::announce_event::AnnounceEvent;
use swarm_tracker_primitives::info_hash::InfoHash;
use swarm_tracker_primitives::peer::PeerId;
use swarm_tracker_primitives::NumberOfBytes;
use tracing::level_filters::LevelFilter;

use crate::common::logging;
use crate::servers::udp::Started;

/// How long a test waits before concluding the tracker did not reply.
const NO_REPLY_TIMEOUT: Duration = Duration::from_millis(500);

fn init_logging() {
    logging::setup(LevelFilter::ERROR);
}

async fn client_for(env: &Started) -> UdpTrackerClient {
    new_udp_tracker_client_connected(env.bind_address(), env.config.protocol_version)
        .await
        .expect("it should connect to the tracker")
}

fn announce_request(client: &UdpTrackerClient, connection_id: ConnectionId, info_hash: InfoHash, peer_id: PeerId) -> Request {
    Request::Announce(AnnounceRequest {
        connection_id,
        transaction_id: TransactionId(123),
        info_hash,
        peer_id,
        bytes_downloaded: NumberOfBytes(0),
        bytes_left: NumberOfBytes(1000),
        bytes_uploaded: NumberOfBytes(0),
        event: AnnounceEvent::Started,
        ip_address: None,
        key: Some(0),
        peers_wanted: 50,
        port: client.udp_client.socket.local_addr().unwrap().port(),
    })
}

async fn assert_no_reply(client: &mut UdpTrackerClient) {
    client.udp_client.timeout = NO_REPLY_TIMEOUT;

    assert!(client.receive().await.is_err(), "the tracker should not reply");
}

fn assert_error_reply(response: &Response, message: &str) {
    match response {
        Response::Error(error) => assert_eq!(error.message, message),
        response => panic!("expected an error reply, got {response:?}"),
    }
}

#[tokio::test]
async fn should_not_reply_to_an_empty_request() {
    init_logging();

    let env = Started::new(&swarm_tracker_test_helpers::configuration::ephemeral()).await;
    let mut client = client_for(&env).await;

    client.udp_client.send(&[]).await.unwrap();

    assert_no_reply(&mut client).await;

    env.stop().await;
}

#[tokio::test]
async fn should_reply_to_an_unknown_action_with_an_error() {
    init_logging();

    let env = Started::new(&swarm_tracker_test_helpers::configuration::ephemeral()).await;
    let client = client_for(&env).await;

    let mut datagram = 0u64.to_be_bytes().to_vec();
    datagram.extend_from_slice(&9i32.to_be_bytes());
    datagram.extend_from_slice(&77i32.to_be_bytes());
    client.udp_client.send(&datagram).await.unwrap();

    let response = client.receive().await.unwrap();

    assert_error_reply(&response, "unsupported action");
    assert_eq!(response.transaction_id(), TransactionId(77));

    env.stop().await;
}

mod receiving_a_connection_request {
    use swarm_tracker::servers::udp::protocol::request::{ConnectRequest, Request};
    use swarm_tracker::servers::udp::protocol::response::Response;
    use swarm_tracker::servers::udp::protocol::TransactionId;
    use swarm_tracker_test_helpers::configuration;

    use super::{client_for, init_logging};
    use crate::servers::udp::Started;

    #[tokio::test]
    async fn should_return_a_connect_response() {
        init_logging();

        let env = Started::new(&configuration::ephemeral()).await;
        let client = client_for(&env).await;

        client
            .send(&Request::Connect(ConnectRequest {
                transaction_id: TransactionId(123),
            }))
            .await
            .unwrap();

        let response = client.receive().await.unwrap();

        assert!(matches!(response, Response::Connect(_)));
        assert_eq!(response.transaction_id(), TransactionId(123));

        env.stop().await;
    }
}

mod receiving_an_announce_request {
    use std::net::SocketAddr;

    use swarm_tracker::servers::udp::protocol::response::Response;
    use swarm_tracker::servers::udp::protocol::TransactionId;
    use swarm_tracker_primitives::protocol_version::ProtocolVersion;
    use swarm_tracker_test_helpers::{configuration, random};

    use super::{announce_request, assert_no_reply, client_for, init_logging};
    use crate::servers::udp::Started;

    #[tokio::test]
    async fn should_answer_once_and_then_drop_the_request_repeated_with_the_same_connection_id() {
        init_logging();

        let env = Started::new(&configuration::ephemeral()).await;
        let mut client = client_for(&env).await;
        let info_hash = random::info_hash();
        let peer_id = random::peer_id();

        let connection_id = client.connect(TransactionId(123)).await.unwrap();

        let request = announce_request(&client, connection_id, info_hash, peer_id);
        client.send(&request).await.unwrap();

        let Response::Announce(response) = client.receive().await.unwrap() else {
            panic!("expected an announce reply");
        };
        let own_addr = SocketAddr::new(env.bind_address().ip(), client.udp_client.socket.local_addr().unwrap().port());
        assert!(response.announce_interval >= 0);
        assert!(!response.peers.contains(&own_addr));

        client.send(&request).await.unwrap();

        assert_no_reply(&mut client).await;

        env.stop().await;
    }

    #[tokio::test]
    async fn should_list_the_other_peers_of_the_swarm() {
        init_logging();

        let env = Started::new(&configuration::ephemeral()).await;
        let info_hash = random::info_hash();

        let first = client_for(&env).await;
        let connection_id = first.connect(TransactionId(1)).await.unwrap();
        first
            .send(&announce_request(&first, connection_id, info_hash, random::peer_id()))
            .await
            .unwrap();
        first.receive().await.unwrap();

        let second = client_for(&env).await;
        let connection_id = second.connect(TransactionId(2)).await.unwrap();
        second
            .send(&announce_request(&second, connection_id, info_hash, random::peer_id()))
            .await
            .unwrap();

        let Response::Announce(response) = second.receive().await.unwrap() else {
            panic!("expected an announce reply");
        };

        let first_port = first.udp_client.socket.local_addr().unwrap().port();
        assert_eq!(response.peers, vec![SocketAddr::new(env.bind_address().ip(), first_port)]);
        assert_eq!(response.leechers, 2);

        env.stop().await;
    }

    #[tokio::test]
    async fn a_legacy_tracker_should_answer_in_the_legacy_layout() {
        init_logging();

        let env = Started::new(&configuration::ephemeral_with_protocol_version(ProtocolVersion::V1)).await;
        let client = client_for(&env).await;

        let connection_id = client.connect(TransactionId(1)).await.unwrap();
        client
            .send(&announce_request(&client, connection_id, random::info_hash(), random::peer_id()))
            .await
            .unwrap();

        let Response::Announce(response) = client.receive().await.unwrap() else {
            panic!("expected an announce reply");
        };
        assert_eq!(response.announce_interval, 120);
        assert!(response.peers.is_empty());

        env.stop().await;
    }
}

mod receiving_a_scrape_request {
    use swarm_tracker::servers::udp::protocol::request::{Request, ScrapeRequest};
    use swarm_tracker::servers::udp::protocol::response::Response;
    use swarm_tracker::servers::udp::protocol::TransactionId;
    use swarm_tracker_primitives::swarm_metadata::SwarmMetadata;
    use swarm_tracker_test_helpers::{configuration, random};

    use super::{announce_request, client_for, init_logging};
    use crate::servers::udp::Started;

    #[tokio::test]
    async fn should_return_the_stats_of_the_requested_torrents() {
        init_logging();

        let env = Started::new(&configuration::ephemeral()).await;
        let client = client_for(&env).await;
        let info_hash = random::info_hash();

        let connection_id = client.connect(TransactionId(1)).await.unwrap();
        client
            .send(&announce_request(&client, connection_id, info_hash, random::peer_id()))
            .await
            .unwrap();
        client.receive().await.unwrap();

        let connection_id = client.connect(TransactionId(2)).await.unwrap();
        client
            .send(&Request::Scrape(ScrapeRequest {
                connection_id,
                transaction_id: TransactionId(3),
                info_hashes: vec![info_hash, random::info_hash()],
            }))
            .await
            .unwrap();

        let Response::Scrape(response) = client.receive().await.unwrap() else {
            panic!("expected a scrape reply");
        };

        let stats: Vec<SwarmMetadata> = response.torrent_stats.iter().map(|(_, stats)| *stats).collect();
        assert_eq!(stats, vec![SwarmMetadata::new(0, 0, 1), SwarmMetadata::zeroed()]);

        env.stop().await;
    }
}

mod with_authentication {
    use swarm_tracker::servers::udp::protocol::request::{ConnectRequest, Request};
    use swarm_tracker::servers::udp::protocol::response::Response;
    use swarm_tracker::servers::udp::protocol::TransactionId;
    use swarm_tracker_test_helpers::configuration;

    use super::{assert_error_reply, assert_no_reply, client_for, init_logging};
    use crate::servers::udp::Started;

    fn connect_request() -> Request {
        Request::Connect(ConnectRequest {
            transaction_id: TransactionId(5),
        })
    }

    #[tokio::test]
    async fn should_answer_a_client_signing_with_the_shared_password() {
        init_logging();

        let env = Started::new(&configuration::ephemeral_with_shared_password("pw")).await;
        let client = client_for(&env).await.with_credential("alice", "pw");

        client.send(&connect_request()).await.unwrap();

        assert!(matches!(client.receive().await.unwrap(), Response::Connect(_)));

        env.stop().await;
    }

    #[tokio::test]
    async fn should_deny_a_client_signing_with_another_password() {
        init_logging();

        let env = Started::new(&configuration::ephemeral_with_shared_password("pw")).await;
        let client = client_for(&env).await.with_credential("alice", "guess");

        client.send(&connect_request()).await.unwrap();

        let response = client.receive().await.unwrap();
        assert_error_reply(&response, "Access Denied");
        assert_eq!(response.transaction_id(), TransactionId(5));

        env.stop().await;
    }

    #[tokio::test]
    async fn should_not_reply_to_an_unsigned_datagram() {
        init_logging();

        let env = Started::new(&configuration::ephemeral_with_shared_password("pw")).await;
        let mut client = client_for(&env).await;

        client.send(&connect_request()).await.unwrap();

        assert_no_reply(&mut client).await;

        env.stop().await;
    }

    #[tokio::test]
    async fn should_resolve_the_secret_of_each_user_from_the_user_table() {
        init_logging();

        let env = Started::new(&configuration::ephemeral_with_users(&[("alice", "secret")])).await;

        let alice = client_for(&env).await.with_credential("alice", "secret");
        alice.send(&connect_request()).await.unwrap();
        assert!(matches!(alice.receive().await.unwrap(), Response::Connect(_)));

        let mallory = client_for(&env).await.with_credential("mallory", "secret");
        mallory.send(&connect_request()).await.unwrap();
        assert_error_reply(&mallory.receive().await.unwrap(), "Access Denied");

        env.stop().await;
    }
}

mod statistics {
    use std::time::Duration;

    use swarm_tracker::servers::udp::protocol::TransactionId;
    use swarm_tracker_test_helpers::configuration;

    use super::{client_for, init_logging};
    use crate::servers::udp::Started;

    #[tokio::test]
    async fn should_count_the_connect_requests_and_the_bytes_exchanged() {
        init_logging();

        let env = Started::new(&configuration::ephemeral()).await;
        let client = client_for(&env).await;

        client.connect(TransactionId(1)).await.unwrap();

        // the statistics are updated by a separate task
        let mut stats = *env.tracker.get_stats().await;
        for _ in 0..50 {
            if stats.udp_bytes_sent > 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
            stats = *env.tracker.get_stats().await;
        }

        assert_eq!(stats.udp4_connections_handled, 1);
        assert_eq!(stats.udp_bytes_received, 16);
        assert_eq!(stats.udp_bytes_sent, 16);

        env.stop().await;
    }
}
