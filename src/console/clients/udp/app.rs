//! UDP Tracker client:
//!
//! Examples:
//!
//! Announce request:
//!
//! ```text
//! cargo run --bin udp_tracker_client announce 127.0.0.1:6969 9c38422213e30bff212b30c360d26f9a02136422 | jq
//! ```
//!
//! Announce response:
//!
//! ```json
//! {
//!   "transaction_id": -888840697,
//!   "announce_interval": 120,
//!   "leechers": 0,
//!   "seeders": 1,
//!   "peers": [
//!     "123.123.123.123:51289"
//!   ]
//! }
//! ```
//!
//! Scrape request:
//!
//! ```text
//! cargo run --bin udp_tracker_client scrape 127.0.0.1:6969 9c38422213e30bff212b30c360d26f9a02136422 | jq
//! ```
//!
//! Scrape response:
//!
//! ```json
//! {
//!   "transaction_id": -888840697,
//!   "torrent_stats": [
//!     {
//!       "completed": 0,
//!       "leechers": 0,
//!       "seeders": 0
//!     }
//!   ]
//! }
//! ```
//!
//! The tracker may also be given as a URL, `udp://localhost:6969/scrape`. The
//! path is ignored.
//!
//! Against a legacy tracker pass `--protocol-version 1`. Against a tracker
//! that requires authentication pass `--username` and `--password`, or set
//! `SWARM_TRACKER_USERNAME` and `SWARM_TRACKER_PASSWORD`.
use std::net::SocketAddr;

use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use swarm_tracker_primitives::announce_event::AnnounceEvent;
use swarm_tracker_primitives::info_hash::InfoHash;
use swarm_tracker_primitives::peer::PeerId;
use swarm_tracker_primitives::protocol_version::ProtocolVersion;
use swarm_tracker_primitives::NumberOfBytes;
use tracing::level_filters::LevelFilter;

use super::super::{parse_info_hash, parse_protocol_version, parse_socket_addr};
use crate::servers::udp::client::{new_udp_tracker_client_connected, UdpTrackerClient};
use crate::servers::udp::protocol::request::{AnnounceRequest, Request, ScrapeRequest};
use crate::servers::udp::protocol::response::Response;
use crate::servers::udp::protocol::TransactionId;

const RANDOM_TRANSACTION_ID: i32 = -888_840_697;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Wire format of the tracker, `1` (legacy) or `2` (extended).
    #[arg(long, default_value = "2", value_parser = parse_protocol_version)]
    protocol_version: ProtocolVersion,

    #[arg(long, env = "SWARM_TRACKER_USERNAME", requires = "password")]
    username: Option<String>,

    #[arg(long, env = "SWARM_TRACKER_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Announce {
        #[arg(value_parser = parse_socket_addr)]
        tracker_socket_addr: SocketAddr,
        #[arg(value_parser = parse_info_hash)]
        info_hash: InfoHash,
    },
    Scrape {
        #[arg(value_parser = parse_socket_addr)]
        tracker_socket_addr: SocketAddr,
        #[arg(value_parser = parse_info_hash, num_args = 1..=74, value_delimiter = ' ')]
        info_hashes: Vec<InfoHash>,
    },
}

/// # Errors
///
/// Will return an error if the command fails.
pub async fn run() -> anyhow::Result<()> {
    tracing_stdout_init(LevelFilter::INFO);

    let args = Args::parse();

    let tracker_socket_addr = match &args.command {
        Command::Announce { tracker_socket_addr, .. } | Command::Scrape { tracker_socket_addr, .. } => *tracker_socket_addr,
    };

    let mut client = new_udp_tracker_client_connected(tracker_socket_addr, args.protocol_version).await?;

    if let (Some(username), Some(password)) = (&args.username, &args.password) {
        client = client.with_credential(username, password);
    }

    let response = match args.command {
        Command::Announce { info_hash, .. } => handle_announce(&client, info_hash).await?,
        Command::Scrape { info_hashes, .. } => handle_scrape(&client, info_hashes).await?,
    };

    println!("{}", serde_json::to_string_pretty(&to_json(&response))?);

    Ok(())
}

fn tracing_stdout_init(filter: LevelFilter) {
    tracing_subscriber::fmt().with_max_level(filter).with_writer(std::io::stderr).init();
    tracing::debug!("Logging initialized");
}

async fn handle_announce(client: &UdpTrackerClient, info_hash: InfoHash) -> anyhow::Result<Response> {
    let transaction_id = TransactionId(RANDOM_TRANSACTION_ID);

    let connection_id = client.connect(transaction_id).await?;

    let port = client.udp_client.socket.local_addr()?.port();

    client
        .send(&Request::Announce(AnnounceRequest {
            connection_id,
            transaction_id,
            info_hash,
            peer_id: PeerId(*b"-qB00000000000000001"),
            bytes_downloaded: NumberOfBytes(0),
            bytes_left: NumberOfBytes(0),
            bytes_uploaded: NumberOfBytes(0),
            event: AnnounceEvent::Started,
            ip_address: None,
            key: Some(0),
            peers_wanted: 1,
            port,
        }))
        .await?;

    client.receive().await
}

async fn handle_scrape(client: &UdpTrackerClient, info_hashes: Vec<InfoHash>) -> anyhow::Result<Response> {
    let transaction_id = TransactionId(RANDOM_TRANSACTION_ID);

    let connection_id = client.connect(transaction_id).await?;

    client
        .send(&Request::Scrape(ScrapeRequest {
            connection_id,
            transaction_id,
            info_hashes,
        }))
        .await?;

    client.receive().await
}

fn to_json(response: &Response) -> Value {
    match response {
        Response::Connect(connect) => json!({
            "transaction_id": connect.transaction_id.0,
            "connection_id": connect.connection_id.0,
        }),
        Response::Announce(announce) => json!({
            "transaction_id": announce.transaction_id.0,
            "announce_interval": announce.announce_interval,
            "leechers": announce.leechers,
            "seeders": announce.seeders,
            "peers": announce.peers.iter().map(ToString::to_string).collect::<Vec<_>>(),
        }),
        Response::Scrape(scrape) => json!({
            "transaction_id": scrape.transaction_id.0,
            "torrent_stats": scrape.torrent_stats.iter().map(|(_, stats)| json!({
                "seeders": stats.complete,
                "completed": stats.downloaded,
                "leechers": stats.incomplete,
            })).collect::<Vec<_>>(),
        }),
        Response::Error(error) => json!({
            "transaction_id": error.transaction_id.0,
            "message": error.message,
        }),
    }
}
