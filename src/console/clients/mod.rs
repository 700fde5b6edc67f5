//! Console clients.
use std::net::{SocketAddr, ToSocketAddrs as _};

use anyhow::Context as _;
use swarm_tracker_primitives::info_hash::InfoHash;
use swarm_tracker_primitives::protocol_version::ProtocolVersion;
use tracing::debug;
use url::Url;

pub mod udp;

fn parse_info_hash(info_hash: &str) -> anyhow::Result<InfoHash> {
    info_hash
        .parse()
        .map_err(|e| anyhow::Error::msg(format!("failed to parse info-hash `{info_hash}`: {e:?}")))
}

fn parse_protocol_version(version: &str) -> anyhow::Result<ProtocolVersion> {
    match version {
        "1" => Ok(ProtocolVersion::V1),
        "2" => Ok(ProtocolVersion::V2),
        other => Err(anyhow::anyhow!("unknown protocol version `{other}`, expected `1` or `2`")),
    }
}

/// Accepts `host:port` or a `udp://host:port[/path]` URL and resolves it.
fn parse_socket_addr(addr: &str) -> anyhow::Result<SocketAddr> {
    debug!("Tracker socket address: {addr:#?}");

    let resolved_addr = if let Ok(url) = Url::parse(addr) {
        let host = url
            .host_str()
            .with_context(|| format!("invalid host in URL: `{addr}`"))?
            .trim_start_matches('[')
            .trim_end_matches(']')
            .to_owned();

        let port = url.port().with_context(|| format!("port not found in URL: `{addr}`"))?;

        (host, port)
    } else {
        let (host, port) = addr
            .rsplit_once(':')
            .with_context(|| format!("invalid address format: `{addr}`. Expected format is host:port"))?;

        let port = port.parse::<u16>().with_context(|| format!("invalid port: `{port}`"))?;

        (host.to_owned(), port)
    };

    debug!("Resolved address: {resolved_addr:#?}");

    resolved_addr
        .to_socket_addrs()?
        .next()
        .with_context(|| format!("DNS resolution failed for `{addr}`"))
}
