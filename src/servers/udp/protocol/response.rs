//! Replies sent by the UDP tracker.
//!
//! Every reply starts with the action (`i32`) and the transaction id (`i32`)
//! of the request it answers. Announce and scrape replies differ between
//! the two protocol versions:
//!
//! - version 1 announce: `interval`, then the peers.
//! - version 2 announce: `interval`, `leechers`, `seeders`, then the peers.
//! - version 1 scrape: `info hash`, `seeders`, `completed`, `leechers` per torrent.
//! - version 2 scrape: `seeders`, `completed`, `leechers` per torrent.
//!
//! Peers are written as a 4 byte IPv4 or 16 byte IPv6 address followed by
//! the port, only for peers in the same address family as the requester.
use std::io::{self, Write};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use byteorder::{BigEndian, WriteBytesExt};
use swarm_tracker_primitives::info_hash::InfoHash;
use swarm_tracker_primitives::protocol_version::ProtocolVersion;
use swarm_tracker_primitives::swarm_metadata::SwarmMetadata;

use super::{Action, ConnectionId, Cursor, DecodeError, TransactionId};

/// Which address family the peer list of an announce reply is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressFamily {
    Ipv4,
    Ipv6,
}

impl AddressFamily {
    #[must_use]
    pub fn of(address: &SocketAddr) -> Self {
        if address.is_ipv4() {
            Self::Ipv4
        } else {
            Self::Ipv6
        }
    }

    fn address_len(self) -> usize {
        match self {
            Self::Ipv4 => 4,
            Self::Ipv6 => 16,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Connect(ConnectResponse),
    Announce(AnnounceResponse),
    Scrape(ScrapeResponse),
    Error(ErrorResponse),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectResponse {
    pub transaction_id: TransactionId,
    pub connection_id: ConnectionId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnounceResponse {
    pub transaction_id: TransactionId,
    pub announce_interval: i32,
    /// Only sent by the extended version.
    pub leechers: i32,
    /// Only sent by the extended version.
    pub seeders: i32,
    pub peers: Vec<SocketAddr>,
    /// Family of the requester, peers of the other family are left out.
    pub family: AddressFamily,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeResponse {
    pub transaction_id: TransactionId,
    /// Stats in the same order as the info hashes of the request.
    pub torrent_stats: Vec<(InfoHash, SwarmMetadata)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorResponse {
    pub transaction_id: TransactionId,
    pub message: String,
}

impl Response {
    #[must_use]
    pub fn transaction_id(&self) -> TransactionId {
        match self {
            Response::Connect(response) => response.transaction_id,
            Response::Announce(response) => response.transaction_id,
            Response::Scrape(response) => response.transaction_id,
            Response::Error(response) => response.transaction_id,
        }
    }

    #[must_use]
    pub fn action(&self) -> Action {
        match self {
            Response::Connect(_) => Action::Connect,
            Response::Announce(_) => Action::Announce,
            Response::Scrape(_) => Action::Scrape,
            Response::Error(_) => Action::Error,
        }
    }

    /// # Errors
    ///
    /// Will return an error if the writer fails.
    pub fn write_bytes(&self, version: ProtocolVersion, bytes: &mut impl Write) -> Result<(), io::Error> {
        bytes.write_i32::<BigEndian>(self.action().to_i32())?;
        bytes.write_i32::<BigEndian>(self.transaction_id().0)?;

        match self {
            Response::Connect(response) => {
                bytes.write_u64::<BigEndian>(response.connection_id.0)?;
            }
            Response::Announce(response) => {
                bytes.write_i32::<BigEndian>(response.announce_interval)?;

                if version.is_extended() {
                    bytes.write_i32::<BigEndian>(response.leechers)?;
                    bytes.write_i32::<BigEndian>(response.seeders)?;
                }

                for peer in &response.peers {
                    match (response.family, peer.ip()) {
                        (AddressFamily::Ipv4, IpAddr::V4(ip)) => bytes.write_all(&ip.octets())?,
                        (AddressFamily::Ipv6, IpAddr::V6(ip)) => bytes.write_all(&ip.octets())?,
                        _ => continue,
                    }
                    bytes.write_u16::<BigEndian>(peer.port())?;
                }
            }
            Response::Scrape(response) => {
                for (info_hash, stats) in &response.torrent_stats {
                    if !version.is_extended() {
                        bytes.write_all(&info_hash.0)?;
                    }
                    bytes.write_i32::<BigEndian>(saturating_i32(stats.complete))?;
                    bytes.write_i32::<BigEndian>(saturating_i32(stats.downloaded))?;
                    bytes.write_i32::<BigEndian>(saturating_i32(stats.incomplete))?;
                }
            }
            Response::Error(response) => {
                bytes.write_all(response.message.as_bytes())?;
            }
        }

        Ok(())
    }

    /// Parses a reply as a client receives it.
    ///
    /// The peer family of an announce reply cannot be told from the bytes,
    /// the caller passes the family of the address it sent the request from.
    /// Version 2 scrape replies carry no info hashes, they are left zeroed.
    ///
    /// # Errors
    ///
    /// Will return a [`DecodeError`] if the reply is truncated or has an
    /// unknown action.
    pub fn parse(bytes: &[u8], version: ProtocolVersion, family: AddressFamily) -> Result<Self, DecodeError> {
        let mut cursor = Cursor::new(bytes);

        let action = cursor.i32("action")?;
        let transaction_id = TransactionId(cursor.i32("transaction id")?);

        match Action::from_i32(action) {
            Some(Action::Connect) => Ok(Response::Connect(ConnectResponse {
                transaction_id,
                connection_id: ConnectionId(cursor.u64("connection id")?),
            })),
            Some(Action::Announce) => {
                let announce_interval = cursor.i32("interval")?;
                let (leechers, seeders) = if version.is_extended() {
                    (cursor.i32("leechers")?, cursor.i32("seeders")?)
                } else {
                    (0, 0)
                };

                let mut peers = Vec::new();
                while cursor.remaining() >= family.address_len() + 2 {
                    let ip = match family {
                        AddressFamily::Ipv4 => IpAddr::V4(Ipv4Addr::from(cursor.array::<4>("peer ip")?)),
                        AddressFamily::Ipv6 => IpAddr::V6(Ipv6Addr::from(cursor.array::<16>("peer ip")?)),
                    };
                    peers.push(SocketAddr::new(ip, cursor.u16("peer port")?));
                }

                Ok(Response::Announce(AnnounceResponse {
                    transaction_id,
                    announce_interval,
                    leechers,
                    seeders,
                    peers,
                    family,
                }))
            }
            Some(Action::Scrape) => {
                let mut torrent_stats = Vec::new();
                let entry_len = if version.is_extended() { 12 } else { 32 };

                while cursor.remaining() >= entry_len {
                    let info_hash = if version.is_extended() {
                        InfoHash::default()
                    } else {
                        InfoHash(cursor.array("info hash")?)
                    };
                    let complete = cursor.u32("seeders")?;
                    let downloaded = cursor.u32("completed")?;
                    let incomplete = cursor.u32("leechers")?;

                    torrent_stats.push((info_hash, SwarmMetadata::new(downloaded, complete, incomplete)));
                }

                Ok(Response::Scrape(ScrapeResponse {
                    transaction_id,
                    torrent_stats,
                }))
            }
            Some(Action::Error) => Ok(Response::Error(ErrorResponse {
                transaction_id,
                message: String::from_utf8_lossy(cursor.rest()).into_owned(),
            })),
            None => Err(DecodeError::UnknownAction { action, transaction_id }),
        }
    }

    /// The reply as it goes on the wire.
    ///
    /// # Errors
    ///
    /// Will return an error if the reply cannot be written, which for an
    /// in-memory buffer only happens on allocation failure.
    pub fn to_bytes(&self, version: ProtocolVersion) -> Result<Vec<u8>, io::Error> {
        let mut bytes = Vec::with_capacity(64);
        self.write_bytes(version, &mut bytes)?;
        Ok(bytes)
    }
}

fn saturating_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}
