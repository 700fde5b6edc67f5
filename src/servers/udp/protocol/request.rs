//! Requests sent by UDP tracker clients.
//!
//! Announce body, version 1 (legacy):
//!
//! Offset | Type     | Name
//! -------|----------|------------
//! 16     | [u8; 20] | info hash
//! 36     | [u8; 20] | peer id
//! 56     | i64      | downloaded
//! 64     | i32      | event
//! 68     | u32      | ip (ignored)
//! 72     | i32      | num want
//! 76     | i64      | left
//! 84     | u16      | port
//! 86     | i64      | uploaded
//!
//! Announce body, version 2 (extended):
//!
//! Offset | Type     | Name
//! -------|----------|------------
//! 16     | [u8; 20] | info hash
//! 36     | [u8; 20] | peer id
//! 56     | i64      | downloaded
//! 64     | i64      | left
//! 72     | i64      | uploaded
//! 80     | i32      | event
//! 84     | u32      | ip
//! 88     | u32      | key
//! 92     | i32      | num want
//! 96     | u16      | port
//!
//! A scrape carries one or more 20 byte info hashes after the header.
use std::io::{self, Write};
use std::net::Ipv4Addr;

use byteorder::{BigEndian, WriteBytesExt};
use swarm_tracker_configuration::MAX_SCRAPE_TORRENTS;
use swarm_tracker_primitives::announce_event::AnnounceEvent;
use swarm_tracker_primitives::info_hash::{InfoHash, INFO_HASH_BYTES_LEN};
use swarm_tracker_primitives::peer::PeerId;
use swarm_tracker_primitives::protocol_version::ProtocolVersion;
use swarm_tracker_primitives::NumberOfBytes;

use super::{Action, ConnectionId, Cursor, DecodeError, TransactionId, PROTOCOL_ID, REQUEST_HEADER_LEN};

/// The fixed part every request starts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestHeader {
    pub connection_id: ConnectionId,
    pub action: i32,
    pub transaction_id: TransactionId,
}

impl RequestHeader {
    /// # Errors
    ///
    /// Will return [`DecodeError::Truncated`] if the datagram is shorter than
    /// the header.
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut cursor = Cursor::new(bytes);

        Ok(Self {
            connection_id: ConnectionId(cursor.u64("connection id")?),
            action: cursor.i32("action")?,
            transaction_id: TransactionId(cursor.i32("transaction id")?),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Connect(ConnectRequest),
    Announce(AnnounceRequest),
    Scrape(ScrapeRequest),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectRequest {
    pub transaction_id: TransactionId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnnounceRequest {
    pub connection_id: ConnectionId,
    pub transaction_id: TransactionId,
    pub info_hash: InfoHash,
    pub peer_id: PeerId,
    pub bytes_downloaded: NumberOfBytes,
    pub bytes_left: NumberOfBytes,
    pub bytes_uploaded: NumberOfBytes,
    pub event: AnnounceEvent,
    /// Only honoured by the extended version, `None` when the client sent zero.
    pub ip_address: Option<Ipv4Addr>,
    /// Only present in the extended version.
    pub key: Option<u32>,
    pub peers_wanted: i32,
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeRequest {
    pub connection_id: ConnectionId,
    pub transaction_id: TransactionId,
    pub info_hashes: Vec<InfoHash>,
}

impl Request {
    #[must_use]
    pub fn transaction_id(&self) -> TransactionId {
        match self {
            Request::Connect(request) => request.transaction_id,
            Request::Announce(request) => request.transaction_id,
            Request::Scrape(request) => request.transaction_id,
        }
    }

    /// Decodes a whole request, header included.
    ///
    /// Bytes after a complete body are ignored.
    ///
    /// # Errors
    ///
    /// Will return a [`DecodeError`] if the datagram is too short for its
    /// action, the action is unknown, a connect carries the wrong protocol id
    /// or a scrape names no info hash.
    pub fn decode(bytes: &[u8], version: ProtocolVersion) -> Result<Self, DecodeError> {
        let header = RequestHeader::decode(bytes)?;
        let mut body = Cursor::new(&bytes[REQUEST_HEADER_LEN..]);

        match Action::from_i32(header.action) {
            Some(Action::Connect) => {
                if header.connection_id.0 != PROTOCOL_ID {
                    return Err(DecodeError::InvalidProtocolId {
                        protocol_id: header.connection_id.0,
                    });
                }

                Ok(Request::Connect(ConnectRequest {
                    transaction_id: header.transaction_id,
                }))
            }
            Some(Action::Announce) => {
                let announce = match version {
                    ProtocolVersion::V1 => decode_legacy_announce(&header, &mut body)?,
                    ProtocolVersion::V2 => decode_extended_announce(&header, &mut body)?,
                };

                Ok(Request::Announce(announce))
            }
            Some(Action::Scrape) => Ok(Request::Scrape(decode_scrape(&header, body)?)),
            Some(Action::Error) | None => Err(DecodeError::UnknownAction {
                action: header.action,
                transaction_id: header.transaction_id,
            }),
        }
    }

    /// Writes the request as a client would send it.
    ///
    /// # Errors
    ///
    /// Will return an error if the writer fails.
    pub fn write_bytes(&self, version: ProtocolVersion, bytes: &mut impl Write) -> Result<(), io::Error> {
        match self {
            Request::Connect(request) => {
                bytes.write_u64::<BigEndian>(PROTOCOL_ID)?;
                bytes.write_i32::<BigEndian>(Action::Connect.to_i32())?;
                bytes.write_i32::<BigEndian>(request.transaction_id.0)?;
            }
            Request::Announce(request) => {
                bytes.write_u64::<BigEndian>(request.connection_id.0)?;
                bytes.write_i32::<BigEndian>(Action::Announce.to_i32())?;
                bytes.write_i32::<BigEndian>(request.transaction_id.0)?;
                bytes.write_all(&request.info_hash.0)?;
                bytes.write_all(&request.peer_id.0)?;

                let ip = request.ip_address.map_or(0, u32::from);

                match version {
                    ProtocolVersion::V1 => {
                        bytes.write_i64::<BigEndian>(request.bytes_downloaded.0)?;
                        bytes.write_i32::<BigEndian>(request.event.to_i32())?;
                        bytes.write_u32::<BigEndian>(ip)?;
                        bytes.write_i32::<BigEndian>(request.peers_wanted)?;
                        bytes.write_i64::<BigEndian>(request.bytes_left.0)?;
                        bytes.write_u16::<BigEndian>(request.port)?;
                        bytes.write_i64::<BigEndian>(request.bytes_uploaded.0)?;
                    }
                    ProtocolVersion::V2 => {
                        bytes.write_i64::<BigEndian>(request.bytes_downloaded.0)?;
                        bytes.write_i64::<BigEndian>(request.bytes_left.0)?;
                        bytes.write_i64::<BigEndian>(request.bytes_uploaded.0)?;
                        bytes.write_i32::<BigEndian>(request.event.to_i32())?;
                        bytes.write_u32::<BigEndian>(ip)?;
                        bytes.write_u32::<BigEndian>(request.key.unwrap_or_default())?;
                        bytes.write_i32::<BigEndian>(request.peers_wanted)?;
                        bytes.write_u16::<BigEndian>(request.port)?;
                    }
                }
            }
            Request::Scrape(request) => {
                bytes.write_u64::<BigEndian>(request.connection_id.0)?;
                bytes.write_i32::<BigEndian>(Action::Scrape.to_i32())?;
                bytes.write_i32::<BigEndian>(request.transaction_id.0)?;

                for info_hash in &request.info_hashes {
                    bytes.write_all(&info_hash.0)?;
                }
            }
        }

        Ok(())
    }
}

fn decode_legacy_announce(header: &RequestHeader, body: &mut Cursor<'_>) -> Result<AnnounceRequest, DecodeError> {
    let info_hash = InfoHash(body.array("info hash")?);
    let peer_id = PeerId(body.array("peer id")?);
    let bytes_downloaded = NumberOfBytes(body.i64("downloaded")?);
    let event = AnnounceEvent::from_i32(body.i32("event")?);
    let _ip = body.u32("ip")?;
    let peers_wanted = body.i32("num want")?;
    let bytes_left = NumberOfBytes(body.i64("left")?);
    let port = body.u16("port")?;
    let bytes_uploaded = NumberOfBytes(body.i64("uploaded")?);

    Ok(AnnounceRequest {
        connection_id: header.connection_id,
        transaction_id: header.transaction_id,
        info_hash,
        peer_id,
        bytes_downloaded,
        bytes_left,
        bytes_uploaded,
        event,
        ip_address: None,
        key: None,
        peers_wanted,
        port,
    })
}

fn decode_extended_announce(header: &RequestHeader, body: &mut Cursor<'_>) -> Result<AnnounceRequest, DecodeError> {
    let info_hash = InfoHash(body.array("info hash")?);
    let peer_id = PeerId(body.array("peer id")?);
    let bytes_downloaded = NumberOfBytes(body.i64("downloaded")?);
    let bytes_left = NumberOfBytes(body.i64("left")?);
    let bytes_uploaded = NumberOfBytes(body.i64("uploaded")?);
    let event = AnnounceEvent::from_i32(body.i32("event")?);
    let ip = body.u32("ip")?;
    let key = body.u32("key")?;
    let peers_wanted = body.i32("num want")?;
    let port = body.u16("port")?;

    Ok(AnnounceRequest {
        connection_id: header.connection_id,
        transaction_id: header.transaction_id,
        info_hash,
        peer_id,
        bytes_downloaded,
        bytes_left,
        bytes_uploaded,
        event,
        ip_address: (ip != 0).then(|| Ipv4Addr::from(ip)),
        key: Some(key),
        peers_wanted,
        port,
    })
}

fn decode_scrape(header: &RequestHeader, body: Cursor<'_>) -> Result<ScrapeRequest, DecodeError> {
    let info_hashes: Vec<InfoHash> = body
        .rest()
        .chunks_exact(INFO_HASH_BYTES_LEN)
        .take(MAX_SCRAPE_TORRENTS)
        .filter_map(|chunk| InfoHash::try_from(chunk).ok())
        .collect();

    if info_hashes.is_empty() {
        return Err(DecodeError::NoInfoHashes);
    }

    Ok(ScrapeRequest {
        connection_id: header.connection_id,
        transaction_id: header.transaction_id,
        info_hashes,
    })
}
