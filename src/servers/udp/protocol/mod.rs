//! Wire format of the UDP tracker.
//!
//! All integers are big-endian. Every request starts with the same 16 byte
//! header:
//!
//! Offset | Type | Name
//! -------|------|---------------
//! 0      | u64  | connection id
//! 8      | i32  | action
//! 12     | i32  | transaction id
//!
//! The body that follows depends on the action and, for announces, on the
//! [`ProtocolVersion`](swarm_tracker_primitives::protocol_version::ProtocolVersion)
//! the tracker speaks. See [`request`] and [`response`] for the layouts.
use std::panic::Location;

use derive_more::{Display, From};
use thiserror::Error;

pub mod request;
pub mod response;

/// Connection id a client must send with its connect request.
pub const PROTOCOL_ID: u64 = 0x0417_2710_1980;

/// Length of the header shared by all requests.
pub const REQUEST_HEADER_LEN: usize = 16;

/// Length of the header shared by all responses.
pub const RESPONSE_HEADER_LEN: usize = 8;

#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug, Display, From)]
pub struct TransactionId(pub i32);

#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug, Display, From)]
pub struct ConnectionId(pub u64);

#[derive(PartialEq, Eq, Clone, Copy, Debug, Display)]
pub enum Action {
    #[display("connect")]
    Connect,
    #[display("announce")]
    Announce,
    #[display("scrape")]
    Scrape,
    #[display("error")]
    Error,
}

impl Action {
    #[must_use]
    pub fn from_i32(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Connect),
            1 => Some(Self::Announce),
            2 => Some(Self::Scrape),
            3 => Some(Self::Error),
            _ => None,
        }
    }

    #[must_use]
    pub fn to_i32(self) -> i32 {
        match self {
            Self::Connect => 0,
            Self::Announce => 1,
            Self::Scrape => 2,
            Self::Error => 3,
        }
    }
}

/// Errors decoding a datagram.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("datagram ended before the {field} field, {location}")]
    Truncated {
        field: &'static str,
        location: &'static Location<'static>,
    },

    #[error("connect request with an invalid protocol id: {protocol_id:#x}")]
    InvalidProtocolId { protocol_id: u64 },

    /// The header could be read but the action is not one the tracker serves.
    #[error("unsupported action {action}")]
    UnknownAction { action: i32, transaction_id: TransactionId },

    #[error("scrape request without info hashes")]
    NoInfoHashes,
}

impl DecodeError {
    #[track_caller]
    pub(crate) fn truncated(field: &'static str) -> Self {
        Self::Truncated {
            field,
            location: Location::caller(),
        }
    }
}

/// A thin reader over a datagram that turns short reads into
/// [`DecodeError::Truncated`].
pub(crate) struct Cursor<'a> {
    bytes: &'a [u8],
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    pub(crate) fn remaining(&self) -> usize {
        self.bytes.len()
    }

    #[track_caller]
    pub(crate) fn take(&mut self, len: usize, field: &'static str) -> Result<&'a [u8], DecodeError> {
        if self.bytes.len() < len {
            return Err(DecodeError::truncated(field));
        }

        let (taken, rest) = self.bytes.split_at(len);
        self.bytes = rest;

        Ok(taken)
    }

    #[track_caller]
    pub(crate) fn array<const N: usize>(&mut self, field: &'static str) -> Result<[u8; N], DecodeError> {
        let mut array = [0u8; N];
        array.copy_from_slice(self.take(N, field)?);
        Ok(array)
    }

    #[track_caller]
    pub(crate) fn u16(&mut self, field: &'static str) -> Result<u16, DecodeError> {
        use byteorder::{BigEndian, ByteOrder};
        Ok(BigEndian::read_u16(self.take(2, field)?))
    }

    #[track_caller]
    pub(crate) fn u32(&mut self, field: &'static str) -> Result<u32, DecodeError> {
        use byteorder::{BigEndian, ByteOrder};
        Ok(BigEndian::read_u32(self.take(4, field)?))
    }

    #[track_caller]
    pub(crate) fn i32(&mut self, field: &'static str) -> Result<i32, DecodeError> {
        use byteorder::{BigEndian, ByteOrder};
        Ok(BigEndian::read_i32(self.take(4, field)?))
    }

    #[track_caller]
    pub(crate) fn u64(&mut self, field: &'static str) -> Result<u64, DecodeError> {
        use byteorder::{BigEndian, ByteOrder};
        Ok(BigEndian::read_u64(self.take(8, field)?))
    }

    #[track_caller]
    pub(crate) fn i64(&mut self, field: &'static str) -> Result<i64, DecodeError> {
        use byteorder::{BigEndian, ByteOrder};
        Ok(BigEndian::read_i64(self.take(8, field)?))
    }

    /// Everything not read yet.
    pub(crate) fn rest(self) -> &'a [u8] {
        self.bytes
    }
}
