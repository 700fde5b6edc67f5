//! Ack payload codec.
//!
//! An ack message names one acknowledged sequence value in its header. Its
//! payload may carry more of them, each one a big-endian `u64` record of
//! [`ACK_RECORD_LEN`] bytes.
use byteorder::{BigEndian, ByteOrder};

/// Width in bytes of each acknowledged value in an ack payload.
pub const ACK_RECORD_LEN: usize = 8;

/// The values found in an ack payload.
#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct AckRecords {
    pub values: Vec<u64>,
    /// Bytes at the end of the payload too short to form a record.
    pub trailing_bytes: usize,
}

/// Decodes every complete record of `payload`.
#[must_use]
pub fn decode_ack_payload(payload: &[u8]) -> AckRecords {
    let records = payload.chunks_exact(ACK_RECORD_LEN);
    let trailing_bytes = records.remainder().len();

    AckRecords {
        values: records.map(BigEndian::read_u64).collect(),
        trailing_bytes,
    }
}

/// Builds an ack payload carrying `values`.
#[must_use]
pub fn encode_ack_payload(values: &[u64]) -> Vec<u8> {
    let mut payload = vec![0u8; values.len() * ACK_RECORD_LEN];

    for (record, value) in payload.chunks_exact_mut(ACK_RECORD_LEN).zip(values) {
        BigEndian::write_u64(record, *value);
    }

    payload
}
