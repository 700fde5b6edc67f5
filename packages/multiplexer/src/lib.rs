//! Reliable delivery bookkeeping for channels multiplexed over one transport.
//!
//! Before a message goes out on a channel, the sender asks the
//! [`MessageStreamMultiplexer`] for a [`SequenceNumber`] and frames the
//! message with it. The multiplexer keeps the number as *outstanding* until
//! the remote side acknowledges it. Acks name one value in their header and
//! optionally more in their payload (see [`ack`]). For every acknowledged
//! value still outstanding, the owning [`ChannelEndpoint`] is asked to drop
//! its buffered copy. Only when it agrees does the number stop being
//! outstanding.
//!
//! Outstanding numbers are indexed twice: by value, to match acks, and by
//! channel, to answer what a retransmission driver must resend. Both indexes
//! change together under one lock.
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use swarm_tracker_multiplexer::{ChannelEndpoint, ChannelId, MessageStreamMultiplexer, SequenceNumber};
//!
//! struct Forgetful(ChannelId);
//!
//! impl ChannelEndpoint for Forgetful {
//!     fn channel_id(&self) -> ChannelId {
//!         self.0
//!     }
//!
//!     fn forget_message(&self, _sequence: &SequenceNumber) -> bool {
//!         true
//!     }
//!
//!     fn buffered_payload(&self, _sequence: &SequenceNumber) -> Option<Vec<u8>> {
//!         None
//!     }
//! }
//!
//! let multiplexer = MessageStreamMultiplexer::default();
//! multiplexer.register_channel(Arc::new(Forgetful(ChannelId(1)))).unwrap();
//!
//! let sequence = multiplexer.next_sequence(ChannelId(1)).unwrap();
//! assert!(multiplexer.has_outstanding(ChannelId(1)));
//!
//! multiplexer.on_ack(sequence.value, &[]);
//! assert!(!multiplexer.has_outstanding(ChannelId(1)));
//! ```
pub mod ack;
pub mod sequence;

use std::collections::{BTreeSet, HashMap};
use std::panic::Location;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

pub use crate::ack::{decode_ack_payload, encode_ack_payload, ACK_RECORD_LEN};
pub use crate::sequence::{ChannelId, SequenceAllocator, SequenceNumber};

pub const MULTIPLEXER_LOG_TARGET: &str = "MESSAGE MULTIPLEXER";

/// The transport side of a channel.
///
/// Implementations are called while the multiplexer holds its lock, so they
/// must not call back into the multiplexer.
#[cfg_attr(test, mockall::automock)]
pub trait ChannelEndpoint: Send + Sync {
    fn channel_id(&self) -> ChannelId;

    /// Drops the buffered copy of an acknowledged message. Returns `false`
    /// if the endpoint still needs it, in which case the number stays
    /// outstanding.
    fn forget_message(&self, sequence: &SequenceNumber) -> bool;

    /// The buffered copy of an outstanding message, if the endpoint still has
    /// it.
    fn buffered_payload(&self, sequence: &SequenceNumber) -> Option<Vec<u8>>;
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("channel {channel_id} is already registered, {location}")]
    ChannelAlreadyRegistered {
        channel_id: ChannelId,
        location: &'static Location<'static>,
    },

    #[error("channel {channel_id} is not registered, {location}")]
    ChannelNotRegistered {
        channel_id: ChannelId,
        location: &'static Location<'static>,
    },
}

/// What an ack changed.
#[derive(Debug, Default, PartialEq, Eq, Clone)]
pub struct AckOutcome {
    /// Numbers that stopped being outstanding.
    pub forgotten: Vec<SequenceNumber>,
    /// Outstanding numbers whose endpoint refused to forget them.
    pub retained: Vec<SequenceNumber>,
    /// Acknowledged values that matched nothing outstanding.
    pub non_outstanding: Vec<u64>,
}

#[derive(Default)]
struct Channels {
    endpoints: HashMap<ChannelId, Arc<dyn ChannelEndpoint>>,
    outstanding: HashMap<u64, SequenceNumber>,
    outstanding_by_channel: HashMap<ChannelId, BTreeSet<u64>>,
}

impl Channels {
    fn forget(&mut self, sequence: &SequenceNumber) {
        self.outstanding.remove(&sequence.value);

        if let Some(values) = self.outstanding_by_channel.get_mut(&sequence.channel_id) {
            values.remove(&sequence.value);
            if values.is_empty() {
                self.outstanding_by_channel.remove(&sequence.channel_id);
            }
        }
    }
}

/// Sequence allocation and ack reconciliation for a set of channels.
#[derive(Default)]
pub struct MessageStreamMultiplexer {
    allocator: SequenceAllocator,
    channels: Mutex<Channels>,
    non_outstanding_acks: AtomicU64,
}

impl MessageStreamMultiplexer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a channel, keyed by the endpoint's own channel id.
    ///
    /// # Errors
    ///
    /// Will return `Error::ChannelAlreadyRegistered` if a channel with the
    /// same id is registered.
    #[track_caller]
    pub fn register_channel(&self, endpoint: Arc<dyn ChannelEndpoint>) -> Result<(), Error> {
        let channel_id = endpoint.channel_id();
        let mut channels = self.channels.lock();

        if channels.endpoints.contains_key(&channel_id) {
            return Err(Error::ChannelAlreadyRegistered {
                channel_id,
                location: Location::caller(),
            });
        }

        channels.endpoints.insert(channel_id, endpoint);

        Ok(())
    }

    /// Allocates the sequence number for the next message sent on a channel
    /// and records it as outstanding.
    ///
    /// # Errors
    ///
    /// Will return `Error::ChannelNotRegistered` if the channel is unknown.
    #[track_caller]
    pub fn next_sequence(&self, channel_id: ChannelId) -> Result<SequenceNumber, Error> {
        let mut channels = self.channels.lock();

        if !channels.endpoints.contains_key(&channel_id) {
            return Err(Error::ChannelNotRegistered {
                channel_id,
                location: Location::caller(),
            });
        }

        let sequence = self.allocator.next(channel_id);

        channels.outstanding.insert(sequence.value, sequence);
        channels
            .outstanding_by_channel
            .entry(channel_id)
            .or_default()
            .insert(sequence.value);

        Ok(sequence)
    }

    /// Processes an ack naming `primary` in its header and possibly more
    /// values in `payload`.
    pub fn on_ack(&self, primary: u64, payload: &[u8]) -> AckOutcome {
        let records = decode_ack_payload(payload);

        if records.trailing_bytes > 0 {
            tracing::debug!(
                target: MULTIPLEXER_LOG_TARGET,
                trailing_bytes = records.trailing_bytes,
                "ack payload ends with an incomplete record"
            );
        }

        let acked: BTreeSet<u64> = std::iter::once(primary).chain(records.values).collect();

        let mut outcome = AckOutcome::default();
        let mut channels = self.channels.lock();

        for value in acked {
            let Some(sequence) = channels.outstanding.get(&value).copied() else {
                outcome.non_outstanding.push(value);
                continue;
            };

            let forgotten = channels
                .endpoints
                .get(&sequence.channel_id)
                .is_some_and(|endpoint| endpoint.forget_message(&sequence));

            if forgotten {
                channels.forget(&sequence);
                outcome.forgotten.push(sequence);
            } else {
                outcome.retained.push(sequence);
            }
        }

        drop(channels);

        for value in &outcome.non_outstanding {
            self.non_outstanding_acks.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(target: MULTIPLEXER_LOG_TARGET, value, "non outstanding message acked");
        }

        outcome
    }

    #[must_use]
    pub fn has_outstanding(&self, channel_id: ChannelId) -> bool {
        self.channels.lock().outstanding_by_channel.contains_key(&channel_id)
    }

    #[must_use]
    pub fn outstanding_count(&self, channel_id: ChannelId) -> usize {
        self.channels
            .lock()
            .outstanding_by_channel
            .get(&channel_id)
            .map_or(0, BTreeSet::len)
    }

    /// Outstanding numbers of a channel, oldest first.
    #[must_use]
    pub fn outstanding_sequences(&self, channel_id: ChannelId) -> Vec<SequenceNumber> {
        self.channels
            .lock()
            .outstanding_by_channel
            .get(&channel_id)
            .map(|values| values.iter().map(|value| SequenceNumber::new(*value, channel_id)).collect())
            .unwrap_or_default()
    }

    /// Buffered copies of the outstanding messages of a channel, oldest
    /// first. Numbers the endpoint no longer buffers are skipped.
    #[must_use]
    pub fn outstanding_payloads(&self, channel_id: ChannelId) -> Vec<Vec<u8>> {
        let channels = self.channels.lock();

        let (Some(endpoint), Some(values)) = (
            channels.endpoints.get(&channel_id),
            channels.outstanding_by_channel.get(&channel_id),
        ) else {
            return vec![];
        };

        values
            .iter()
            .filter_map(|value| endpoint.buffered_payload(&SequenceNumber::new(*value, channel_id)))
            .collect()
    }

    /// Deregisters a channel and drops all its outstanding numbers.
    ///
    /// # Errors
    ///
    /// Will return `Error::ChannelNotRegistered` if the channel is unknown.
    #[track_caller]
    pub fn remove_channel(&self, channel_id: ChannelId) -> Result<(), Error> {
        let mut channels = self.channels.lock();

        if channels.endpoints.remove(&channel_id).is_none() {
            return Err(Error::ChannelNotRegistered {
                channel_id,
                location: Location::caller(),
            });
        }

        if let Some(values) = channels.outstanding_by_channel.remove(&channel_id) {
            for value in values {
                channels.outstanding.remove(&value);
            }
        }

        Ok(())
    }

    /// Number of acknowledged values that matched nothing outstanding.
    #[must_use]
    pub fn non_outstanding_acks(&self) -> u64 {
        self.non_outstanding_acks.load(Ordering::Relaxed)
    }
}
