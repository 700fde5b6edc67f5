//! Sequence numbers and the allocator that hands them out.
use std::sync::atomic::{AtomicU64, Ordering};

use derive_more::{Display, From};

/// Identifier of a logical channel multiplexed over one transport.
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug, PartialOrd, Ord, Display, From)]
pub struct ChannelId(pub u32);

/// A sequence number tagged with the channel whose message it frames.
///
/// The `value` is unique across all channels of one allocator, which lets a
/// single ack resolve messages of several channels.
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug, PartialOrd, Ord, Display)]
#[display("{value}@{channel_id}")]
pub struct SequenceNumber {
    pub value: u64,
    pub channel_id: ChannelId,
}

impl SequenceNumber {
    #[must_use]
    pub fn new(value: u64, channel_id: ChannelId) -> Self {
        Self { value, channel_id }
    }
}

/// Hands out monotonically increasing sequence numbers, starting at zero.
#[derive(Debug, Default)]
pub struct SequenceAllocator {
    next: AtomicU64,
}

impl SequenceAllocator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates the next value and tags it with `channel_id`.
    pub fn next(&self, channel_id: ChannelId) -> SequenceNumber {
        let value = self.next.fetch_add(1, Ordering::Relaxed);
        SequenceNumber::new(value, channel_id)
    }

    /// The value the next call to [`SequenceAllocator::next`] will return.
    #[must_use]
    pub fn peek(&self) -> u64 {
        self.next.load(Ordering::Relaxed)
    }
}
