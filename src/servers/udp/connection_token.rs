//! Single use connection tokens.
//!
//! A client has to run the connect handshake before the tracker answers its
//! announce or scrape requests. The connect reply carries a random 64 bit
//! token bound to the client IP address. The next announce or scrape consumes
//! it, whether it matches or not, so every request after the first one needs
//! a new handshake. A connect and the request that uses its token are
//! expected to come from the same IP address, the port is not checked.
//!
//! Tokens expire after the configured lifetime
//! (`CONNECTION_TOKEN_LIFETIME` by default). Expired entries are swept on the
//! next allocation, oldest first, stopping at the first live one. An expired
//! token that was not swept yet is still rejected by [`ConnectionTokenTable::consume`].
use std::collections::{HashMap, VecDeque};
use std::net::IpAddr;
use std::time::Duration;

use parking_lot::Mutex;
use rand::Rng;
use swarm_tracker_clock::clock::Time;
use swarm_tracker_primitives::DurationSinceUnixEpoch;

use crate::CurrentClock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionToken {
    pub id: u64,
    pub client: IpAddr,
    pub issued_at: DurationSinceUnixEpoch,
}

#[derive(Debug, Default)]
struct Tokens {
    by_id: HashMap<u64, ConnectionToken>,
    /// Allocation order, which is also issue time order.
    expiry: VecDeque<(u64, DurationSinceUnixEpoch)>,
}

impl Tokens {
    fn sweep(&mut self, now: DurationSinceUnixEpoch, lifetime: Duration) {
        while let Some(&(id, issued_at)) = self.expiry.front() {
            if now.saturating_sub(issued_at) <= lifetime {
                break;
            }

            self.expiry.pop_front();

            // The id may have been consumed and handed out again since.
            if self.by_id.get(&id).is_some_and(|token| token.issued_at == issued_at) {
                self.by_id.remove(&id);
            }
        }

        // Consumed tokens leave their queue entry behind.
        if self.expiry.len() > 2 * self.by_id.len() + 64 {
            self.expiry.retain(|(id, issued_at)| {
                self.by_id.get(id).is_some_and(|token| token.issued_at == *issued_at)
            });
        }
    }
}

/// The tokens issued by one UDP tracker.
#[derive(Debug)]
pub struct ConnectionTokenTable {
    lifetime: Duration,
    tokens: Mutex<Tokens>,
}

impl ConnectionTokenTable {
    #[must_use]
    pub fn new(lifetime: Duration) -> Self {
        Self {
            lifetime,
            tokens: Mutex::new(Tokens::default()),
        }
    }

    #[must_use]
    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Issues a new token for `client`, sweeping expired ones first.
    pub fn allocate(&self, client: IpAddr) -> u64 {
        let now = CurrentClock::now();
        let mut tokens = self.tokens.lock();

        tokens.sweep(now, self.lifetime);

        let mut rng = rand::thread_rng();
        let id = loop {
            let candidate: u64 = rng.gen();
            if !tokens.by_id.contains_key(&candidate) {
                break candidate;
            }
        };

        tokens.by_id.insert(
            id,
            ConnectionToken {
                id,
                client,
                issued_at: now,
            },
        );
        tokens.expiry.push_back((id, now));

        id
    }

    /// Removes the token and tells whether it was issued to `client` and is
    /// still alive.
    ///
    /// The token is gone after this call in every case.
    pub fn consume(&self, id: u64, client: IpAddr) -> bool {
        let now = CurrentClock::now();

        let Some(token) = self.tokens.lock().by_id.remove(&id) else {
            return false;
        };

        token.client == client && now.saturating_sub(token.issued_at) <= self.lifetime
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.lock().by_id.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
