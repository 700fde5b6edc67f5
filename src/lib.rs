//! **Swarm Tracker** is a UDP `BitTorrent` tracker endpoint.
//!
//! - [Features](#features)
//! - [Services](#services)
//! - [Configuration](#configuration)
//! - [Usage](#usage)
//! - [Components](#components)
//!
//! # Features
//!
//! - One or more UDP trackers, each on its own socket.
//! - Two wire formats: the legacy layout and the extended layout of
//!   [BEP 15](https://www.bittorrent.org/beps/bep_0015.html).
//! - Optional per-datagram authentication with a shared password or secrets
//!   resolved by an external authorizer.
//! - Single use connection ids bound to the client IP address.
//! - In-memory swarms with periodic cleanup of inactive peers.
//! - Usage statistics.
//!
//! The workspace also contains the `swarm-tracker-multiplexer` package, a
//! message multiplexer that keeps the outstanding messages of every logical
//! channel until they are acknowledged.
//!
//! # Services
//!
//! ```text
//!                       +----------------+
//! datagram ------------>|  UDP tracker   |----+
//!                       +----------------+    |     +---------------+     +-----------------+
//!                       +----------------+    +---->| core::Tracker |---->| PeerRegistry    |
//! datagram ------------>|  UDP tracker   |----+     +---------------+     | (in-memory)     |
//!                       +----------------+                                +-----------------+
//! ```
//!
//! # Configuration
//!
//! The configuration is loaded from `./share/default/config/tracker.toml`
//! unless the `SWARM_TRACKER_CONFIG_TOML` or `SWARM_TRACKER_CONFIG_TOML_PATH`
//! environment variables are set. See the `swarm-tracker-configuration`
//! package for all the options.
//!
//! # Usage
//!
//! ```text
//! cargo run
//! ```
//!
//! The UDP client can be used to send requests to a running tracker:
//!
//! ```text
//! cargo run --bin udp_tracker_client announce 127.0.0.1:6969 9c38422213e30bff212b30c360d26f9a02136422
//! ```
//!
//! # Components
//!
//! - [`core`]: the tracker domain, independent of the delivery layer.
//! - [`servers::udp`]: the UDP server, the request dispatcher and the codec.
//! - [`bootstrap`] and [`app`]: building the application and starting its jobs.
//! - [`console`]: console clients.
use swarm_tracker_clock::clock;

pub mod app;
pub mod bootstrap;
pub mod console;
pub mod core;
pub mod servers;

/// This code needs to be copied into each crate.
/// Working version, for production.
#[cfg(not(test))]
#[allow(dead_code)]
pub(crate) type CurrentClock = clock::Working;

/// Stopped version, for testing.
#[cfg(test)]
#[allow(dead_code)]
pub(crate) type CurrentClock = clock::Stopped;
