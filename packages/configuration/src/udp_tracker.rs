use std::collections::BTreeMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationSeconds};
use swarm_tracker_primitives::protocol_version::ProtocolVersion;

use crate::CONNECTION_TOKEN_LIFETIME;

#[serde_as]
#[derive(Serialize, Deserialize, PartialEq, Eq, Debug, Clone)]
pub struct UdpTracker {
    /// The address the tracker will bind to.
    /// The format is `ip:port`, for example `0.0.0.0:6969`. If you want the
    /// operating system to choose a random port, use port `0`.
    #[serde(default = "UdpTracker::default_bind_address")]
    pub bind_address: SocketAddr,

    /// Wire format served on this socket: `1` (legacy) or `2` (extended).
    #[serde(default = "UdpTracker::default_protocol_version")]
    pub protocol_version: ProtocolVersion,

    /// Seconds a connection id stays valid after the connect handshake.
    #[serde_as(as = "DurationSeconds<u64>")]
    #[serde(default = "UdpTracker::default_connection_token_lifetime")]
    pub connection_token_lifetime: Duration,

    /// Upper bound of datagrams processed at the same time.
    #[serde(default = "UdpTracker::default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,

    #[serde(default = "UdpTracker::default_authentication")]
    pub authentication: Authentication,
}

impl Default for UdpTracker {
    fn default() -> Self {
        Self {
            bind_address: Self::default_bind_address(),
            protocol_version: Self::default_protocol_version(),
            connection_token_lifetime: Self::default_connection_token_lifetime(),
            max_concurrent_requests: Self::default_max_concurrent_requests(),
            authentication: Self::default_authentication(),
        }
    }
}

impl UdpTracker {
    fn default_bind_address() -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)), 6969)
    }

    fn default_protocol_version() -> ProtocolVersion {
        ProtocolVersion::default()
    }

    fn default_connection_token_lifetime() -> Duration {
        CONNECTION_TOKEN_LIFETIME
    }

    fn default_max_concurrent_requests() -> usize {
        50
    }

    fn default_authentication() -> Authentication {
        Authentication::default()
    }
}

/// Per-request authentication of the UDP tracker.
///
/// When enabled every datagram must end with a 16 byte trailer: the user name
/// padded with zeros to 8 bytes and the first 8 bytes of a SHA-1 digest. The
/// secret mixed into the digest is the SHA-1 of `password`, or, with
/// `external_authorization`, whatever the authorization provider returns for
/// the presented user name.
#[serde_as]
#[derive(Serialize, Deserialize, PartialEq, Eq, Debug, Clone)]
pub struct Authentication {
    #[serde(default = "Authentication::default_enabled")]
    pub enabled: bool,

    /// Shared password, used when `external_authorization` is off.
    #[serde(default = "Authentication::default_password")]
    pub password: String,

    #[serde(default = "Authentication::default_external_authorization")]
    pub external_authorization: bool,

    /// Seconds to wait for the authorization provider before denying access.
    #[serde_as(as = "DurationSeconds<u64>")]
    #[serde(default = "Authentication::default_authorization_timeout")]
    pub authorization_timeout: Duration,

    /// User name to password table of the bundled authorization provider.
    #[serde(default = "Authentication::default_users")]
    pub users: BTreeMap<String, String>,
}

impl Default for Authentication {
    fn default() -> Self {
        Self {
            enabled: Self::default_enabled(),
            password: Self::default_password(),
            external_authorization: Self::default_external_authorization(),
            authorization_timeout: Self::default_authorization_timeout(),
            users: Self::default_users(),
        }
    }
}

impl Authentication {
    fn default_enabled() -> bool {
        false
    }

    fn default_password() -> String {
        String::new()
    }

    fn default_external_authorization() -> bool {
        false
    }

    fn default_authorization_timeout() -> Duration {
        Duration::from_secs(5)
    }

    fn default_users() -> BTreeMap<String, String> {
        BTreeMap::new()
    }
}
