//! Tracker configuration factories for testing.
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use swarm_tracker_configuration::{Configuration, Threshold};
use swarm_tracker_primitives::protocol_version::ProtocolVersion;

/// This configuration is used for testing. It generates random config values
/// so they do not collide if you run more than one tracker at the same time.
///
/// # Panics
///
/// Will panic if the default configuration has no UDP tracker.
#[must_use]
pub fn ephemeral() -> Configuration {
    let mut config = Configuration::default();

    config.logging.threshold = Threshold::Off; // Change to `debug` for tests debugging

    // Ephemeral socket address for the UDP tracker
    let udp_port = 0u16;
    config.udp_trackers[0].bind_address = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), udp_port);

    config
}

/// Ephemeral configuration with the given wire format version.
#[must_use]
pub fn ephemeral_with_protocol_version(protocol_version: ProtocolVersion) -> Configuration {
    let mut config = ephemeral();

    config.udp_trackers[0].protocol_version = protocol_version;

    config
}

/// Ephemeral configuration requiring every datagram to be signed with the
/// shared `password`.
#[must_use]
pub fn ephemeral_with_shared_password(password: &str) -> Configuration {
    let mut config = ephemeral();

    let authentication = &mut config.udp_trackers[0].authentication;
    authentication.enabled = true;
    authentication.password = password.to_string();

    config
}

/// Ephemeral configuration that resolves secrets through the bundled user
/// table.
#[must_use]
pub fn ephemeral_with_users(users: &[(&str, &str)]) -> Configuration {
    let mut config = ephemeral();

    let authentication = &mut config.udp_trackers[0].authentication;
    authentication.enabled = true;
    authentication.external_authorization = true;
    authentication.users = users
        .iter()
        .map(|(username, password)| ((*username).to_string(), (*password).to_string()))
        .collect();

    config
}
