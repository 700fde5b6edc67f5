//! Module to handle the UDP server instances.
//!
//! A [`Server`] is a state machine. It starts in the [`Stopped`](states::Stopped)
//! state, holding the [`Spawner`](spawner::Spawner) that knows where to bind,
//! and goes to the [`Running`](states::Running) state once the socket is bound.
//! Stopping a running server gives the spawner back, so the same server can be
//! started again on the same address.
use std::net::SocketAddr;

use thiserror::Error;

pub mod bound_socket;
pub mod launcher;
pub mod processor;
pub mod receiver;
pub mod spawner;
pub mod states;

/// Error that can occur when starting or stopping the UDP server.
#[derive(Error, Debug)]
pub enum UdpError {
    #[error("could not bind the UDP socket to {bind_to}: {source}")]
    Bind { bind_to: SocketAddr, source: std::io::Error },

    #[error("binding the UDP socket to {bind_to} took too long")]
    BindTimeout { bind_to: SocketAddr },

    #[error("the UDP service for {bind_to} ended before reporting it started")]
    NotStarted { bind_to: SocketAddr },

    #[error("the UDP service bound to {binding} is no longer listening for the halt signal")]
    Halt { binding: SocketAddr },

    #[error("the UDP service task failed: {source}")]
    Task { source: tokio::task::JoinError },
}

/// A UDP server.
///
/// Configurations cannot be changed. This struct represents concrete
/// configuration and state. It allows to start and stop the server but always
/// keeping the same configuration.
#[allow(clippy::module_name_repetitions)]
pub struct Server<S> {
    /// The state of the server: `running` or `stopped`.
    pub state: S,
}
