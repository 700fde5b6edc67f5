//! Error types for the UDP server.
use std::net::IpAddr;
use std::panic::Location;

use swarm_tracker_located_error::LocatedError;
use thiserror::Error;

use super::protocol::{ConnectionId, DecodeError, TransactionId};
use crate::core::auth;

/// Message of the error reply sent when authentication fails.
pub const ACCESS_DENIED: &str = "Access Denied";

/// Message of the error reply sent for an unknown action.
pub const UNSUPPORTED_ACTION: &str = "unsupported action";

#[derive(Error, Debug)]
pub enum Error {
    #[error("malformed request: {source}")]
    MalformedInput { source: DecodeError },

    #[error("missing credential: {source}")]
    MissingCredential { source: auth::Error },

    #[error("{source}")]
    AccessDenied {
        transaction_id: TransactionId,
        source: auth::Error,
    },

    #[error("unsupported action {action}")]
    UnknownAction { action: i32, transaction_id: TransactionId },

    #[error("connection id {connection_id} rejected for {client}, {location}")]
    TokenRejected {
        connection_id: ConnectionId,
        client: IpAddr,
        location: &'static Location<'static>,
    },

    #[error("tracker error: {source}")]
    HandlerFailure {
        transaction_id: TransactionId,
        source: LocatedError<'static, dyn std::error::Error + Send + Sync>,
    },
}

/// What the server does with a request that failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// No reply is sent.
    Drop,
    /// An error reply with `message` is sent.
    Reply {
        transaction_id: TransactionId,
        message: String,
    },
}

impl Error {
    #[must_use]
    pub fn disposition(&self) -> Disposition {
        match self {
            Error::MalformedInput { .. } | Error::MissingCredential { .. } | Error::TokenRejected { .. } => Disposition::Drop,
            Error::AccessDenied { transaction_id, .. } => Disposition::Reply {
                transaction_id: *transaction_id,
                message: ACCESS_DENIED.to_string(),
            },
            Error::UnknownAction { transaction_id, .. } => Disposition::Reply {
                transaction_id: *transaction_id,
                message: UNSUPPORTED_ACTION.to_string(),
            },
            Error::HandlerFailure { transaction_id, source } => Disposition::Reply {
                transaction_id: *transaction_id,
                message: source.source_description(),
            },
        }
    }
}
