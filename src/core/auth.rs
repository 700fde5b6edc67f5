//! Per-request authentication of UDP tracker datagrams.
//!
//! When authentication is enabled a client appends a 16 byte trailer to every
//! datagram it sends:
//!
//! Offset from the end | Length | Content
//! --------------------|--------|---------------------------------------------
//! -16                 | 8      | user name, padded with zeros
//! -8                  | 8      | first 8 bytes of `SHA-1(body ‖ user name ‖ secret)`
//!
//! `body` is every byte that precedes the trailer and `secret` is the SHA-1
//! digest of the user password. The tracker resolves the secret either from
//! its own configuration (a single shared password) or by asking an
//! [`Authorizer`] about the user name the client presented.
//!
//! ```rust
//! use swarm_tracker::core::auth::{Credential, Secret};
//!
//! let secret = Secret::from_password("pw");
//! let body = b"announce bytes";
//!
//! let credential = Credential::sign(body, "alice", &secret);
//!
//! assert_eq!(credential.username(), "alice");
//! assert!(credential.is_signed_with(body, &secret));
//! ```
use std::collections::{BTreeMap, HashMap};
use std::net::SocketAddr;
use std::panic::Location;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use sha1::{Digest, Sha1};
use swarm_tracker_configuration::Authentication;
use swarm_tracker_located_error::{DynError, LocatedError};
use thiserror::Error;
use url::Url;

/// Length of the user name field of the trailer.
pub const USERNAME_LEN: usize = 8;

/// Length of the truncated digest of the trailer.
pub const HASH_LEN: usize = 8;

pub const TRAILER_LEN: usize = USERNAME_LEN + HASH_LEN;

/// The SHA-1 digest of a password.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Secret([u8; 20]);

impl Secret {
    #[must_use]
    pub fn from_password(password: &str) -> Self {
        Self::from_digest(Sha1::digest(password.as_bytes()).as_slice())
    }

    /// # Panics
    ///
    /// Will panic if `digest` is not 20 bytes long.
    #[must_use]
    pub fn from_digest(digest: &[u8]) -> Self {
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(digest);
        Self(bytes)
    }

    #[must_use]
    pub fn bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Secret(..)")
    }
}

/// The trailer a client attaches to a datagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Credential {
    username: [u8; USERNAME_LEN],
    hash: [u8; HASH_LEN],
}

impl Credential {
    /// Splits a datagram into the signed body and its trailer.
    ///
    /// # Errors
    ///
    /// Will return [`Error::MissingCredential`] unless the datagram is longer
    /// than the trailer.
    #[track_caller]
    pub fn split_from(datagram: &[u8]) -> Result<(&[u8], Credential), Error> {
        if datagram.len() <= TRAILER_LEN {
            return Err(Error::MissingCredential {
                location: Location::caller(),
            });
        }

        let (body, trailer) = datagram.split_at(datagram.len() - TRAILER_LEN);

        let mut username = [0u8; USERNAME_LEN];
        username.copy_from_slice(&trailer[..USERNAME_LEN]);
        let mut hash = [0u8; HASH_LEN];
        hash.copy_from_slice(&trailer[USERNAME_LEN..]);

        Ok((body, Credential { username, hash }))
    }

    /// Builds the trailer a client sends with `body`.
    ///
    /// User names longer than 8 bytes are cut.
    #[must_use]
    pub fn sign(body: &[u8], username: &str, secret: &Secret) -> Self {
        let mut padded = [0u8; USERNAME_LEN];
        let name = username.as_bytes();
        let len = name.len().min(USERNAME_LEN);
        padded[..len].copy_from_slice(&name[..len]);

        Credential {
            username: padded,
            hash: truncated_digest(body, &padded, secret),
        }
    }

    #[must_use]
    pub fn to_bytes(&self) -> [u8; TRAILER_LEN] {
        let mut bytes = [0u8; TRAILER_LEN];
        bytes[..USERNAME_LEN].copy_from_slice(&self.username);
        bytes[USERNAME_LEN..].copy_from_slice(&self.hash);
        bytes
    }

    /// The user name up to the first zero byte.
    #[must_use]
    pub fn username(&self) -> String {
        let end = self.username.iter().position(|b| *b == 0).unwrap_or(USERNAME_LEN);
        String::from_utf8_lossy(&self.username[..end]).into_owned()
    }

    /// Whether the trailer hash was computed over `body` with `secret`.
    #[must_use]
    pub fn is_signed_with(&self, body: &[u8], secret: &Secret) -> bool {
        constant_time_eq(&truncated_digest(body, &self.username, secret), &self.hash)
    }
}

fn truncated_digest(body: &[u8], username: &[u8; USERNAME_LEN], secret: &Secret) -> [u8; HASH_LEN] {
    let mut hasher = Sha1::new();
    hasher.update(body);
    hasher.update(username);
    hasher.update(secret.bytes());
    let digest = hasher.finalize();

    let mut truncated = [0u8; HASH_LEN];
    truncated.copy_from_slice(&digest[..HASH_LEN]);
    truncated
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

/// Resolves the secret of a user for a tracker resource.
///
/// `Ok(None)` means the provider does not know the user or does not grant it
/// access to the resource.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Authorizer: Send + Sync {
    async fn authorize(&self, resource: &Url, username: &str) -> Result<Option<Secret>, DynError>;
}

/// An [`Authorizer`] backed by the `users` table of the configuration.
///
/// It grants every user of the table access to every resource.
#[derive(Debug, Default)]
pub struct UserTable {
    secrets: HashMap<String, Secret>,
}

impl UserTable {
    #[must_use]
    pub fn new(users: &BTreeMap<String, String>) -> Self {
        Self {
            secrets: users
                .iter()
                .map(|(username, password)| (username.clone(), Secret::from_password(password)))
                .collect(),
        }
    }
}

#[async_trait]
impl Authorizer for UserTable {
    async fn authorize(&self, _resource: &Url, username: &str) -> Result<Option<Secret>, DynError> {
        Ok(self.secrets.get(username).copied())
    }
}

/// Where the expected secret comes from.
#[derive(Clone)]
pub enum SecretSource {
    Static(Secret),
    External {
        authorizer: Arc<dyn Authorizer>,
        timeout: Duration,
    },
}

/// Checks the trailer of datagrams received by one UDP tracker.
#[derive(Clone)]
pub struct Authenticator {
    source: SecretSource,
}

impl Authenticator {
    #[must_use]
    pub fn new(source: SecretSource) -> Self {
        Self { source }
    }

    /// The authenticator for a UDP tracker, `None` when authentication is
    /// disabled.
    ///
    /// The `authorizer` is only used with external authorization.
    #[must_use]
    pub fn from_config(config: &Authentication, authorizer: Arc<dyn Authorizer>) -> Option<Self> {
        if !config.enabled {
            return None;
        }

        let source = if config.external_authorization {
            SecretSource::External {
                authorizer,
                timeout: config.authorization_timeout,
            }
        } else {
            SecretSource::Static(Secret::from_password(&config.password))
        };

        Some(Self::new(source))
    }

    /// Verifies `credential` against `body`, the bytes that preceded it.
    ///
    /// `local_addr` is the tracker socket, it names the resource an external
    /// authorizer is asked about.
    ///
    /// # Errors
    ///
    /// Will return [`Error::AccessDenied`] if no secret can be resolved for
    /// the presented user or the hash does not match.
    pub async fn authenticate(&self, body: &[u8], credential: &Credential, local_addr: SocketAddr) -> Result<(), Error> {
        let username = credential.username();

        let secret = match &self.source {
            SecretSource::Static(secret) => *secret,
            SecretSource::External { authorizer, timeout } => {
                let resource = resource_for(local_addr).map_err(|err| {
                    Error::access_denied(
                        username.clone(),
                        Denial::ProviderFailure {
                            source: (Arc::new(err) as DynError).into(),
                        },
                    )
                })?;

                match tokio::time::timeout(*timeout, authorizer.authorize(&resource, &username)).await {
                    Ok(Ok(Some(secret))) => secret,
                    Ok(Ok(None)) => return Err(Error::access_denied(username, Denial::Denied)),
                    Ok(Err(source)) => {
                        return Err(Error::access_denied(
                            username,
                            Denial::ProviderFailure { source: source.into() },
                        ))
                    }
                    Err(_elapsed) => return Err(Error::access_denied(username, Denial::Timeout)),
                }
            }
        };

        if credential.is_signed_with(body, &secret) {
            Ok(())
        } else {
            Err(Error::access_denied(username, Denial::BadHash))
        }
    }
}

/// The resource identifying a UDP tracker: `udp://<host>:<port>/`.
///
/// # Errors
///
/// Will return an error if the address does not make a valid URL authority.
pub fn resource_for(local_addr: SocketAddr) -> Result<Url, url::ParseError> {
    Url::parse(&format!("udp://{local_addr}/"))
}

#[derive(Error, Debug, Clone)]
pub enum Error {
    #[error("datagram too short to carry an authentication trailer, {location}")]
    MissingCredential { location: &'static Location<'static> },

    #[error("access denied for user {username:?}: {reason}")]
    AccessDenied { username: String, reason: Denial },
}

impl Error {
    fn access_denied(username: String, reason: Denial) -> Self {
        Self::AccessDenied { username, reason }
    }
}

/// Why a credential was refused.
#[derive(Error, Debug, Clone)]
pub enum Denial {
    #[error("hash mismatch")]
    BadHash,

    #[error("not authorized by the authorization provider")]
    Denied,

    #[error("authorization provider failed: {source}")]
    ProviderFailure {
        source: LocatedError<'static, dyn std::error::Error + Send + Sync>,
    },

    #[error("authorization provider timed out")]
    Timeout,
}
