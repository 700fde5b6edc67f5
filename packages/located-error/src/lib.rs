//! Errors that remember where they were raised.
//!
//! Collaborators behind trait objects (peer registries, authorization
//! providers, configuration sources) fail with arbitrary error types. The
//! tracker stores them as a [`DynError`] and wraps them in a [`LocatedError`]
//! so a log line shows both the failure and the call site that observed it.
//!
//! ```rust
//! use std::sync::Arc;
//! use swarm_tracker_located_error::{DynError, Located, LocatedError};
//!
//! #[derive(thiserror::Error, Debug)]
//! enum RegistryError {
//!     #[error("swarm store unavailable")]
//!     Unavailable,
//! }
//!
//! let located: LocatedError<RegistryError> = Located(RegistryError::Unavailable).into();
//! assert!(located.to_string().starts_with("swarm store unavailable, "));
//!
//! let dynamic: LocatedError<dyn std::error::Error + Send + Sync> =
//!     (Arc::new(RegistryError::Unavailable) as DynError).into();
//! assert_eq!(dynamic.source_description(), "swarm store unavailable");
//! ```
use std::error::Error;
use std::panic::Location;
use std::sync::Arc;

/// A shareable, type-erased error.
pub type DynError = Arc<dyn std::error::Error + Send + Sync>;

/// Marker used to convert a concrete error into a [`LocatedError`] with `into()`.
pub struct Located<E>(pub E);

/// An error together with the location of the code that wrapped it.
#[derive(Debug)]
pub struct LocatedError<'a, E>
where
    E: Error + ?Sized + Send + Sync,
{
    source: Arc<E>,
    location: Box<Location<'a>>,
}

impl<'a, E> LocatedError<'a, E>
where
    E: Error + ?Sized + Send + Sync,
{
    /// Where the error was wrapped.
    #[must_use]
    pub fn location(&self) -> &Location<'a> {
        &self.location
    }

    /// The inner error message, without the location.
    #[must_use]
    pub fn source_description(&self) -> String {
        self.source.to_string()
    }
}

impl<'a, E> std::fmt::Display for LocatedError<'a, E>
where
    E: Error + ?Sized + Send + Sync,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}", self.source, self.location)
    }
}

impl<'a, E> Error for LocatedError<'a, E>
where
    E: Error + ?Sized + Send + Sync + 'static,
{
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.source)
    }
}

impl<'a, E> Clone for LocatedError<'a, E>
where
    E: Error + ?Sized + Send + Sync,
{
    fn clone(&self) -> Self {
        LocatedError {
            source: self.source.clone(),
            location: self.location.clone(),
        }
    }
}

impl<'a, E> From<Located<E>> for LocatedError<'a, E>
where
    E: Error + Send + Sync,
{
    #[track_caller]
    fn from(located: Located<E>) -> Self {
        let e = LocatedError {
            source: Arc::new(located.0),
            location: Box::new(*Location::caller()),
        };
        tracing::debug!("{e}");
        e
    }
}

impl<'a> From<DynError> for LocatedError<'a, dyn std::error::Error + Send + Sync> {
    #[track_caller]
    fn from(source: DynError) -> Self {
        LocatedError {
            source,
            location: Box::new(*Location::caller()),
        }
    }
}
