//! Configuration data structures for the swarm tracker.
//!
//! The configuration is built in three layers, each one overriding the
//! previous:
//!
//! 1. The defaults of every section.
//! 2. A TOML document, taken from the `SWARM_TRACKER_CONFIG_TOML` environment
//!    variable if it is set, otherwise from the file named by
//!    `SWARM_TRACKER_CONFIG_TOML_PATH` (or the default path given to
//!    [`Info::new`]). A missing file is not an error.
//! 3. Single values taken from environment variables prefixed with
//!    `SWARM_TRACKER_CONFIG_OVERRIDE_`. Nested keys are separated with a
//!    double underscore, for example
//!    `SWARM_TRACKER_CONFIG_OVERRIDE_LOGGING__THRESHOLD=debug`.
//!
//! ## Default configuration
//!
//! ```toml
//! [logging]
//! threshold = "info"
//! style = "default"
//!
//! [core]
//! max_peer_timeout = 900
//! inactive_peer_cleanup_interval = 600
//! remove_peerless_torrents = true
//! tracker_usage_statistics = true
//!
//! [core.announce_policy]
//! interval = 120
//! interval_min = 120
//!
//! [[udp_trackers]]
//! bind_address = "0.0.0.0:6969"
//! protocol_version = 2
//! connection_token_lifetime = 180
//! max_concurrent_requests = 50
//!
//! [udp_trackers.authentication]
//! enabled = false
//! password = ""
//! external_authorization = false
//! authorization_timeout = 5
//!
//! [udp_trackers.authentication.users]
//! ```
pub mod core;
pub mod logging;
pub mod udp_tracker;

use std::env;
use std::sync::Arc;
use std::time::Duration;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use swarm_tracker_located_error::{DynError, LocatedError};
use thiserror::Error;

pub use crate::core::{AnnouncePolicy, Core};
pub use crate::logging::{Logging, Style, Threshold};
pub use crate::udp_tracker::{Authentication, UdpTracker};

/// The maximum number of returned peers for a torrent.
pub const TORRENT_PEERS_LIMIT: usize = 74;

/// The maximum number of info hashes in one scrape request.
pub const MAX_SCRAPE_TORRENTS: usize = 74;

/// Default retry timeout of the UDP transport.
pub const DEFAULT_UDP_TIMEOUT: Duration = Duration::from_secs(30);

/// How long a connection id stays valid. Clients retry a few times before
/// giving up, so the id must outlive several retry timeouts.
pub const CONNECTION_TOKEN_LIFETIME: Duration = Duration::from_secs(DEFAULT_UDP_TIMEOUT.as_secs() * 6);

/// Path of the configuration file when no other source is given.
pub const DEFAULT_PATH_CONFIG: &str = "./share/default/config/tracker.toml";

// Environment variables

/// The whole `tracker.toml` file content. It has priority over the config file.
const ENV_VAR_CONFIG_TOML: &str = "SWARM_TRACKER_CONFIG_TOML";

/// The `tracker.toml` file location.
pub const ENV_VAR_CONFIG_TOML_PATH: &str = "SWARM_TRACKER_CONFIG_TOML_PATH";

/// Prefix of the environment variables that override single values.
const CONFIG_OVERRIDE_PREFIX: &str = "SWARM_TRACKER_CONFIG_OVERRIDE_";

/// Path separator used in the override variable names.
const CONFIG_OVERRIDE_SEPARATOR: &str = "__";

/// Information required for loading config
#[derive(Debug, Default, Clone)]
pub struct Info {
    config_toml: Option<String>,
    config_toml_path: String,
}

impl Info {
    /// Build Configuration Info
    ///
    /// # Errors
    ///
    /// Will return `Err` if unable to obtain a configuration.
    #[allow(clippy::needless_pass_by_value)]
    pub fn new(default_config_toml_path: String) -> Result<Self, Error> {
        let config_toml = if let Ok(config_toml) = env::var(ENV_VAR_CONFIG_TOML) {
            println!("Loading configuration from environment variable:\n {config_toml}");
            Some(config_toml)
        } else {
            None
        };

        let config_toml_path = if let Ok(config_toml_path) = env::var(ENV_VAR_CONFIG_TOML_PATH) {
            println!("Loading configuration from file: `{config_toml_path}` ...");
            config_toml_path
        } else {
            println!("Loading configuration from default configuration file: `{default_config_toml_path}` ...");
            default_config_toml_path
        };

        Ok(Self {
            config_toml,
            config_toml_path,
        })
    }
}

/// Errors that can occur when loading the configuration.
#[derive(Error, Debug)]
pub enum Error {
    /// The layered sources could not be merged into a [`Configuration`].
    #[error("Failed processing the configuration: {source}")]
    ConfigError {
        source: LocatedError<'static, dyn std::error::Error + Send + Sync>,
    },

    #[error("Unable to encode the configuration as TOML: {source}")]
    UnableToEncode {
        source: LocatedError<'static, dyn std::error::Error + Send + Sync>,
    },
}

impl From<figment::Error> for Error {
    #[track_caller]
    fn from(err: figment::Error) -> Self {
        Self::ConfigError {
            source: (Arc::new(err) as DynError).into(),
        }
    }
}

impl From<toml::ser::Error> for Error {
    #[track_caller]
    fn from(err: toml::ser::Error) -> Self {
        Self::UnableToEncode {
            source: (Arc::new(err) as DynError).into(),
        }
    }
}

/// Core configuration for the tracker.
#[derive(Serialize, Deserialize, PartialEq, Eq, Debug, Clone)]
pub struct Configuration {
    #[serde(default = "Configuration::default_logging")]
    pub logging: Logging,

    #[serde(default = "Configuration::default_core")]
    pub core: Core,

    /// One entry per listening socket.
    #[serde(default = "Configuration::default_udp_trackers")]
    pub udp_trackers: Vec<UdpTracker>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            logging: Self::default_logging(),
            core: Self::default_core(),
            udp_trackers: Self::default_udp_trackers(),
        }
    }
}

impl Configuration {
    fn default_logging() -> Logging {
        Logging::default()
    }

    fn default_core() -> Core {
        Core::default()
    }

    fn default_udp_trackers() -> Vec<UdpTracker> {
        vec![UdpTracker::default()]
    }

    /// Loads the configuration from the sources described by `info`.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the TOML document is invalid or a value has the
    /// wrong type.
    pub fn load(info: &Info) -> Result<Configuration, Error> {
        let figment = if let Some(config_toml) = &info.config_toml {
            Figment::from(Serialized::defaults(Configuration::default())).merge(Toml::string(config_toml))
        } else {
            Figment::from(Serialized::defaults(Configuration::default())).merge(Toml::file(&info.config_toml_path))
        };

        let figment = figment.merge(Env::prefixed(CONFIG_OVERRIDE_PREFIX).split(CONFIG_OVERRIDE_SEPARATOR));

        let config: Configuration = figment.extract()?;

        Ok(config)
    }

    /// Encodes the configuration to TOML.
    ///
    /// # Errors
    ///
    /// Will return `Err` if a value cannot be represented in TOML.
    pub fn to_toml(&self) -> Result<String, Error> {
        Ok(toml::to_string(self)?)
    }
}
