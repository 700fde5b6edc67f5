//! Setup for the main tracker application.
//!
//! The [`setup`] only builds the application and its dependencies but it does not start the application.
//! In fact, there is no such thing as the main application process. When the application starts, the only thing it does is
//! starting a bunch of independent jobs. If you are looking for how things are started you should read [`app::start`](crate::app::start)
//! function documentation.
//!
//! Setup steps:
//!
//! 1. Load the global application configuration.
//! 2. Initialize static variables.
//! 3. Initialize logging.
//! 4. Initialize the domain tracker.
use std::sync::Arc;

use swarm_tracker_clock::static_time;
use swarm_tracker_configuration::{Configuration, Info, DEFAULT_PATH_CONFIG};

use super::logging;
use crate::core::swarms::InMemoryRegistry;
use crate::core::{statistics, Tracker};

/// It loads the configuration from the environment and builds the main domain [`Tracker`] struct.
///
/// # Panics
///
/// Setup can file if the configuration is invalid.
#[must_use]
pub fn setup() -> (Configuration, Arc<Tracker>, Arc<InMemoryRegistry>) {
    let info = Info::new(DEFAULT_PATH_CONFIG.to_string()).expect("it should be able to read the configuration sources");

    let configuration = Configuration::load(&info).expect("it should be able to load the configuration");

    let (tracker, registry) = initialize_with_configuration(&configuration);

    (configuration, tracker, registry)
}

/// It initializes the application with the given configuration.
///
/// The configuration may be obtained from the environment (via config file or env vars).
#[must_use]
pub fn initialize_with_configuration(configuration: &Configuration) -> (Arc<Tracker>, Arc<InMemoryRegistry>) {
    initialize_static();
    initialize_logging(configuration);

    let registry = Arc::new(InMemoryRegistry::new(configuration.core.announce_policy));
    let tracker = Arc::new(initialize_tracker(configuration, registry.clone()));

    (tracker, registry)
}

/// It initializes the application static values.
///
/// These values are accessible throughout the entire application:
///
/// - The time when the application started.
pub fn initialize_static() {
    lazy_static::initialize(&static_time::TIME_AT_APP_START);
}

/// It builds the domain tracker on top of the swarm registry.
#[must_use]
pub fn initialize_tracker(configuration: &Configuration, registry: Arc<InMemoryRegistry>) -> Tracker {
    let (stats_event_sender, stats_repository) = statistics::setup(configuration.core.tracker_usage_statistics);

    Tracker::new(registry, stats_event_sender, stats_repository)
}

/// It initializes the log threshold, format and channel.
///
/// See [the logging setup](crate::bootstrap::logging::setup) for more info about logging.
pub fn initialize_logging(configuration: &Configuration) {
    logging::setup(configuration);
}
