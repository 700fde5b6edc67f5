//! The time the application started.
use std::time::SystemTime;

lazy_static! {
    /// The time at which the process first read the clock.
    pub static ref TIME_AT_APP_START: SystemTime = SystemTime::now();
}
