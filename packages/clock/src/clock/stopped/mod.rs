//! A clock that only moves when told to.
//!
//! The time is kept per thread, so tests running in parallel do not see each
//! other's adjustments. Every thread starts at [`Duration::ZERO`] under
//! `cfg(test)` and at the application start time otherwise.
use std::cell::Cell;
use std::num::IntErrorKind;
use std::time::Duration;

use swarm_tracker_primitives::DurationSinceUnixEpoch;

use crate::clock::{self, Time};

#[allow(clippy::module_name_repetitions)]
pub struct StoppedClock;

thread_local! {
    static FROZEN_AT: Cell<DurationSinceUnixEpoch> = Cell::new(initial_time());
}

/// Operations to move a stopped clock around.
#[allow(clippy::module_name_repetitions)]
pub trait Stopped: clock::Time {
    /// It sets the clock to a given time.
    fn local_set(unix_time: &DurationSinceUnixEpoch);

    /// It sets the clock to the Unix Epoch.
    fn local_set_to_unix_epoch() {
        Self::local_set(&DurationSinceUnixEpoch::ZERO);
    }

    /// It moves the clock forward.
    ///
    /// # Errors
    ///
    /// Will return `IntErrorKind::PosOverflow` if the new time does not fit in a `Duration`.
    fn local_add(duration: &Duration) -> Result<(), IntErrorKind> {
        let later = Self::now().checked_add(*duration).ok_or(IntErrorKind::PosOverflow)?;
        Self::local_set(&later);
        Ok(())
    }

    /// It moves the clock backwards.
    ///
    /// # Errors
    ///
    /// Will return `IntErrorKind::NegOverflow` if the new time would be before the epoch.
    fn local_sub(duration: &Duration) -> Result<(), IntErrorKind> {
        let earlier = Self::now().checked_sub(*duration).ok_or(IntErrorKind::NegOverflow)?;
        Self::local_set(&earlier);
        Ok(())
    }

    /// It puts the clock back to the time every thread starts with.
    fn local_reset() {
        Self::local_set(&initial_time());
    }
}

impl Time for clock::Stopped {
    fn now() -> DurationSinceUnixEpoch {
        FROZEN_AT.with(Cell::get)
    }

    fn dbg_clock_type() -> String {
        "Stopped".to_owned()
    }
}

impl Stopped for clock::Stopped {
    fn local_set(unix_time: &DurationSinceUnixEpoch) {
        FROZEN_AT.with(|time| time.set(*unix_time));
    }
}

#[cfg(test)]
fn initial_time() -> DurationSinceUnixEpoch {
    DurationSinceUnixEpoch::ZERO
}

#[cfg(not(test))]
fn initial_time() -> DurationSinceUnixEpoch {
    crate::static_time::TIME_AT_APP_START
        .duration_since(std::time::SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use std::num::IntErrorKind;
    use std::thread;
    use std::time::Duration;

    use swarm_tracker_primitives::DurationSinceUnixEpoch;

    use crate::clock::stopped::Stopped as _;
    use crate::clock::{Stopped, Time};

    #[test]
    fn it_should_start_at_the_unix_epoch_when_testing() {
        assert_eq!(Stopped::now(), DurationSinceUnixEpoch::ZERO);
    }

    #[test]
    fn it_should_move_forward_and_backwards() {
        Stopped::local_set(&Duration::from_secs(60));

        Stopped::local_add(&Duration::from_secs(30)).unwrap();
        assert_eq!(Stopped::now(), Duration::from_secs(90));

        Stopped::local_sub(&Duration::from_secs(90)).unwrap();
        assert_eq!(Stopped::now(), Duration::ZERO);

        Stopped::local_reset();
    }

    #[test]
    fn it_should_refuse_to_move_before_the_epoch() {
        Stopped::local_set_to_unix_epoch();

        assert_eq!(Stopped::local_sub(&Duration::from_secs(1)), Err(IntErrorKind::NegOverflow));
        assert_eq!(Stopped::now(), Duration::ZERO);
    }

    #[test]
    fn it_should_keep_the_time_of_each_thread_apart() {
        Stopped::local_set(&Duration::from_secs(5));

        let other = thread::spawn(|| Stopped::now()).join().unwrap();

        assert_eq!(other, Duration::ZERO);
        assert_eq!(Stopped::now(), Duration::from_secs(5));

        Stopped::local_reset();
    }
}
