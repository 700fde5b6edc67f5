use std::time::Duration;

use swarm_tracker_primitives::DurationSinceUnixEpoch;

use self::stopped::StoppedClock;
use self::working::WorkingClock;

pub mod stopped;
pub mod working;

/// A clock, parameterised by where it takes the time from.
///
/// It implements the [`Time`] trait, which gives you the current time.
#[derive(Debug)]
pub struct Clock<T> {
    clock: std::marker::PhantomData<T>,
}

/// The working clock. It returns the system time.
pub type Working = Clock<WorkingClock>;
/// The stopped clock. It returns a per-thread time that only moves when set.
pub type Stopped = Clock<StoppedClock>;

/// Trait for types that can be used as a timestamp clock.
pub trait Time: Sized {
    fn now() -> DurationSinceUnixEpoch;

    fn dbg_clock_type() -> String;

    /// Time elapsed since `earlier`, or zero when `earlier` lies in the future.
    #[must_use]
    fn elapsed_since(earlier: &DurationSinceUnixEpoch) -> Duration {
        Self::now().saturating_sub(*earlier)
    }

    #[must_use]
    fn now_add(add_time: &Duration) -> Option<DurationSinceUnixEpoch> {
        Self::now().checked_add(*add_time)
    }

    #[must_use]
    fn now_sub(sub_time: &Duration) -> Option<DurationSinceUnixEpoch> {
        Self::now().checked_sub(*sub_time)
    }
}
