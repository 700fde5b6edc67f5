use std::time::Duration;

use swarm_tracker_clock::clock::stopped::Stopped as _;
use swarm_tracker_clock::clock::Time;

use crate::CurrentClock;

#[test]
fn it_should_use_stopped_time_for_testing() {
    assert_eq!(CurrentClock::dbg_clock_type(), "Stopped".to_owned());

    let time = CurrentClock::now();
    std::thread::sleep(Duration::from_millis(50));
    let time_2 = CurrentClock::now();

    assert_eq!(time, time_2);
}

#[test]
fn it_should_only_advance_when_told_to() {
    let start = CurrentClock::now();

    CurrentClock::local_add(&Duration::from_secs(180)).unwrap();

    assert_eq!(CurrentClock::elapsed_since(&start), Duration::from_secs(180));

    CurrentClock::local_reset();
}
