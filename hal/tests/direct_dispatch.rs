//! Direct dispatch: the class API bound to the single enabled soft driver.
//!
//! Run with
//! `cargo test --no-default-features --features timer-soft,capture-soft,thread-safe,instance-name`.

#![cfg(all(
    not(feature = "timer-multi"),
    not(feature = "capture-multi"),
    feature = "timer-soft",
    feature = "capture-soft"
))]

mod common;

use timer_capture_hal::hal::timer::Timer;
use timer_capture_hal::peripheral::soft_timer::SoftTimer;

#[test_log::test]
fn timer_type_is_the_driver() {
    assert_eq!(
        core::any::type_name::<Timer>(),
        core::any::type_name::<SoftTimer>()
    );
}

#[test_log::test]
fn timer_session_matches_reference_trace() {
    assert_eq!(common::timer_trace(), common::TIMER_TRACE);
}

#[test_log::test]
fn capture_session_matches_reference_trace() {
    assert_eq!(common::capture_trace(), common::CAPTURE_TRACE);
}
