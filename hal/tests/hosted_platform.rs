//! Whole-platform run on the hosted build: system timer channels and the
//! GPIO capture, interrupts delivered through the platform IRQ router.
//!
//! Everything lives in one test because the simulated clocks are global.

#![cfg(all(
    feature = "timer-bcm2835",
    feature = "capture-bcm2835",
    feature = "instance-name"
))]

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use timer_capture_hal::hal::capture::{self, Capture};
use timer_capture_hal::hal::timer::{self, RunState, Timer};
use timer_capture_hal::platform::hosted::{HostedPlatform, SYSTIMER};
use timer_capture_hal::{
    CallbackAction, CaptureOps, CurrentPlatform, InitStatus, Platform, TimerOps, UserData,
};

static PERIODIC_HITS: AtomicU32 = AtomicU32::new(0);
static ONESHOT_AT: AtomicU64 = AtomicU64::new(0);
static EDGE_AT: AtomicU64 = AtomicU64::new(0);

fn count(_timer: &'static Timer, data: UserData) -> CallbackAction {
    if let Some(hits) = data.and_then(|d| d.downcast_ref::<AtomicU32>()) {
        hits.fetch_add(1, Ordering::SeqCst);
    }
    CallbackAction::Continue
}

fn stamp(timer: &'static Timer, data: UserData) -> CallbackAction {
    let at = data.and_then(|d| d.downcast_ref::<AtomicU64>());
    if let (Some(at), Ok(now)) = (at, timer::get_time(timer)) {
        at.store(now, Ordering::SeqCst);
    }
    CallbackAction::Continue
}

fn edge(_capture: &'static Capture, channel: u32, time: u64, data: UserData) -> CallbackAction {
    assert_eq!(channel, 17);
    if let Some(at) = data.and_then(|d| d.downcast_ref::<AtomicU64>()) {
        at.store(time, Ordering::SeqCst);
    }
    CallbackAction::Continue
}

fn index_of(name: &str) -> u32 {
    CurrentPlatform::timers()
        .iter()
        .find(|(_, t)| t.header().name() == Some(name))
        .map(|(i, _)| i)
        .unwrap_or_else(|| panic!("no timer named {name}"))
}

#[test_log::test]
fn system_timer_and_gpio_capture() {
    let sys1 = index_of("systimer1");
    let sys3 = index_of("systimer3");

    let periodic = timer::init(sys1, 1, 0, 0).unwrap();
    assert_eq!(periodic.status, InitStatus::Initialized);
    let periodic = periodic.instance;
    let oneshot = timer::init(sys3, 1, 0, 0).unwrap().instance;

    timer::set_overflow_callback(periodic, Some(count), Some(&PERIODIC_HITS)).unwrap();
    timer::set_overflow_callback(oneshot, Some(stamp), Some(&ONESHOT_AT)).unwrap();

    let start = SYSTIMER.now();
    timer::periodic(periodic, 1_000).unwrap();
    timer::oneshot(oneshot, 2_500).unwrap();

    HostedPlatform::advance(5_500);
    assert_eq!(PERIODIC_HITS.load(Ordering::SeqCst), 5);
    assert_eq!(ONESHOT_AT.load(Ordering::SeqCst), start + 2_500);
    assert_eq!(oneshot.run_state(), Some(RunState::Idle));
    assert_eq!(timer::get_time(periodic), Ok(start + 5_500));

    timer::stop(periodic).unwrap();
    HostedPlatform::advance(5_000);
    assert_eq!(PERIODIC_HITS.load(Ordering::SeqCst), 5);

    // GPIO17 capture: rising edges, stamped by the system timer.
    let gpio17 = CurrentPlatform::captures()
        .iter()
        .find(|(_, c)| c.channel() == 17)
        .map(|(i, _)| i)
        .unwrap();
    let cap = capture::init(gpio17).unwrap().instance;
    capture::set_callback(cap, Some(edge), Some(&EDGE_AT)).unwrap();
    assert!(!HostedPlatform::drive_gpio(17, true), "edge detect still off");
    HostedPlatform::drive_gpio(17, false);

    capture::set_period(cap, 4_000).unwrap();
    HostedPlatform::advance(123);
    assert!(HostedPlatform::drive_gpio(17, true));
    let stamped = start + 10_623;
    assert_eq!(EDGE_AT.load(Ordering::SeqCst), stamped);
    assert_eq!(capture::get_channel_time(cap), Ok(stamped));
    assert_eq!(capture::get_time(cap), Ok(stamped % 4_000));
    assert!(!HostedPlatform::drive_gpio(17, false));

    for instance in [periodic, oneshot] {
        timer::deinit(instance).unwrap();
    }
    capture::deinit(cap).unwrap();
    assert!(!HostedPlatform::handle_irq(1));
}
