//! Scripted sessions shared by the dispatch tests.
//!
//! Both scripts drive instance 0 of the hosted platform through the class
//! API and record every status code and observable value. A build with
//! table dispatch and a build with direct dispatch must produce the same
//! traces.

#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use timer_capture_hal::hal::capture::{self, Capture};
use timer_capture_hal::hal::error::status_of;
use timer_capture_hal::hal::timer::{self, Timer};
use timer_capture_hal::platform::hosted::{SOFT_CAPTURE_0, SOFT_TIMER_0};
use timer_capture_hal::{CallbackAction, UserData};

static TICKS: AtomicU32 = AtomicU32::new(0);
static LAST_EDGE: AtomicU64 = AtomicU64::new(0);

fn count_ticks(_timer: &'static Timer, data: UserData) -> CallbackAction {
    if let Some(ticks) = data.and_then(|d| d.downcast_ref::<AtomicU32>()) {
        ticks.fetch_add(1, Ordering::SeqCst);
    }
    CallbackAction::Continue
}

fn record_edge(_capture: &'static Capture, _channel: u32, time: u64, data: UserData) -> CallbackAction {
    if let Some(last) = data.and_then(|d| d.downcast_ref::<AtomicU64>()) {
        last.store(time, Ordering::SeqCst);
    }
    CallbackAction::from(time < 300)
}

pub const TIMER_TRACE: &[i64] = &[
    2, -2, // inspect-only handle
    0, 1, -1, // init, repeat, bad index
    -2, -4, // start with nothing programmed, zero interval
    0, 0, 3, 3, 35, // periodic every 10 us
    0, 0, // stop
    0, 1, // start re-arms the periodic program
    0, 1, 5, // one-shot
    0, 0, -2, // deinit twice
];

pub fn timer_trace() -> Vec<i64> {
    let mut trace = Vec::new();
    let mut push = |code: i32| trace.push(i64::from(code));

    let inspect = timer::init(0, 0, 0, 0).unwrap();
    push(inspect.status.code());
    push(status_of(&timer::oneshot(inspect.instance, 10)));

    let tmr = timer::init(0, 1, 0, 0).unwrap();
    push(tmr.status.code());
    push(timer::init(0, 1, 0, 0).map_or_else(|e| e.code(), |a| a.status.code()));
    push(status_of(&timer::init(99, 1, 0, 0)));
    let tmr = tmr.instance;

    push(status_of(&timer::start(tmr)));
    push(status_of(&timer::oneshot(tmr, 0)));

    push(status_of(&timer::set_overflow_callback(
        tmr,
        Some(count_ticks),
        Some(&TICKS),
    )));
    push(status_of(&timer::periodic(tmr, 10)));
    let fired = SOFT_TIMER_0.advance(35);
    trace.push(i64::from(fired));
    trace.push(i64::from(TICKS.load(Ordering::SeqCst)));
    trace.push(timer::get_time(tmr).map_or_else(|e| i64::from(e.code()), |t| t as i64));

    let mut push = |code: i32| trace.push(i64::from(code));
    push(status_of(&timer::stop(tmr)));
    push(SOFT_TIMER_0.advance(100) as i32);

    push(status_of(&timer::start(tmr)));
    push(SOFT_TIMER_0.advance(10) as i32);

    push(status_of(&timer::oneshot(tmr, 5)));
    push(SOFT_TIMER_0.advance(20) as i32);
    push(TICKS.load(Ordering::SeqCst) as i32);

    push(status_of(&timer::deinit(tmr)));
    push(status_of(&timer::deinit(tmr)));
    push(status_of(&timer::get_time(tmr)));

    trace
}

pub const CAPTURE_TRACE: &[i64] = &[
    0, 1, -1, // init, repeat, bad index
    0, 0, 0, // channel time before any edge, callback, edge while idle
    -4, 0, // period
    1, 250, 250, 50, // edge at 250 us
    1, 350, 0, // callback stops sampling
    0, 1, // set_period resumes
    0, -2, // deinit
];

pub fn capture_trace() -> Vec<i64> {
    let mut trace: Vec<i64> = Vec::new();
    let value = |r: timer_capture_hal::HalResult<u64>| r.map_or_else(|e| i64::from(e.code()), |v| v as i64);

    let cap = capture::init(0).unwrap();
    trace.push(cap.status.code().into());
    trace.push(capture::init(0).map_or_else(|e| e.code(), |a| a.status.code()).into());
    trace.push(status_of(&capture::init(99)).into());
    let cap = cap.instance;

    trace.push(value(capture::get_channel_time(cap)));
    trace.push(status_of(&capture::set_callback(cap, Some(record_edge), Some(&LAST_EDGE))).into());
    trace.push(i64::from(SOFT_CAPTURE_0.edge()));

    trace.push(status_of(&capture::set_period(cap, 0)).into());
    trace.push(status_of(&capture::set_period(cap, 100)).into());

    SOFT_CAPTURE_0.advance(250);
    trace.push(i64::from(SOFT_CAPTURE_0.edge()));
    trace.push(LAST_EDGE.load(Ordering::SeqCst) as i64);
    trace.push(value(capture::get_channel_time(cap)));
    trace.push(value(capture::get_time(cap)));

    SOFT_CAPTURE_0.advance(100);
    trace.push(i64::from(SOFT_CAPTURE_0.edge()));
    trace.push(LAST_EDGE.load(Ordering::SeqCst) as i64);
    trace.push(i64::from(SOFT_CAPTURE_0.edge()));

    trace.push(status_of(&capture::set_period(cap, 100)).into());
    trace.push(i64::from(SOFT_CAPTURE_0.edge()));

    trace.push(status_of(&capture::deinit(cap)).into());
    trace.push(value(capture::get_time(cap)));

    trace
}
