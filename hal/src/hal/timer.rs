//! Timer peripheral class.
//!
//! [`TimerOps`] is the operation table every timer driver implements. The
//! free functions in this module are the class API used by application
//! code. Which code they reach is decided at build time:
//!
//! - with `timer-multi`, [`Timer`] is `dyn TimerOps` and every call goes
//!   through the instance's vtable, so several implementations can share one
//!   registry;
//! - otherwise [`Timer`] is the single enabled driver type and every call is
//!   a direct, inlinable call into it.
//!
//! Both builds expose the same signatures, status codes and callback
//! contract.
//!
//! # State machine
//!
//! ```text
//! Uninitialized --init--> Idle --oneshot/periodic/start--> Running(mode)
//!       ^                  ^                                  |
//!       +-----deinit-------+----stop / oneshot expiry / Stop--+
//! ```

use crate::hal::callback::{CallbackAction, CallbackSlot, UserData};
use crate::hal::error::{Acquired, HalError, HalResult, InitStatus};
use crate::hal::instance::DriverHeader;
use crate::hal::registry::DeviceRegistry;
use crate::platform::{CurrentPlatform, Platform};

/// Timer operating mode.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TimerMode {
    /// Timer fires once after the specified interval.
    OneShot,
    /// Timer automatically reloads and fires periodically.
    Periodic,
}

/// Run state of an initialised timer.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running(TimerMode),
}

/// Overflow callback, invoked from interrupt context.
///
/// In periodic mode [`CallbackAction::Stop`] stops the timer. The return
/// value is ignored for one-shot expiries, which always end in `Idle`.
pub type OverflowCallback = fn(&'static Timer, UserData) -> CallbackAction;

/// Operation table of the timer class.
pub trait TimerOps: Sync {
    /// Common instance header.
    fn header(&self) -> &DriverHeader;

    /// Bring the timer up.
    ///
    /// `prescaler == 0` returns [`InitStatus::Inspect`] without touching
    /// the instance. `basetime`/`adjust` describe the timer's measured
    /// drift, see [`Correction`].
    fn init(&self, prescaler: u32, basetime: u64, adjust: i64) -> HalResult<InitStatus>;

    /// Disarm the timer, drop its callback and mark it uninitialised.
    ///
    /// Valid from every state.
    fn deinit(&self) -> HalResult<()>;

    /// Register (or with `None`, remove) the overflow callback.
    fn set_overflow_callback(
        &self,
        callback: Option<OverflowCallback>,
        data: UserData,
    ) -> HalResult<()>;

    /// Re-arm the most recently programmed mode and interval from now.
    fn start(&self) -> HalResult<()>;

    /// Disarm. No callback fires after `stop` returns.
    fn stop(&self) -> HalResult<()>;

    /// Fire once after `us` microseconds, then go idle.
    fn oneshot(&self, us: u64) -> HalResult<()>;

    /// Fire every `us` microseconds.
    fn periodic(&self, us: u64) -> HalResult<()>;

    /// Current counter value. Units and rollover are driver-defined.
    fn get_time(&self) -> HalResult<u64>;

    /// Run state, or `None` while uninitialised.
    fn run_state(&self) -> Option<RunState>;
}

cfg_if::cfg_if! {
    if #[cfg(feature = "timer-multi")] {
        /// Timer instance type targeted by the class API.
        pub type Timer = dyn TimerOps;
    } else if #[cfg(all(feature = "timer-soft", not(feature = "timer-bcm2835")))] {
        /// Timer instance type targeted by the class API.
        pub type Timer = crate::peripheral::soft_timer::SoftTimer;
    } else if #[cfg(all(feature = "timer-bcm2835", not(feature = "timer-soft")))] {
        /// Timer instance type targeted by the class API.
        pub type Timer = crate::platform::bcm2835::timer::Bcm2835Timer;
    } else {
        compile_error!(
            "Direct timer dispatch needs exactly one timer driver.\n\
            Enable one of: timer-soft, timer-bcm2835\n\
            Or enable timer-multi"
        );
    }
}

// ============================================================================
// Class API
// ============================================================================

/// Look up timer `index` on the current platform and initialise it.
pub fn init(
    index: u32,
    prescaler: u32,
    basetime: u64,
    adjust: i64,
) -> HalResult<Acquired<&'static Timer>> {
    init_from(CurrentPlatform::timers(), index, prescaler, basetime, adjust)
}

/// [`init`] against an explicit registry.
pub fn init_from<T: TimerOps + ?Sized>(
    registry: &DeviceRegistry<T>,
    index: u32,
    prescaler: u32,
    basetime: u64,
    adjust: i64,
) -> HalResult<Acquired<&'static T>> {
    let timer = registry.get(index)?;
    let status = timer.init(prescaler, basetime, adjust)?;
    Ok(Acquired {
        instance: timer,
        status,
    })
}

#[inline]
pub fn deinit(timer: &Timer) -> HalResult<()> {
    timer.deinit()
}

#[inline]
pub fn set_overflow_callback(
    timer: &Timer,
    callback: Option<OverflowCallback>,
    data: UserData,
) -> HalResult<()> {
    timer.set_overflow_callback(callback, data)
}

#[inline]
pub fn start(timer: &Timer) -> HalResult<()> {
    timer.start()
}

#[inline]
pub fn stop(timer: &Timer) -> HalResult<()> {
    timer.stop()
}

#[inline]
pub fn oneshot(timer: &Timer, us: u64) -> HalResult<()> {
    timer.oneshot(us)
}

#[inline]
pub fn periodic(timer: &Timer, us: u64) -> HalResult<()> {
    timer.periodic(us)
}

#[inline]
pub fn get_time(timer: &Timer) -> HalResult<u64> {
    timer.get_time()
}

// ============================================================================
// Driver Helpers
// ============================================================================

/// Drift correction supplied at `init`.
///
/// A timer programmed for `basetime` µs was measured to run for
/// `basetime + adjust` µs. Requested intervals are scaled by
/// `basetime / (basetime + adjust)` before they reach the hardware.
/// `basetime == 0` disables correction.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Correction {
    basetime: u64,
    adjust: i64,
}

impl Correction {
    pub const NONE: Correction = Correction {
        basetime: 0,
        adjust: 0,
    };

    pub fn new(basetime: u64, adjust: i64) -> HalResult<Self> {
        if basetime != 0 && i128::from(basetime) + i128::from(adjust) <= 0 {
            return Err(HalError::InvalidArgument);
        }
        Ok(Self { basetime, adjust })
    }

    /// Corrected interval for a requested `us`. Never rounds a non-zero
    /// request down to zero.
    pub fn apply(&self, us: u64) -> u64 {
        if self.basetime == 0 || self.adjust == 0 || us == 0 {
            return us;
        }
        let actual = (i128::from(self.basetime) + i128::from(self.adjust)) as u128;
        let scaled = u128::from(us) * u128::from(self.basetime) / actual;
        u64::try_from(scaled).unwrap_or(u64::MAX).max(1)
    }
}

impl Default for Correction {
    fn default() -> Self {
        Self::NONE
    }
}

/// An armed interval, in driver ticks.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Program {
    pub mode: TimerMode,
    pub ticks: u64,
}

/// A pending overflow notification, taken under the state lock and
/// delivered after it is released.
#[derive(Debug, Copy, Clone)]
pub struct Expiry {
    pub mode: TimerMode,
    generation: u32,
    callback: Option<(OverflowCallback, UserData)>,
}

impl Expiry {
    /// Invoke the registered callback, if any.
    pub fn notify(&self, timer: &'static Timer) -> CallbackAction {
        match self.callback {
            Some((callback, data)) => callback(timer, data),
            None => CallbackAction::Continue,
        }
    }
}

/// Mode bookkeeping shared by the timer drivers.
///
/// Lives inside the driver's [`IrqLock`](crate::hal::lock::IrqLock); the
/// driver owns the counter/compare side.
#[derive(Debug)]
pub struct TimerState {
    correction: Correction,
    run: RunState,
    program: Option<Program>,
    generation: u32,
    slot: CallbackSlot<OverflowCallback>,
}

impl TimerState {
    pub const fn new() -> Self {
        Self {
            correction: Correction::NONE,
            run: RunState::Idle,
            program: None,
            generation: 0,
            slot: CallbackSlot::empty(),
        }
    }

    /// Fresh state for a newly initialised instance.
    ///
    /// The generation keeps counting so an expiry taken before the reset
    /// can never act on a later run.
    pub fn reset(&mut self, correction: Correction) {
        let generation = self.generation.wrapping_add(1);
        *self = Self::new();
        self.correction = correction;
        self.generation = generation;
    }

    pub fn correction(&self) -> Correction {
        self.correction
    }

    pub fn run_state(&self) -> RunState {
        self.run
    }

    pub fn program(&self) -> Option<Program> {
        self.program
    }

    pub fn set_callback(&mut self, callback: Option<OverflowCallback>, data: UserData) {
        self.slot.set(callback, data);
    }

    /// Record a new program and mark the timer running.
    pub fn arm(&mut self, mode: TimerMode, ticks: u64) {
        self.program = Some(Program { mode, ticks });
        self.run = RunState::Running(mode);
        self.generation = self.generation.wrapping_add(1);
    }

    /// Re-arm the stored program. Fails if nothing was ever programmed.
    pub fn rearm(&mut self) -> HalResult<Program> {
        let program = self.program.ok_or(HalError::InvalidState)?;
        self.arm(program.mode, program.ticks);
        Ok(program)
    }

    pub fn disarm(&mut self) {
        self.run = RunState::Idle;
        self.generation = self.generation.wrapping_add(1);
    }

    /// The armed interval elapsed. One-shot timers go idle here.
    ///
    /// Returns `None` when the timer is not running (a stale interrupt).
    pub fn expire(&mut self) -> Option<Expiry> {
        let RunState::Running(mode) = self.run else {
            return None;
        };
        if mode == TimerMode::OneShot {
            self.run = RunState::Idle;
        }
        Some(Expiry {
            mode,
            generation: self.generation,
            callback: self.slot.get(),
        })
    }

    /// Apply the callback's verdict. A `Stop` only affects the periodic run
    /// that produced the expiry, not one armed since.
    pub fn finish(&mut self, expiry: &Expiry, action: CallbackAction) {
        if action == CallbackAction::Stop
            && expiry.mode == TimerMode::Periodic
            && expiry.generation == self.generation
            && self.run == RunState::Running(TimerMode::Periodic)
        {
            self.disarm();
        }
    }
}

impl Default for TimerState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correction_scales_requested_interval() {
        // Programming 20 ms was measured as 20.010 ms.
        let c = Correction::new(20_000, 10).unwrap();
        assert_eq!(c.apply(20_010), 20_000);

        // Hardware running at half speed.
        let slow = Correction::new(1_000, 1_000).unwrap();
        assert_eq!(slow.apply(2_000), 1_000);

        // Hardware running fast needs longer programs.
        let fast = Correction::new(1_000, -500).unwrap();
        assert_eq!(fast.apply(500), 1_000);
    }

    #[test]
    fn correction_edge_cases() {
        assert_eq!(Correction::NONE.apply(1234), 1234);
        assert_eq!(Correction::new(0, 55).unwrap().apply(10), 10);
        assert_eq!(Correction::new(1_000, 1_000_000).unwrap().apply(1), 1);
        assert_eq!(Correction::new(100, -100), Err(HalError::InvalidArgument));
        assert_eq!(Correction::new(100, -200), Err(HalError::InvalidArgument));
    }

    #[test]
    fn start_without_program_is_invalid() {
        let mut state = TimerState::new();
        assert_eq!(state.rearm(), Err(HalError::InvalidState));
        state.arm(TimerMode::Periodic, 10);
        state.disarm();
        assert_eq!(
            state.rearm(),
            Ok(Program {
                mode: TimerMode::Periodic,
                ticks: 10
            })
        );
        assert_eq!(state.run_state(), RunState::Running(TimerMode::Periodic));
    }

    #[test]
    fn oneshot_expiry_goes_idle() {
        let mut state = TimerState::new();
        state.arm(TimerMode::OneShot, 5);
        let expiry = state.expire().unwrap();
        assert_eq!(expiry.mode, TimerMode::OneShot);
        assert_eq!(state.run_state(), RunState::Idle);
        assert!(state.expire().is_none());
    }

    #[test]
    fn stop_verdict_ignores_newer_program() {
        let mut state = TimerState::new();
        state.arm(TimerMode::Periodic, 5);
        let stale = state.expire().unwrap();

        state.arm(TimerMode::Periodic, 7);
        state.finish(&stale, CallbackAction::Stop);
        assert_eq!(state.run_state(), RunState::Running(TimerMode::Periodic));

        let current = state.expire().unwrap();
        state.finish(&current, CallbackAction::Stop);
        assert_eq!(state.run_state(), RunState::Idle);
    }
}
