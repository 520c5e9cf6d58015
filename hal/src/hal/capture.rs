//! Capture peripheral class.
//!
//! A capture instance timestamps edges on one input channel. Most capture
//! hardware is a timer with a latch, so the time values here follow the
//! same conventions as [`timer`](crate::hal::timer).
//!
//! Dispatch works exactly like the timer class: `capture-multi` makes
//! [`Capture`] a `dyn CaptureOps`, otherwise it is the single enabled
//! driver type.
//!
//! # State machine
//!
//! ```text
//! Uninitialized --init--> Initialized --set_period--> Sampling
//!       ^                   ^     ^                      |
//!       +------deinit-------+     +---callback Stop------+
//! ```
//!
//! # Time values
//!
//! - `get_time` is the capture counter, which wraps every sampling period
//!   (never, before a period is set).
//! - Callback timestamps and `get_channel_time` are absolute microseconds
//!   and never go backwards.

use crate::hal::callback::{CallbackAction, CallbackSlot, UserData};
use crate::hal::error::{Acquired, HalError, HalResult, InitStatus};
use crate::hal::instance::DriverHeader;
use crate::hal::registry::DeviceRegistry;
use crate::platform::{CurrentPlatform, Platform};

/// Capture callback, invoked from interrupt context once per captured edge
/// with the instance, its channel index and the event timestamp.
///
/// [`CallbackAction::Stop`] disables capture until the next `set_period`.
pub type CaptureCallback = fn(&'static Capture, u32, u64, UserData) -> CallbackAction;

/// Operation table of the capture class.
pub trait CaptureOps: Sync {
    /// Common instance header.
    fn header(&self) -> &DriverHeader;

    /// Hardware channel this instance captures on.
    fn channel(&self) -> u32;

    /// Bring the capture unit up. Returns
    /// [`InitStatus::AlreadyInitialized`] on a repeated call.
    fn init(&self) -> HalResult<InitStatus>;

    /// Disable capture, drop the callback and mark the instance
    /// uninitialised. Valid from every state.
    fn deinit(&self) -> HalResult<()>;

    /// Register (or with `None`, remove) the capture callback.
    fn set_callback(&self, callback: Option<CaptureCallback>, data: UserData) -> HalResult<()>;

    /// Set the sampling period and start sampling.
    fn set_period(&self, us: u64) -> HalResult<()>;

    /// Capture counter value.
    fn get_time(&self) -> HalResult<u64>;

    /// Timestamp of the most recent captured edge, `0` before the first.
    fn get_channel_time(&self) -> HalResult<u64>;

    /// `true` while sampling, `None` while uninitialised.
    fn is_sampling(&self) -> Option<bool>;
}

cfg_if::cfg_if! {
    if #[cfg(feature = "capture-multi")] {
        /// Capture instance type targeted by the class API.
        pub type Capture = dyn CaptureOps;
    } else if #[cfg(all(feature = "capture-soft", not(feature = "capture-bcm2835")))] {
        /// Capture instance type targeted by the class API.
        pub type Capture = crate::peripheral::soft_capture::SoftCapture;
    } else if #[cfg(all(feature = "capture-bcm2835", not(feature = "capture-soft")))] {
        /// Capture instance type targeted by the class API.
        pub type Capture = crate::platform::bcm2835::capture::Bcm2835Capture;
    } else {
        compile_error!(
            "Direct capture dispatch needs exactly one capture driver.\n\
            Enable one of: capture-soft, capture-bcm2835\n\
            Or enable capture-multi"
        );
    }
}

// ============================================================================
// Class API
// ============================================================================

/// Look up capture `index` on the current platform and initialise it.
pub fn init(index: u32) -> HalResult<Acquired<&'static Capture>> {
    init_from(CurrentPlatform::captures(), index)
}

/// [`init`] against an explicit registry.
pub fn init_from<C: CaptureOps + ?Sized>(
    registry: &DeviceRegistry<C>,
    index: u32,
) -> HalResult<Acquired<&'static C>> {
    let capture = registry.get(index)?;
    let status = capture.init()?;
    Ok(Acquired {
        instance: capture,
        status,
    })
}

#[inline]
pub fn deinit(capture: &Capture) -> HalResult<()> {
    capture.deinit()
}

#[inline]
pub fn set_callback(
    capture: &Capture,
    callback: Option<CaptureCallback>,
    data: UserData,
) -> HalResult<()> {
    capture.set_callback(callback, data)
}

#[inline]
pub fn set_period(capture: &Capture, us: u64) -> HalResult<()> {
    capture.set_period(us)
}

#[inline]
pub fn get_time(capture: &Capture) -> HalResult<u64> {
    capture.get_time()
}

#[inline]
pub fn get_channel_time(capture: &Capture) -> HalResult<u64> {
    capture.get_channel_time()
}

// ============================================================================
// Driver Helpers
// ============================================================================

/// A captured edge waiting to be delivered outside the state lock.
#[derive(Debug, Copy, Clone)]
pub struct CaptureEvent {
    pub time: u64,
    generation: u32,
    callback: Option<(CaptureCallback, UserData)>,
}

impl CaptureEvent {
    /// Invoke the registered callback, if any.
    pub fn notify(&self, capture: &'static Capture, channel: u32) -> CallbackAction {
        match self.callback {
            Some((callback, data)) => callback(capture, channel, self.time, data),
            None => CallbackAction::Continue,
        }
    }
}

/// Sampling bookkeeping shared by the capture drivers.
#[derive(Debug)]
pub struct CaptureState {
    period: u64,
    sampling: bool,
    last_event: u64,
    generation: u32,
    slot: CallbackSlot<CaptureCallback>,
}

impl CaptureState {
    pub const fn new() -> Self {
        Self {
            period: 0,
            sampling: false,
            last_event: 0,
            generation: 0,
            slot: CallbackSlot::empty(),
        }
    }

    pub fn reset(&mut self) {
        let generation = self.generation.wrapping_add(1);
        *self = Self::new();
        self.generation = generation;
    }

    pub fn is_sampling(&self) -> bool {
        self.sampling
    }

    pub fn last_event(&self) -> u64 {
        self.last_event
    }

    pub fn set_callback(&mut self, callback: Option<CaptureCallback>, data: UserData) {
        self.slot.set(callback, data);
    }

    /// Start sampling with a new period.
    pub fn begin(&mut self, us: u64) -> HalResult<()> {
        if us == 0 {
            return Err(HalError::InvalidArgument);
        }
        self.period = us;
        self.sampling = true;
        self.generation = self.generation.wrapping_add(1);
        Ok(())
    }

    pub fn halt(&mut self) {
        self.sampling = false;
        self.generation = self.generation.wrapping_add(1);
    }

    /// Counter view of an absolute time: wraps every period.
    pub fn counter(&self, now: u64) -> u64 {
        if self.period == 0 { now } else { now % self.period }
    }

    /// Latch an edge seen at `time`. Dropped unless sampling.
    ///
    /// Timestamps are clamped so they never go backwards.
    pub fn capture(&mut self, time: u64) -> Option<CaptureEvent> {
        if !self.sampling {
            return None;
        }
        let time = time.max(self.last_event);
        self.last_event = time;
        Some(CaptureEvent {
            time,
            generation: self.generation,
            callback: self.slot.get(),
        })
    }

    /// Apply the callback's verdict. Returns `true` if sampling was stopped.
    pub fn finish(&mut self, event: &CaptureEvent, action: CallbackAction) -> bool {
        if action == CallbackAction::Stop && self.sampling && event.generation == self.generation {
            self.halt();
            true
        } else {
            false
        }
    }
}

impl Default for CaptureState {
    fn default() -> Self {
        Self::new()
    }
}
