//! Timer and Capture HAL
//!
//! A layered, allocation-free hardware abstraction for two peripheral
//! classes, timers and input capture.
//!
//! # Module Organization
//!
//! - [`hal`]: class contracts, dispatch, registries and shared machinery
//! - [`hw`]: raw register maps and accessors
//! - [`peripheral`]: drivers not tied to a SoC
//! - [`platform`]: SoC drivers and the per-machine instance registries
//!
//! # Dispatch
//!
//! Each class resolves an index through its registry and then calls the
//! instance either through its operation table (`timer-multi`,
//! `capture-multi`) or directly, when a single implementation is built.
//! Callers see the same API either way.
//!
//! # Usage Example
//!
//! ```ignore
//! use timer_capture_hal::hal::callback::{CallbackAction, UserData};
//! use timer_capture_hal::hal::timer::{self, Timer};
//!
//! fn tick(_timer: &'static Timer, _data: UserData) -> CallbackAction {
//!     CallbackAction::Continue
//! }
//!
//! let tmr = timer::init(0, 1, 0, 0)?.instance;
//! timer::set_overflow_callback(tmr, Some(tick), None)?;
//! timer::periodic(tmr, 1_000)?;
//! ```

#![cfg_attr(not(test), no_std)]

pub mod hal;
pub mod hw;
pub mod peripheral;
pub mod platform;

// Re-export commonly used types
pub use hal::callback::{CallbackAction, UserData};
pub use hal::capture::{Capture, CaptureOps};
pub use hal::error::{Acquired, HalError, HalResult, InitStatus};
pub use hal::timer::{Timer, TimerOps};
pub use platform::{CurrentPlatform, Platform};
