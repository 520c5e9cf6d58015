//! Peripheral Drivers
//!
//! Drivers that are not tied to a particular SoC.
//!
//! # Available Peripherals
//!
//! - [`soft_timer`]: software-clocked timer
//! - [`soft_capture`]: software capture channel

#[cfg(feature = "capture-soft")]
pub mod soft_capture;
#[cfg(feature = "timer-soft")]
pub mod soft_timer;
