//! BCM2835 (Raspberry Pi 1 / Zero) drivers.
//!
//! The drivers only touch their register blocks through
//! [`Registers`](crate::hw::Registers), so hosted builds run them against
//! the RAM models in [`hw::emulated`](crate::hw).

#[cfg(feature = "capture-bcm2835")]
pub mod capture;
#[cfg(feature = "timer-bcm2835")]
pub mod timer;

#[cfg(all(target_os = "none", feature = "bcm2835"))]
mod board;
#[cfg(all(target_os = "none", feature = "bcm2835"))]
pub use board::*;
