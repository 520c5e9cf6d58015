//! Platform Abstraction Layer
//!
//! A platform owns the driver instances of one machine and publishes them
//! through one [`DeviceRegistry`] per peripheral class. The class APIs in
//! [`hal`](crate::hal) resolve indices against [`CurrentPlatform`].
//!
//! # Usage
//!
//! ```ignore
//! use timer_capture_hal::platform::{CurrentPlatform, Platform};
//!
//! // IRQ dispatch from the exception vector.
//! if !CurrentPlatform::handle_irq(irq) {
//!     log::warn!("unhandled irq {}", irq);
//! }
//! ```

use crate::hal::capture::Capture;
use crate::hal::registry::DeviceRegistry;
use crate::hal::timer::Timer;

/// Platform trait - implemented by each supported platform
pub trait Platform {
    /// Platform name for debugging
    fn name() -> &'static str;

    /// Timer instances, in index order.
    fn timers() -> &'static DeviceRegistry<Timer>;

    /// Capture instances, in index order.
    fn captures() -> &'static DeviceRegistry<Capture>;

    /// Route an interrupt to the instance that owns it.
    ///
    /// Returns `false` if no instance claimed the IRQ.
    fn handle_irq(irq: u32) -> bool;
}

pub mod bcm2835;

// Platform selection
cfg_if::cfg_if! {
    if #[cfg(all(target_os = "none", feature = "bcm2835"))] {
        pub use bcm2835::Bcm2835Platform as CurrentPlatform;
    } else if #[cfg(target_os = "none")] {
        compile_error!(
            "No platform selected!\n\
            Use: cargo build --features bcm2835"
        );
    } else {
        pub mod hosted;
        pub use hosted::HostedPlatform as CurrentPlatform;
    }
}
