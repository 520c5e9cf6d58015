//! Raspberry Pi 1 / Zero board: the instances wired on real hardware.

use crate::hal::capture::Capture;
use crate::hal::registry::DeviceRegistry;
use crate::hal::timer::Timer;
use crate::hw::bcm2835::{gpio, timer};
use crate::hw::{GpioBlock, Mmio, SysTimerBlock};
use crate::platform::Platform;

#[cfg(feature = "capture-bcm2835")]
use super::capture::Bcm2835Capture;
#[cfg(feature = "timer-bcm2835")]
use super::timer::Bcm2835Timer;
#[cfg(feature = "capture-bcm2835")]
use crate::hw::bcm2835::IRQ_GPIO_0;
#[cfg(feature = "timer-bcm2835")]
use crate::hw::bcm2835::{IRQ_SYSTEM_TIMER_1, IRQ_SYSTEM_TIMER_3};

pub struct Bcm2835Platform;

// SAFETY: fixed peripheral addresses of the BCM2835, identity mapped.
#[cfg(any(feature = "timer-bcm2835", feature = "capture-bcm2835"))]
static SYSTIMER: SysTimerBlock = unsafe { Mmio::new(timer::TIMER_BASE) };
#[cfg(feature = "capture-bcm2835")]
static GPIO: GpioBlock = unsafe { Mmio::new(gpio::GPIO_BASE) };

#[cfg(feature = "timer-bcm2835")]
pub static SYSTEM_TIMER_1: Bcm2835Timer =
    Bcm2835Timer::new("systimer1", &SYSTIMER, timer::Channel::Channel1);
#[cfg(feature = "timer-bcm2835")]
pub static SYSTEM_TIMER_3: Bcm2835Timer =
    Bcm2835Timer::new("systimer3", &SYSTIMER, timer::Channel::Channel3);

#[cfg(feature = "capture-bcm2835")]
pub static GPIO_CAPTURE_17: Bcm2835Capture =
    Bcm2835Capture::new("gpio17", &GPIO, &SYSTIMER, 17, gpio::EdgeDetect::Rising);

static TIMERS: DeviceRegistry<Timer> = DeviceRegistry::new(&[
    #[cfg(feature = "timer-bcm2835")]
    &SYSTEM_TIMER_1,
    #[cfg(feature = "timer-bcm2835")]
    &SYSTEM_TIMER_3,
]);

static CAPTURES: DeviceRegistry<Capture> = DeviceRegistry::new(&[
    #[cfg(feature = "capture-bcm2835")]
    &GPIO_CAPTURE_17,
]);

impl Platform for Bcm2835Platform {
    fn name() -> &'static str {
        "BCM2835 (Raspberry Pi 1/Zero)"
    }

    fn timers() -> &'static DeviceRegistry<Timer> {
        &TIMERS
    }

    fn captures() -> &'static DeviceRegistry<Capture> {
        &CAPTURES
    }

    fn handle_irq(irq: u32) -> bool {
        match irq {
            #[cfg(feature = "timer-bcm2835")]
            IRQ_SYSTEM_TIMER_1 => SYSTEM_TIMER_1.on_interrupt(),
            #[cfg(feature = "timer-bcm2835")]
            IRQ_SYSTEM_TIMER_3 => SYSTEM_TIMER_3.on_interrupt(),
            #[cfg(feature = "capture-bcm2835")]
            IRQ_GPIO_0 => GPIO_CAPTURE_17.on_interrupt(),
            _ => false,
        }
    }
}
