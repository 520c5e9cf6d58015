//! Hosted platform.
//!
//! Runs the whole HAL on a development machine. The registry holds the
//! software drivers plus BCM2835 drivers wired to RAM models of the system
//! timer and GPIO blocks. Simulated time moves with
//! [`HostedPlatform::advance`]; interrupts are delivered synchronously
//! through [`Platform::handle_irq`].
//!
//! Timer indices: soft timers 0-2, then system timer channels 1 and 3.
//! Capture indices: soft channels 0-1, then GPIO17.

use crate::hal::capture::Capture;
use crate::hal::registry::DeviceRegistry;
use crate::hal::timer::Timer;
use crate::hw::bcm2835::timer::Channel;
use crate::hw::emulated::{EmulatedGpio, EmulatedSysTimer};
use crate::platform::Platform;

#[cfg(feature = "capture-bcm2835")]
use crate::hw::bcm2835::{IRQ_GPIO_0, gpio::EdgeDetect};
#[cfg(feature = "timer-bcm2835")]
use crate::hw::bcm2835::{IRQ_SYSTEM_TIMER_1, IRQ_SYSTEM_TIMER_3};
#[cfg(feature = "capture-soft")]
use crate::peripheral::soft_capture::SoftCapture;
#[cfg(feature = "timer-soft")]
use crate::peripheral::soft_timer::SoftTimer;
#[cfg(feature = "capture-bcm2835")]
use crate::platform::bcm2835::capture::Bcm2835Capture;
#[cfg(feature = "timer-bcm2835")]
use crate::platform::bcm2835::timer::Bcm2835Timer;

pub struct HostedPlatform;

pub static SYSTIMER: EmulatedSysTimer = EmulatedSysTimer::new();
pub static GPIO: EmulatedGpio = EmulatedGpio::new();

#[cfg(feature = "timer-soft")]
pub static SOFT_TIMER_0: SoftTimer = SoftTimer::new("soft0");
#[cfg(feature = "timer-soft")]
pub static SOFT_TIMER_1: SoftTimer = SoftTimer::new("soft1");
#[cfg(feature = "timer-soft")]
pub static SOFT_TIMER_2: SoftTimer = SoftTimer::new("soft2");

#[cfg(feature = "timer-bcm2835")]
pub static SYSTEM_TIMER_1: Bcm2835Timer =
    Bcm2835Timer::new("systimer1", &SYSTIMER, Channel::Channel1);
#[cfg(feature = "timer-bcm2835")]
pub static SYSTEM_TIMER_3: Bcm2835Timer =
    Bcm2835Timer::new("systimer3", &SYSTIMER, Channel::Channel3);

#[cfg(feature = "capture-soft")]
pub static SOFT_CAPTURE_0: SoftCapture = SoftCapture::new("softcap0", 0);
#[cfg(feature = "capture-soft")]
pub static SOFT_CAPTURE_1: SoftCapture = SoftCapture::new("softcap1", 1);

#[cfg(feature = "capture-bcm2835")]
pub static GPIO_CAPTURE_17: Bcm2835Capture =
    Bcm2835Capture::new("gpio17", &GPIO, &SYSTIMER, 17, EdgeDetect::Rising);

static TIMERS: DeviceRegistry<Timer> = DeviceRegistry::new(&[
    #[cfg(feature = "timer-soft")]
    &SOFT_TIMER_0,
    #[cfg(feature = "timer-soft")]
    &SOFT_TIMER_1,
    #[cfg(feature = "timer-soft")]
    &SOFT_TIMER_2,
    #[cfg(feature = "timer-bcm2835")]
    &SYSTEM_TIMER_1,
    #[cfg(feature = "timer-bcm2835")]
    &SYSTEM_TIMER_3,
]);

static CAPTURES: DeviceRegistry<Capture> = DeviceRegistry::new(&[
    #[cfg(feature = "capture-soft")]
    &SOFT_CAPTURE_0,
    #[cfg(feature = "capture-soft")]
    &SOFT_CAPTURE_1,
    #[cfg(feature = "capture-bcm2835")]
    &GPIO_CAPTURE_17,
]);

impl HostedPlatform {
    /// Let `us` microseconds pass on every simulated clock.
    ///
    /// The system timer runs first, delivering its compare matches through
    /// [`handle_irq`](Platform::handle_irq), then the software clocks.
    pub fn advance(us: u64) {
        SYSTIMER.run(us, |matched| {
            for channel in Channel::ALL {
                if matched & channel.bitmask() != 0 {
                    Self::handle_irq(channel.irq_number());
                }
            }
        });

        #[cfg(feature = "timer-soft")]
        for timer in [&SOFT_TIMER_0, &SOFT_TIMER_1, &SOFT_TIMER_2] {
            timer.advance(us);
        }

        #[cfg(feature = "capture-soft")]
        for capture in [&SOFT_CAPTURE_0, &SOFT_CAPTURE_1] {
            capture.advance(us);
        }
    }

    /// Drive a GPIO input. Returns `true` if the transition raised an
    /// event that a capture instance consumed.
    pub fn drive_gpio(pin: u8, high: bool) -> bool {
        GPIO.drive(pin, high) && pin < 32 && Self::handle_irq(crate::hw::bcm2835::IRQ_GPIO_0)
    }
}

impl Platform for HostedPlatform {
    fn name() -> &'static str {
        "hosted (emulated BCM2835)"
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::timer::TimerOps;

    #[test]
    fn registries_follow_enabled_drivers() {
        let timers = 3 * usize::from(cfg!(feature = "timer-soft"))
            + 2 * usize::from(cfg!(feature = "timer-bcm2835"));
        let captures = 2 * usize::from(cfg!(feature = "capture-soft"))
            + usize::from(cfg!(feature = "capture-bcm2835"));
        assert_eq!(HostedPlatform::timers().len(), timers);
        assert_eq!(HostedPlatform::captures().len(), captures);
    }

    #[test]
    fn unknown_irq_is_not_handled() {
        assert!(!HostedPlatform::handle_irq(63));
    }

    #[cfg(feature = "instance-name")]
    #[test]
    fn registry_order_is_stable() {
        let names: Vec<_> = HostedPlatform::timers()
            .iter()
            .filter_map(|(_, t)| t.header().name())
            .collect();
        if cfg!(all(feature = "timer-soft", feature = "timer-bcm2835")) {
            assert_eq!(names, ["soft0", "soft1", "soft2", "systimer1", "systimer3"]);
        }
    }
}
