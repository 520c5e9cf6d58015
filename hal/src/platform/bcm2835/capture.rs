//! BCM2835 GPIO capture.
//!
//! Edges on one GPIO pin, detected by the GPIO event-detect logic and
//! timestamped with the system timer counter. The channel index of an
//! instance is its pin number.

use crate::hal::callback::UserData;
use crate::hal::capture::{CaptureCallback, CaptureOps, CaptureState};
use crate::hal::error::{HalError, HalResult, InitStatus};
use crate::hal::instance::{DriverHeader, GenericInit};
use crate::hal::lock::IrqLock;
use crate::hw::bcm2835::gpio::{self, EdgeDetect};
use crate::hw::bcm2835::timer;
use crate::hw::{GpioBlock, SysTimerBlock};

pub struct Bcm2835Capture {
    header: DriverHeader,
    gpio: &'static GpioBlock,
    systimer: &'static SysTimerBlock,
    pin: u8,
    edge: EdgeDetect,
    state: IrqLock<CaptureState>,
}

impl Bcm2835Capture {
    pub const fn new(
        name: &'static str,
        gpio: &'static GpioBlock,
        systimer: &'static SysTimerBlock,
        pin: u8,
        edge: EdgeDetect,
    ) -> Self {
        Self {
            header: DriverHeader::new(name),
            gpio,
            systimer,
            pin,
            edge,
            state: IrqLock::new(CaptureState::new()),
        }
    }

    pub fn pin(&self) -> u8 {
        self.pin
    }

    /// Interrupt entry, called for every GPIO bank interrupt.
    ///
    /// Returns `false` if this pin had no pending event.
    pub fn on_interrupt(&'static self) -> bool {
        let event = {
            let mut s = self.state.lock();
            if !gpio::event_pending(self.gpio, self.pin) {
                return false;
            }
            gpio::clear_event(self.gpio, self.pin);
            s.capture(timer::read_counter(self.systimer))
        };

        let Some(event) = event else {
            log::warn!("{}: edge while not sampling", self.header.label());
            return true;
        };

        let action = event.notify(self, u32::from(self.pin));
        self.state.with(|s| {
            if s.finish(&event, action) {
                gpio::disable_edge_detect(self.gpio, self.pin);
            }
        });
        true
    }
}

impl CaptureOps for Bcm2835Capture {
    fn header(&self) -> &DriverHeader {
        &self.header
    }

    fn channel(&self) -> u32 {
        u32::from(self.pin)
    }

    fn init(&self) -> HalResult<InitStatus> {
        if !gpio::is_valid_pin(self.pin) {
            log::warn!("{}: no such pin {}", self.header.label(), self.pin);
            return Err(HalError::InvalidArgument);
        }

        match self.header.generic_init()? {
            GenericInit::AlreadyInitialized => Ok(InitStatus::AlreadyInitialized),
            GenericInit::Fresh(_guard) => {
                self.state.with(|s| {
                    s.reset();
                    gpio::disable_edge_detect(self.gpio, self.pin);
                    gpio::clear_event(self.gpio, self.pin);
                });
                log::debug!(
                    "{}: capture up on GPIO{} ({:?})",
                    self.header.label(),
                    self.pin,
                    self.edge
                );
                Ok(InitStatus::Initialized)
            }
        }
    }

    fn deinit(&self) -> HalResult<()> {
        let guard = self.header.lock()?;
        if self.header.is_initialized() {
            self.state.with(|s| {
                s.reset();
                gpio::disable_edge_detect(self.gpio, self.pin);
                gpio::clear_event(self.gpio, self.pin);
            });
            self.header.generic_deinit(&guard);
            log::debug!("{}: capture down", self.header.label());
        }
        Ok(())
    }

    fn set_callback(&self, callback: Option<CaptureCallback>, data: UserData) -> HalResult<()> {
        let _guard = self.header.lock()?;
        self.header.ensure_initialized()?;
        self.state.with(|s| s.set_callback(callback, data));
        Ok(())
    }

    fn set_period(&self, us: u64) -> HalResult<()> {
        let _guard = self.header.lock()?;
        self.header.ensure_initialized()?;
        self.state.with(|s| {
            s.begin(us)?;
            gpio::clear_event(self.gpio, self.pin);
            gpio::enable_edge_detect(self.gpio, self.pin, self.edge);
            Ok::<_, HalError>(())
        })?;
        log::trace!("{}: sampling, period {} us", self.header.label(), us);
        Ok(())
    }

    fn get_time(&self) -> HalResult<u64> {
        self.header.ensure_initialized()?;
        let now = timer::read_counter(self.systimer);
        Ok(self.state.with(|s| s.counter(now)))
    }

    fn get_channel_time(&self) -> HalResult<u64> {
        self.header.ensure_initialized()?;
        Ok(self.state.with(|s| s.last_event()))
    }

    fn is_sampling(&self) -> Option<bool> {
        self.header
            .is_initialized()
            .then(|| self.state.with(|s| s.is_sampling()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::callback::CallbackAction;
    use crate::hal::capture::Capture;
    use crate::hw::emulated::{EmulatedGpio, EmulatedSysTimer};
    use core::sync::atomic::{AtomicU32, Ordering};

    fn count(_capture: &'static Capture, channel: u32, _time: u64, data: UserData) -> CallbackAction {
        if let Some(hits) = data.and_then(|d| d.downcast_ref::<AtomicU32>()) {
            hits.fetch_add(1, Ordering::SeqCst);
        }
        CallbackAction::from(channel == 17)
    }

    fn edge(io: &EmulatedGpio, cap: &'static Bcm2835Capture, high: bool) -> bool {
        io.drive(cap.pin(), high) && cap.on_interrupt()
    }

    #[test]
    fn rising_edges_are_timestamped() {
        static IO: EmulatedGpio = EmulatedGpio::new();
        static ST: EmulatedSysTimer = EmulatedSysTimer::new();
        static CAP: Bcm2835Capture =
            Bcm2835Capture::new("gpio17", &IO, &ST, 17, EdgeDetect::Rising);
        static HITS: AtomicU32 = AtomicU32::new(0);

        assert_eq!(CAP.init(), Ok(InitStatus::Initialized));
        CAP.set_callback(Some(count), Some(&HITS)).unwrap();

        // Edge detect is off until a period is set.
        ST.advance(10);
        assert!(!edge(&IO, &CAP, true));
        assert!(!edge(&IO, &CAP, false));

        CAP.set_period(1_000).unwrap();
        ST.advance(2_490);
        assert!(edge(&IO, &CAP, true));
        assert!(!edge(&IO, &CAP, false));
        assert_eq!(HITS.load(Ordering::SeqCst), 1);
        assert_eq!(CAP.get_channel_time(), Ok(2_500));
        assert_eq!(CAP.get_time(), Ok(500));
    }

    #[test]
    fn stop_verdict_disables_edge_detect() {
        static IO: EmulatedGpio = EmulatedGpio::new();
        static ST: EmulatedSysTimer = EmulatedSysTimer::new();
        static CAP: Bcm2835Capture = Bcm2835Capture::new("gpio4", &IO, &ST, 4, EdgeDetect::Both);
        static HITS: AtomicU32 = AtomicU32::new(0);

        CAP.init().unwrap();
        CAP.set_callback(Some(count), Some(&HITS)).unwrap();
        CAP.set_period(100).unwrap();

        // `count` stops every channel except 17.
        assert!(edge(&IO, &CAP, true));
        assert_eq!(CAP.is_sampling(), Some(false));
        assert!(!edge(&IO, &CAP, false));
        assert_eq!(HITS.load(Ordering::SeqCst), 1);

        CAP.set_period(100).unwrap();
        assert!(edge(&IO, &CAP, true));
        assert_eq!(HITS.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn invalid_pin_and_lifecycle() {
        static IO: EmulatedGpio = EmulatedGpio::new();
        static ST: EmulatedSysTimer = EmulatedSysTimer::new();
        static BAD: Bcm2835Capture = Bcm2835Capture::new("gpio99", &IO, &ST, 99, EdgeDetect::Rising);
        static CAP: Bcm2835Capture = Bcm2835Capture::new("gpio5", &IO, &ST, 5, EdgeDetect::Rising);

        assert_eq!(BAD.init(), Err(HalError::InvalidArgument));
        assert_eq!(BAD.is_sampling(), None);

        CAP.init().unwrap();
        CAP.set_period(50).unwrap();
        CAP.deinit().unwrap();
        assert!(!IO.drive(5, true));
        assert_eq!(CAP.get_channel_time(), Err(HalError::InvalidState));
    }
}
