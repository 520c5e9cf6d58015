//! Software capture channel.
//!
//! Edges are injected with [`SoftCapture::edge`] and stamped with the
//! channel's own microsecond clock, which moves with
//! [`SoftCapture::advance`].

use crate::hal::callback::UserData;
use crate::hal::capture::{CaptureCallback, CaptureOps, CaptureState};
use crate::hal::error::{HalResult, InitStatus};
use crate::hal::instance::{DriverHeader, GenericInit};
use crate::hal::lock::IrqLock;

struct SoftCaptureState {
    capture: CaptureState,
    now: u64,
}

impl SoftCaptureState {
    const fn new() -> Self {
        Self {
            capture: CaptureState::new(),
            now: 0,
        }
    }
}

pub struct SoftCapture {
    header: DriverHeader,
    channel: u32,
    state: IrqLock<SoftCaptureState>,
}

impl SoftCapture {
    pub const fn new(name: &'static str, channel: u32) -> Self {
        Self {
            header: DriverHeader::new(name),
            channel,
            state: IrqLock::new(SoftCaptureState::new()),
        }
    }

    /// Move the channel clock forward.
    pub fn advance(&self, us: u64) {
        self.state.with(|s| s.now = s.now.saturating_add(us));
    }

    /// Signal an edge at the current time.
    ///
    /// Returns `true` if the edge was captured, `false` if the channel was
    /// not sampling.
    pub fn edge(&'static self) -> bool {
        let Some(event) = self.state.with(|s| {
            let now = s.now;
            s.capture.capture(now)
        }) else {
            return false;
        };

        let action = event.notify(self, self.channel);
        if self.state.with(|s| s.capture.finish(&event, action)) {
            log::trace!("{}: sampling stopped by callback", self.header.label());
        }
        true
    }
}

impl CaptureOps for SoftCapture {
    fn header(&self) -> &DriverHeader {
        &self.header
    }

    fn channel(&self) -> u32 {
        self.channel
    }

    fn init(&self) -> HalResult<InitStatus> {
        match self.header.generic_init()? {
            GenericInit::AlreadyInitialized => Ok(InitStatus::AlreadyInitialized),
            GenericInit::Fresh(_guard) => {
                self.state.with(|s| {
                    s.capture.reset();
                    s.now = 0;
                });
                log::debug!(
                    "{}: soft capture up on channel {}",
                    self.header.label(),
                    self.channel
                );
                Ok(InitStatus::Initialized)
            }
        }
    }

    fn deinit(&self) -> HalResult<()> {
        let guard = self.header.lock()?;
        self.state.with(|s| s.capture.reset());
        if self.header.is_initialized() {
            self.header.generic_deinit(&guard);
            log::debug!("{}: soft capture down", self.header.label());
        }
        Ok(())
    }

    fn set_callback(&self, callback: Option<CaptureCallback>, data: UserData) -> HalResult<()> {
        let _guard = self.header.lock()?;
        self.header.ensure_initialized()?;
        self.state.with(|s| s.capture.set_callback(callback, data));
        Ok(())
    }

    fn set_period(&self, us: u64) -> HalResult<()> {
        let _guard = self.header.lock()?;
        self.header.ensure_initialized()?;
        self.state.with(|s| s.capture.begin(us))?;
        log::trace!("{}: sampling, period {} us", self.header.label(), us);
        Ok(())
    }

    fn get_time(&self) -> HalResult<u64> {
        self.header.ensure_initialized()?;
        Ok(self.state.with(|s| s.capture.counter(s.now)))
    }

    fn get_channel_time(&self) -> HalResult<u64> {
        self.header.ensure_initialized()?;
        Ok(self.state.with(|s| s.capture.last_event()))
    }

    fn is_sampling(&self) -> Option<bool> {
        self.header
            .is_initialized()
            .then(|| self.state.with(|s| s.capture.is_sampling()))
    }
}
