//! Software timer.
//!
//! A counter running at 1 MHz / prescaler with no hardware behind it. Time
//! only moves when the owner calls [`SoftTimer::advance`], typically from a
//! periodic tick of some other clock source, or directly from tests.

use crate::hal::callback::UserData;
use crate::hal::error::{HalError, HalResult, InitStatus};
use crate::hal::instance::{DriverHeader, GenericInit};
use crate::hal::lock::IrqLock;
use crate::hal::timer::{
    Correction, OverflowCallback, RunState, TimerMode, TimerOps, TimerState,
};

struct SoftTimerState {
    timer: TimerState,
    prescaler: u32,
    /// Microseconds since init.
    elapsed: u64,
    /// Microsecond at which the armed program expires.
    deadline: u64,
}

impl SoftTimerState {
    const fn new() -> Self {
        Self {
            timer: TimerState::new(),
            prescaler: 1,
            elapsed: 0,
            deadline: 0,
        }
    }

    /// Counter ticks for a requested interval, after drift correction.
    fn ticks_for(&self, us: u64) -> HalResult<u64> {
        if us == 0 {
            return Err(HalError::InvalidArgument);
        }
        let corrected = self.timer.correction().apply(us);
        Ok((corrected / u64::from(self.prescaler)).max(1))
    }

    fn span(&self, ticks: u64) -> u64 {
        ticks.saturating_mul(u64::from(self.prescaler))
    }
}

pub struct SoftTimer {
    header: DriverHeader,
    state: IrqLock<SoftTimerState>,
}

impl SoftTimer {
    pub const fn new(name: &'static str) -> Self {
        Self {
            header: DriverHeader::new(name),
            state: IrqLock::new(SoftTimerState::new()),
        }
    }

    /// Let `us` microseconds pass, firing every expiry that falls inside.
    ///
    /// Callbacks run with the state lock released, one expiry at a time.
    /// Returns the number of expiries delivered.
    pub fn advance(&'static self, us: u64) -> u32 {
        if !self.header.is_initialized() {
            return 0;
        }

        let end = self.state.with(|s| s.elapsed.saturating_add(us));
        let mut fired = 0;

        loop {
            let expiry = {
                let mut s = self.state.lock();
                let due = matches!(s.timer.run_state(), RunState::Running(_)) && s.deadline <= end;
                if !due {
                    s.elapsed = s.elapsed.max(end);
                    break;
                }
                s.elapsed = s.elapsed.max(s.deadline);
                let expiry = s.timer.expire();
                if let Some(program) = s.timer.program()
                    && program.mode == TimerMode::Periodic
                {
                    s.deadline = s.deadline.saturating_add(s.span(program.ticks));
                }
                expiry
            };

            if let Some(expiry) = expiry {
                let action = expiry.notify(self);
                self.state.with(|s| s.timer.finish(&expiry, action));
                fired += 1;
            }
        }

        fired
    }

    fn program(&self, mode: TimerMode, us: u64) -> HalResult<()> {
        let _guard = self.header.lock()?;
        self.header.ensure_initialized()?;

        self.state.with(|s| {
            let ticks = s.ticks_for(us)?;
            s.timer.arm(mode, ticks);
            s.deadline = s.elapsed.saturating_add(s.span(ticks));
            Ok::<_, HalError>(())
        })
        .inspect_err(|e| log::warn!("{}: {:?} {} us refused: {}", self.header.label(), mode, us, e))?;

        log::trace!("{}: {:?} every {} us", self.header.label(), mode, us);
        Ok(())
    }
}

impl TimerOps for SoftTimer {
    fn header(&self) -> &DriverHeader {
        &self.header
    }

    fn init(&self, prescaler: u32, basetime: u64, adjust: i64) -> HalResult<InitStatus> {
        if prescaler == 0 {
            return Ok(InitStatus::Inspect);
        }
        match self.header.generic_init()? {
            GenericInit::AlreadyInitialized => Ok(InitStatus::AlreadyInitialized),
            GenericInit::Fresh(guard) => {
                // A rejected correction leaves the instance down.
                let correction = match Correction::new(basetime, adjust) {
                    Ok(correction) => correction,
                    Err(e) => {
                        log::warn!(
                            "{}: bad correction {} / {:+}",
                            self.header.label(),
                            basetime,
                            adjust
                        );
                        self.header.generic_deinit(&guard);
                        return Err(e);
                    }
                };
                self.state.with(|s| {
                    s.timer.reset(correction);
                    s.prescaler = prescaler;
                    s.elapsed = 0;
                    s.deadline = 0;
                });
                log::debug!(
                    "{}: soft timer up, prescaler {}",
                    self.header.label(),
                    prescaler
                );
                Ok(InitStatus::Initialized)
            }
        }
    }

    fn deinit(&self) -> HalResult<()> {
        let guard = self.header.lock()?;
        self.state.with(|s| {
            s.timer.reset(Correction::NONE);
            s.elapsed = 0;
            s.deadline = 0;
        });
        if self.header.is_initialized() {
            self.header.generic_deinit(&guard);
            log::debug!("{}: soft timer down", self.header.label());
        }
        Ok(())
    }

    fn set_overflow_callback(
        &self,
        callback: Option<OverflowCallback>,
        data: UserData,
    ) -> HalResult<()> {
        let _guard = self.header.lock()?;
        self.header.ensure_initialized()?;
        self.state.with(|s| s.timer.set_callback(callback, data));
        Ok(())
    }

    fn start(&self) -> HalResult<()> {
        let _guard = self.header.lock()?;
        self.header.ensure_initialized()?;
        self.state.with(|s| {
            let program = s.timer.rearm()?;
            s.deadline = s.elapsed.saturating_add(s.span(program.ticks));
            Ok(())
        })
    }

    fn stop(&self) -> HalResult<()> {
        let _guard = self.header.lock()?;
        self.header.ensure_initialized()?;
        self.state.with(|s| s.timer.disarm());
        log::trace!("{}: stopped", self.header.label());
        Ok(())
    }

    fn oneshot(&self, us: u64) -> HalResult<()> {
        self.program(TimerMode::OneShot, us)
    }

    fn periodic(&self, us: u64) -> HalResult<()> {
        self.program(TimerMode::Periodic, us)
    }

    fn get_time(&self) -> HalResult<u64> {
        self.header.ensure_initialized()?;
        Ok(self
            .state
            .with(|s| s.elapsed / u64::from(s.prescaler)))
    }

    fn run_state(&self) -> Option<RunState> {
        self.header
            .is_initialized()
            .then(|| self.state.with(|s| s.timer.run_state()))
    }
}
