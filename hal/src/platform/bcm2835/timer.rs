//! BCM2835 System Timer Driver
//!
//! One compare channel of the 64-bit, 1 MHz system timer. Channels 0 and 2
//! are used by the GPU firmware; the board registers 1 and 3.
//!
//! The counter is free running and shared by all channels, so `get_time`
//! reads the raw microsecond counter and `deinit` never stops it.

use crate::hal::callback::UserData;
use crate::hal::error::{HalError, HalResult, InitStatus};
use crate::hal::instance::{DriverHeader, GenericInit};
use crate::hal::lock::IrqLock;
use crate::hal::timer::{
    Correction, OverflowCallback, RunState, TimerMode, TimerOps, TimerState,
};
use crate::hw::SysTimerBlock;
use crate::hw::bcm2835::timer::{self, CLO, Channel};
use crate::hw::Registers;

struct SysTimerState {
    timer: TimerState,
    /// Compare value of the armed program.
    compare: u32,
}

impl SysTimerState {
    const fn new() -> Self {
        Self {
            timer: TimerState::new(),
            compare: 0,
        }
    }

    fn ticks_for(&self, us: u64) -> HalResult<u32> {
        if us == 0 {
            return Err(HalError::InvalidArgument);
        }
        let ticks = self.timer.correction().apply(us);
        u32::try_from(ticks).map_err(|_| HalError::InvalidArgument)
    }
}

pub struct Bcm2835Timer {
    header: DriverHeader,
    regs: &'static SysTimerBlock,
    channel: Channel,
    state: IrqLock<SysTimerState>,
}

impl Bcm2835Timer {
    pub const fn new(name: &'static str, regs: &'static SysTimerBlock, channel: Channel) -> Self {
        Self {
            header: DriverHeader::new(name),
            regs,
            channel,
            state: IrqLock::new(SysTimerState::new()),
        }
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    /// Interrupt entry for this channel.
    ///
    /// Returns `false` if the channel had no pending match.
    pub fn on_interrupt(&'static self) -> bool {
        let expiry = {
            let mut s = self.state.lock();
            if !timer::is_pending(self.regs, self.channel) {
                return false;
            }
            timer::clear_interrupt(self.regs, self.channel);

            let expiry = s.timer.expire();
            if let Some(program) = s.timer.program()
                && matches!(expiry, Some(e) if e.mode == TimerMode::Periodic)
            {
                // Next match relative to the last one, so periods do not
                // accumulate interrupt latency. Re-base if it is not ahead
                // of the counter any more.
                let ticks = program.ticks as u32;
                let mut next = s.compare.wrapping_add(ticks);
                let clo = self.regs.read(CLO);
                if next.wrapping_sub(clo).wrapping_sub(1) >= ticks {
                    next = clo.wrapping_add(ticks);
                }
                s.compare = next;
                timer::set_compare(self.regs, self.channel, next);
            }
            expiry
        };

        match expiry {
            Some(expiry) => {
                let action = expiry.notify(self);
                self.state.with(|s| s.timer.finish(&expiry, action));
            }
            None => log::warn!("{}: spurious match", self.header.label()),
        }
        true
    }

    fn program(&self, mode: TimerMode, us: u64) -> HalResult<()> {
        let _guard = self.header.lock()?;
        self.header.ensure_initialized()?;

        self.state
            .with(|s| {
                let ticks = s.ticks_for(us)?;
                s.timer.arm(mode, u64::from(ticks));
                s.compare = timer::arm(self.regs, self.channel, ticks);
                Ok::<_, HalError>(())
            })
            .inspect_err(|e| {
                log::warn!("{}: {:?} {} us refused: {}", self.header.label(), mode, us, e)
            })?;

        log::trace!("{}: {:?} every {} us", self.header.label(), mode, us);
        Ok(())
    }
}

impl TimerOps for Bcm2835Timer {
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
                self.state.with(|s| s.timer.reset(correction));
                timer::clear_interrupt(self.regs, self.channel);
                if prescaler != 1 {
                    log::debug!(
                        "{}: fixed 1 MHz clock, prescaler {} ignored",
                        self.header.label(),
                        prescaler
                    );
                }
                log::debug!(
                    "{}: system timer channel {} up",
                    self.header.label(),
                    self.channel.index()
                );
                Ok(InitStatus::Initialized)
            }
        }
    }

    fn deinit(&self) -> HalResult<()> {
        let guard = self.header.lock()?;
        self.state.with(|s| {
            s.timer.reset(Correction::NONE);
            s.compare = 0;
        });
        timer::clear_interrupt(self.regs, self.channel);
        if self.header.is_initialized() {
            self.header.generic_deinit(&guard);
            log::debug!("{}: system timer channel down", self.header.label());
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
            s.compare = timer::arm(self.regs, self.channel, program.ticks as u32);
            Ok(())
        })
    }

    fn stop(&self) -> HalResult<()> {
        let _guard = self.header.lock()?;
        self.header.ensure_initialized()?;
        self.state.with(|s| {
            s.timer.disarm();
            timer::clear_interrupt(self.regs, self.channel);
        });
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
        Ok(timer::read_counter(self.regs))
    }

    fn run_state(&self) -> Option<RunState> {
        self.header
            .is_initialized()
            .then(|| self.state.with(|s| s.timer.run_state()))
    }
}
