//! RAM models of the BCM2835 register blocks for hosted builds.
//!
//! The models implement the same register semantics the drivers rely on
//! (write-1-to-clear status bits, compare matching, edge latching) so the
//! BCM2835 drivers run unchanged on a development machine. Time only moves
//! when the owner calls [`EmulatedSysTimer::run`].

use core::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use spin::Mutex;

use crate::hw::Registers;
use crate::hw::bcm2835::gpio::{GPEDS0, GPFEN0, GPLEV0, GPREN0, MAX_PIN};
use crate::hw::bcm2835::timer::{C0, CHI, CLO, CS, Channel};

/// System timer model: 64-bit µs counter, four compare channels.
pub struct EmulatedSysTimer {
    cs: AtomicU32,
    counter: AtomicU64,
    compare: [AtomicU32; 4],
    stepping: Mutex<()>,
}

impl EmulatedSysTimer {
    pub const fn new() -> Self {
        Self::starting_at(0)
    }

    /// A model whose counter starts at `us`.
    pub const fn starting_at(us: u64) -> Self {
        Self {
            cs: AtomicU32::new(0),
            counter: AtomicU64::new(us),
            compare: [
                AtomicU32::new(0),
                AtomicU32::new(0),
                AtomicU32::new(0),
                AtomicU32::new(0),
            ],
            stepping: Mutex::new(()),
        }
    }

    pub fn now(&self) -> u64 {
        self.counter.load(Ordering::Acquire)
    }

    /// Let `us` microseconds pass.
    ///
    /// Time stops at every compare match; the matching channels' CS bits
    /// are set and `service` is called with the bits that just matched,
    /// the way the interrupt controller would enter the ISR. Compare
    /// values written by `service` are honoured within the same run.
    pub fn run(&self, us: u64, mut service: impl FnMut(u32)) {
        let _stepping = self.stepping.lock();
        let mut now = self.now();
        let end = now.saturating_add(us);

        while now < end {
            let low = now as u32;
            // Ticks until each channel's compare equals CLO again. A compare
            // equal to CLO right now has already matched and is a full wrap
            // away.
            let next = Channel::ALL
                .iter()
                .map(|ch| {
                    let delta = self.compare[ch.index() as usize]
                        .load(Ordering::Acquire)
                        .wrapping_sub(low);
                    if delta == 0 { 1u64 << 32 } else { u64::from(delta) }
                })
                .min()
                .unwrap_or(u64::MAX);

            if next > end - now {
                now = end;
                self.counter.store(now, Ordering::Release);
                break;
            }

            now += next;
            self.counter.store(now, Ordering::Release);

            let matched = Channel::ALL
                .iter()
                .filter(|ch| {
                    self.compare[ch.index() as usize].load(Ordering::Acquire) == now as u32
                })
                .fold(0, |bits, ch| bits | ch.bitmask());
            self.cs.fetch_or(matched, Ordering::AcqRel);
            service(matched);
        }
    }

    /// Let time pass without servicing matches.
    pub fn advance(&self, us: u64) {
        self.run(us, |_| {});
    }
}

impl Default for EmulatedSysTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl Registers for EmulatedSysTimer {
    fn read(&self, offset: usize) -> u32 {
        match offset {
            CS => self.cs.load(Ordering::Acquire),
            CLO => self.now() as u32,
            CHI => (self.now() >> 32) as u32,
            o if (C0..C0 + 16).contains(&o) => {
                self.compare[(o - C0) / 4].load(Ordering::Acquire)
            }
            _ => 0,
        }
    }

    fn write(&self, offset: usize, value: u32) {
        match offset {
            CS => {
                self.cs.fetch_and(!value, Ordering::AcqRel);
            }
            o if (C0..C0 + 16).contains(&o) => {
                self.compare[(o - C0) / 4].store(value, Ordering::Release);
            }
            // CLO/CHI are read-only.
            _ => {}
        }
    }
}

const GPIO_BANKS: usize = 2;

/// GPIO model covering level, event status and edge enables.
pub struct EmulatedGpio {
    lev: [AtomicU32; GPIO_BANKS],
    eds: [AtomicU32; GPIO_BANKS],
    ren: [AtomicU32; GPIO_BANKS],
    fen: [AtomicU32; GPIO_BANKS],
}

impl EmulatedGpio {
    pub const fn new() -> Self {
        Self {
            lev: [AtomicU32::new(0), AtomicU32::new(0)],
            eds: [AtomicU32::new(0), AtomicU32::new(0)],
            ren: [AtomicU32::new(0), AtomicU32::new(0)],
            fen: [AtomicU32::new(0), AtomicU32::new(0)],
        }
    }

    /// Drive the input level of `pin`.
    ///
    /// Returns `true` if the transition latched an event, i.e. the GPIO
    /// interrupt line would assert.
    pub fn drive(&self, pin: u8, high: bool) -> bool {
        if pin > MAX_PIN {
            return false;
        }
        let bank = (pin / 32) as usize;
        let bit = 1u32 << (pin % 32);

        let was_high = if high {
            self.lev[bank].fetch_or(bit, Ordering::AcqRel) & bit != 0
        } else {
            self.lev[bank].fetch_and(!bit, Ordering::AcqRel) & bit != 0
        };

        let detect = match (was_high, high) {
            (false, true) => &self.ren[bank],
            (true, false) => &self.fen[bank],
            _ => return false,
        };
        if detect.load(Ordering::Acquire) & bit == 0 {
            return false;
        }
        self.eds[bank].fetch_or(bit, Ordering::AcqRel);
        true
    }

    /// Drive a full pulse (low, high, low). Returns the number of events
    /// latched.
    pub fn pulse(&self, pin: u8) -> u32 {
        let mut events = 0;
        for level in [false, true, false] {
            events += u32::from(self.drive(pin, level));
        }
        events
    }
}

impl Default for EmulatedGpio {
    fn default() -> Self {
        Self::new()
    }
}

fn bank_register(offset: usize, base: usize) -> Option<usize> {
    let rel = offset.checked_sub(base)?;
    (rel % 4 == 0 && rel / 4 < GPIO_BANKS).then_some(rel / 4)
}

impl Registers for EmulatedGpio {
    fn read(&self, offset: usize) -> u32 {
        let regs = [
            (GPLEV0, &self.lev),
            (GPEDS0, &self.eds),
            (GPREN0, &self.ren),
            (GPFEN0, &self.fen),
        ];
        regs.iter()
            .find_map(|(base, reg)| {
                bank_register(offset, *base).map(|b| reg[b].load(Ordering::Acquire))
            })
            .unwrap_or(0)
    }

    fn write(&self, offset: usize, value: u32) {
        if let Some(b) = bank_register(offset, GPEDS0) {
            self.eds[b].fetch_and(!value, Ordering::AcqRel);
        } else if let Some(b) = bank_register(offset, GPREN0) {
            self.ren[b].store(value, Ordering::Release);
        } else if let Some(b) = bank_register(offset, GPFEN0) {
            self.fen[b].store(value, Ordering::Release);
        }
    }
}
