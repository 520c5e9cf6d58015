//! Raw register access.
//!
//! Drivers talk to register blocks through the [`Registers`] trait so the
//! same driver code runs against real MMIO on the board and against the RAM
//! models in [`emulated`] on a development host.

use core::ptr::{read_volatile, write_volatile};

pub mod bcm2835;

/// Word-addressed register block.
pub trait Registers: Sync {
    /// Read the 32-bit register at byte `offset`.
    fn read(&self, offset: usize) -> u32;

    /// Write the 32-bit register at byte `offset`.
    fn write(&self, offset: usize, value: u32);

    /// Read-modify-write.
    fn modify(&self, offset: usize, f: impl FnOnce(u32) -> u32)
    where
        Self: Sized,
    {
        let value = self.read(offset);
        self.write(offset, f(value));
    }
}

/// Memory-mapped register block at a fixed physical address.
#[derive(Debug)]
pub struct Mmio {
    base: usize,
}

impl Mmio {
    /// # Safety
    ///
    /// `base` must be the address of a mapped register block that stays
    /// mapped for the life of the program.
    pub const unsafe fn new(base: usize) -> Self {
        Self { base }
    }
}

impl Registers for Mmio {
    #[inline(always)]
    fn read(&self, offset: usize) -> u32 {
        // SAFETY: `new` requires a mapped block; offsets come from the
        // register maps in this module tree.
        unsafe { read_volatile((self.base + offset) as *const u32) }
    }

    #[inline(always)]
    fn write(&self, offset: usize, value: u32) {
        // SAFETY: see `read`.
        unsafe { write_volatile((self.base + offset) as *mut u32, value) }
    }
}

// Register block types seen by the BCM2835 drivers.
cfg_if::cfg_if! {
    if #[cfg(target_os = "none")] {
        pub type SysTimerBlock = Mmio;
        pub type GpioBlock = Mmio;
    } else {
        pub mod emulated;
        pub type SysTimerBlock = emulated::EmulatedSysTimer;
        pub type GpioBlock = emulated::EmulatedGpio;
    }
}
