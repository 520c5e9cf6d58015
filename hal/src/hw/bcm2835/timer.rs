//! BCM2835 System Timer registers.
//!
//! A 64-bit free-running counter at 1 MHz (CLO/CHI) with four 32-bit
//! compare channels. A channel matches when CLO equals its compare value,
//! which sets the channel's bit in CS (write 1 to clear).

use crate::hw::Registers;

/// System timer base address.
pub const TIMER_BASE: usize = 0x2000_3000;

pub const CS: usize = 0x00;
pub const CLO: usize = 0x04;
pub const CHI: usize = 0x08;
pub const C0: usize = 0x0C;

/// System timer compare channels.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(usize)]
pub enum Channel {
    Channel0 = 0,
    Channel1 = 1,
    Channel2 = 2,
    Channel3 = 3,
}

impl Channel {
    pub const ALL: [Channel; 4] = [
        Channel::Channel0,
        Channel::Channel1,
        Channel::Channel2,
        Channel::Channel3,
    ];

    /// Get the IRQ number for this channel.
    pub const fn irq_number(self) -> u32 {
        self as u32
    }

    pub const fn bitmask(self) -> u32 {
        1 << (self as u32)
    }

    pub const fn compare_offset(self) -> usize {
        C0 + 4 * (self as usize)
    }

    pub const fn index(self) -> u32 {
        self as u32
    }
}

/// Read the 64-bit free-running counter.
pub fn read_counter(regs: &impl Registers) -> u64 {
    // Read high word first; re-read low word if it rolled over meanwhile.
    let hi1 = regs.read(CHI);
    let lo = regs.read(CLO);
    let hi2 = regs.read(CHI);

    let (hi, lo) = if hi1 != hi2 {
        (hi2, regs.read(CLO))
    } else {
        (hi1, lo)
    };

    (u64::from(hi) << 32) | u64::from(lo)
}

/// Clear any pending match and fire `ticks` counter ticks from now.
///
/// Returns the compare value written.
pub fn arm(regs: &impl Registers, channel: Channel, ticks: u32) -> u32 {
    let compare = regs.read(CLO).wrapping_add(ticks);
    regs.write(CS, channel.bitmask());
    regs.write(channel.compare_offset(), compare);
    compare
}

pub fn set_compare(regs: &impl Registers, channel: Channel, compare: u32) {
    regs.write(channel.compare_offset(), compare);
}

/// Clear a pending match.
pub fn clear_interrupt(regs: &impl Registers, channel: Channel) {
    regs.write(CS, channel.bitmask());
}

/// Check if a match is pending.
pub fn is_pending(regs: &impl Registers, channel: Channel) -> bool {
    regs.read(CS) & channel.bitmask() != 0
}
