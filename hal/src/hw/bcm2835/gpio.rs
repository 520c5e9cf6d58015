//! BCM2835 GPIO event-detect registers.
//!
//! Only the registers used for edge capture are mapped here. Each bank
//! register covers 32 pins; pins 0-31 live in bank 0.

use crate::hw::Registers;

/// Base physical address of the GPIO controller.
pub const GPIO_BASE: usize = 0x2020_0000;

pub const GPLEV0: usize = 0x34;
pub const GPEDS0: usize = 0x40;
pub const GPREN0: usize = 0x4C;
pub const GPFEN0: usize = 0x58;

/// Highest pin number on the controller.
pub const MAX_PIN: u8 = 53;

/// Edge selection for event detection.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EdgeDetect {
    /// Detect rising edge (low-to-high transition).
    Rising,
    /// Detect falling edge (high-to-low transition).
    Falling,
    /// Detect both rising and falling edges.
    Both,
}

impl EdgeDetect {
    const fn rising(self) -> bool {
        matches!(self, EdgeDetect::Rising | EdgeDetect::Both)
    }

    const fn falling(self) -> bool {
        matches!(self, EdgeDetect::Falling | EdgeDetect::Both)
    }
}

pub const fn is_valid_pin(pin: u8) -> bool {
    pin <= MAX_PIN
}

fn bank_and_bit(pin: u8) -> (usize, u32) {
    let bank = 4 * (pin / 32) as usize;
    let bit = 1u32 << (pin % 32);
    (bank, bit)
}

/// Current input level of a pin.
pub fn level(regs: &impl Registers, pin: u8) -> bool {
    let (bank, bit) = bank_and_bit(pin);
    regs.read(GPLEV0 + bank) & bit != 0
}

/// Check if an event is pending.
pub fn event_pending(regs: &impl Registers, pin: u8) -> bool {
    let (bank, bit) = bank_and_bit(pin);
    regs.read(GPEDS0 + bank) & bit != 0
}

/// Clear a pending event.
pub fn clear_event(regs: &impl Registers, pin: u8) {
    let (bank, bit) = bank_and_bit(pin);
    regs.write(GPEDS0 + bank, bit);
}

/// Enable edge detection for the selected edges.
pub fn enable_edge_detect(regs: &impl Registers, pin: u8, edge: EdgeDetect) {
    let (bank, bit) = bank_and_bit(pin);
    if edge.rising() {
        regs.modify(GPREN0 + bank, |v| v | bit);
    }
    if edge.falling() {
        regs.modify(GPFEN0 + bank, |v| v | bit);
    }
}

/// Disable rising and falling edge detection.
pub fn disable_edge_detect(regs: &impl Registers, pin: u8) {
    let (bank, bit) = bank_and_bit(pin);
    regs.modify(GPREN0 + bank, |v| v & !bit);
    regs.modify(GPFEN0 + bank, |v| v & !bit);
}
