//! BCM2835 register maps and raw accessors.

pub mod gpio;
pub mod timer;

/// System timer compare channel 1 (channels 0 and 2 belong to the GPU).
pub const IRQ_SYSTEM_TIMER_1: u32 = 1;
/// System timer compare channel 3.
pub const IRQ_SYSTEM_TIMER_3: u32 = 3;
/// GPIO bank 0 event detect.
pub const IRQ_GPIO_0: u32 = 49;
