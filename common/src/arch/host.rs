//! Interrupt control for hosted builds.
//!
//! There are no hardware interrupts when running under an operating system:
//! "interrupt handlers" are plain function calls made by test or simulation
//! code, so masking is a no-op and mutual exclusion comes from the spinning
//! in [`IrqSpinLock`](crate::sync::IrqSpinLock) alone.

use crate::sync::irq::IrqControl;

/// No-op interrupt control.
#[derive(Debug, Clone, Copy)]
pub struct HostIrq;

impl IrqControl for HostIrq {
    type State = ();

    #[inline(always)]
    fn disable() {}

    #[inline(always)]
    fn restore(_state: ()) {}
}
