use crate::sync::irq::IrqControl;

const CPSR_I_BIT: u32 = 1 << 7;

/// IRQ masking through the CPSR I bit.
///
/// `disable` reports whether IRQs were enabled before the call so that
/// nested critical sections only re-enable interrupts at the outermost
/// level.
#[derive(Debug, Clone, Copy)]
pub struct ArmIrq;

impl IrqControl for ArmIrq {
    type State = bool;

    #[inline(always)]
    fn disable() -> bool {
        let cpsr: u32;
        unsafe {
            core::arch::asm!(
                "mrs {0}, cpsr",
                "cpsid i",
                out(reg) cpsr,
                options(nomem, nostack)
            );
        }
        cpsr & CPSR_I_BIT == 0
    }

    #[inline(always)]
    fn restore(prev_enabled: bool) {
        if prev_enabled {
            unsafe {
                core::arch::asm!("cpsie i", options(nomem, nostack));
            }
        }
    }
}
