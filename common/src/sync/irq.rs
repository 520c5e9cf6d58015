use core::fmt::Debug;

/// Architecture-specific interrupt masking interface.
///
/// Implementations must tolerate nesting: `restore` puts back exactly the
/// state returned by the matching `disable`.
pub trait IrqControl {
    /// Saved interrupt state.
    type State: Copy + Debug;

    /// Disable interrupts and return the previous state.
    fn disable() -> Self::State;

    /// Restore interrupts to a previous state.
    fn restore(state: Self::State);
}
