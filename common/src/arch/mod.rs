//! Architecture-specific interrupt control.
//!
//! [`CurrentIrq`] names the [`IrqControl`](crate::sync::irq::IrqControl)
//! implementation for the architecture being built.

cfg_if::cfg_if! {
    if #[cfg(target_arch = "arm")] {
        pub mod arm;
        pub use arm::irq::ArmIrq as CurrentIrq;
    } else {
        pub mod host;
        pub use host::HostIrq as CurrentIrq;
    }
}
