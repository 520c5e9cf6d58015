//! Shared low-level primitives for the driver stack.
//!
//! - [`sync`]: interrupt-aware locking used by drivers to share state with
//!   their interrupt handlers
//! - [`arch`]: per-architecture interrupt masking

#![cfg_attr(not(test), no_std)]

pub mod arch;
pub mod sync;
