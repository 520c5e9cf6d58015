//! Per-instance serialisation.
//!
//! [`DriverLock`] is selected by the `thread-safe` feature: a bounded spin
//! mutex when enabled, a zero-sized no-op otherwise. Call sites are the same
//! in both configurations:
//!
//! ```ignore
//! let _guard = self.header.lock()?;
//! ```
//!
//! The guard releases the lock on every exit path. Interrupt handlers never
//! take a `DriverLock`; state they share with the API lives in an
//! [`IrqLock`] instead.

use crate::hal::error::HalResult;
use common::arch::CurrentIrq;
use common::sync::IrqSpinLock;

/// Interrupt-safe lock for state shared between API calls and the ISR.
pub type IrqLock<T> = IrqSpinLock<T, CurrentIrq>;

/// Attempts made before lock acquisition reports
/// [`HalError::ResourceError`](crate::hal::error::HalError::ResourceError).
pub const LOCK_SPIN_LIMIT: u32 = 1 << 16;

cfg_if::cfg_if! {
    if #[cfg(feature = "thread-safe")] {
        use crate::hal::error::HalError;
        use spin::mutex::{SpinMutex, SpinMutexGuard};

        /// Serialisation primitive of one driver instance.
        pub struct DriverLock {
            inner: SpinMutex<()>,
        }

        /// Proof that the instance lock is held.
        pub struct DriverLockGuard<'a> {
            _inner: SpinMutexGuard<'a, ()>,
        }

        impl DriverLock {
            pub const fn new() -> Self {
                Self {
                    inner: SpinMutex::new(()),
                }
            }

            /// Acquire the lock, giving up after [`LOCK_SPIN_LIMIT`] attempts.
            pub fn acquire(&self) -> HalResult<DriverLockGuard<'_>> {
                for _ in 0..LOCK_SPIN_LIMIT {
                    if let Some(guard) = self.inner.try_lock() {
                        return Ok(DriverLockGuard { _inner: guard });
                    }
                    core::hint::spin_loop();
                }
                Err(HalError::ResourceError)
            }

            pub fn is_locked(&self) -> bool {
                self.inner.is_locked()
            }
        }
    } else {
        use core::marker::PhantomData;

        /// Serialisation primitive of one driver instance (disabled).
        pub struct DriverLock;

        /// Zero-sized stand-in for a held lock.
        pub struct DriverLockGuard<'a> {
            _lock: PhantomData<&'a DriverLock>,
        }

        impl DriverLock {
            pub const fn new() -> Self {
                Self
            }

            #[inline(always)]
            pub fn acquire(&self) -> HalResult<DriverLockGuard<'_>> {
                Ok(DriverLockGuard { _lock: PhantomData })
            }

            #[inline(always)]
            pub fn is_locked(&self) -> bool {
                false
            }
        }
    }
}

impl Default for DriverLock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(all(test, feature = "thread-safe"))]
mod tests {
    use super::*;

    #[test]
    fn contended_lock_reports_resource_error() {
        let lock = DriverLock::new();
        let held = lock.acquire().unwrap();
        assert!(lock.is_locked());
        assert!(matches!(lock.acquire(), Err(HalError::ResourceError)));
        drop(held);
        assert!(!lock.is_locked());
        assert!(lock.acquire().is_ok());
    }
}
