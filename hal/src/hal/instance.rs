//! Common header of every driver instance.
//!
//! Concrete drivers embed a [`DriverHeader`] and hand it out through
//! `TimerOps::header` / `CaptureOps::header`. The header owns the lifecycle
//! flag, the optional debug name and the instance's [`DriverLock`]; all
//! hardware state stays in the concrete driver.

use core::sync::atomic::{AtomicBool, Ordering};

use crate::hal::error::{HalError, HalResult};
use crate::hal::lock::{DriverLock, DriverLockGuard};

/// Result of [`DriverHeader::generic_init`].
pub enum GenericInit<'a> {
    /// The instance was not initialised. It is now marked initialised and
    /// the caller holds its lock while bringing the hardware up.
    Fresh(DriverLockGuard<'a>),
    /// The instance was already initialised; nothing was done.
    AlreadyInitialized,
}

pub struct DriverHeader {
    initialized: AtomicBool,
    #[cfg(feature = "instance-name")]
    name: &'static str,
    lock: DriverLock,
}

impl DriverHeader {
    /// Create a header. The name is kept only with the `instance-name`
    /// feature.
    #[allow(unused_variables)]
    pub const fn new(name: &'static str) -> Self {
        Self {
            initialized: AtomicBool::new(false),
            #[cfg(feature = "instance-name")]
            name,
            lock: DriverLock::new(),
        }
    }

    pub fn name(&self) -> Option<&'static str> {
        #[cfg(feature = "instance-name")]
        {
            Some(self.name)
        }
        #[cfg(not(feature = "instance-name"))]
        {
            None
        }
    }

    /// Name for log messages.
    pub fn label(&self) -> &'static str {
        self.name().unwrap_or("<unnamed>")
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Acquire the instance's serialisation lock.
    pub fn lock(&self) -> HalResult<DriverLockGuard<'_>> {
        self.lock.acquire()
    }

    pub fn is_locked(&self) -> bool {
        self.lock.is_locked()
    }

    /// Shared first step of every driver's `init`.
    ///
    /// Rejects a second initialisation without side effects, otherwise takes
    /// the instance lock and marks the instance initialised. If the lock
    /// cannot be taken the instance is left untouched and
    /// [`HalError::ResourceError`] is returned.
    pub fn generic_init(&self) -> HalResult<GenericInit<'_>> {
        if self.is_initialized() {
            return Ok(GenericInit::AlreadyInitialized);
        }

        let guard = self.lock.acquire().inspect_err(|_| {
            log::warn!("{}: lock busy during init", self.label());
        })?;

        // Another task may have finished init while we waited for the lock.
        if self.initialized.swap(true, Ordering::AcqRel) {
            return Ok(GenericInit::AlreadyInitialized);
        }

        log::trace!("{}: generic init", self.label());
        Ok(GenericInit::Fresh(guard))
    }

    /// Counterpart of [`generic_init`](Self::generic_init), called by
    /// `deinit` with the instance lock held.
    pub fn generic_deinit(&self, _guard: &DriverLockGuard<'_>) {
        self.initialized.store(false, Ordering::Release);
        log::trace!("{}: generic deinit", self.label());
    }

    /// Fail with [`HalError::InvalidState`] unless the instance is up.
    pub fn ensure_initialized(&self) -> HalResult<()> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(HalError::InvalidState)
        }
    }
}
